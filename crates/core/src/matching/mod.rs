//! Cross-snapshot entity reconciliation.
//!
//! Every matcher returns a [`MatchOutcome`]: pairs present in both terms,
//! baseline-only records (removed) and renewal-only records (added). Records
//! without a usable identity are never dropped; they land in `removed` or
//! `added`. The only records that disappear are within-snapshot duplicates of
//! an identity already seen, where the first occurrence wins.

pub mod claims;
pub mod drivers;
pub mod vehicles;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

pub use claims::match_claims;
pub use drivers::{match_drivers, normalize_name};
pub use vehicles::{disambiguate_labels, match_vehicles, VehicleIdentity};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchOutcome<T> {
    pub matched: Vec<(T, T)>,
    pub removed: Vec<T>,
    pub added: Vec<T>,
}

impl<T> Default for MatchOutcome<T> {
    fn default() -> Self {
        Self { matched: Vec::new(), removed: Vec::new(), added: Vec::new() }
    }
}

/// Matches two lists on an optional key.
///
/// Duplicate keys inside one list keep their first occurrence. Keyless records
/// are reported as removed or added.
pub fn match_by_key<'a, T, F>(
    baseline: &'a [T],
    renewal: &'a [T],
    key: F,
) -> MatchOutcome<&'a T>
where
    F: Fn(&T) -> Option<String>,
{
    let baseline = dedupe_by_key(baseline, &key);
    let renewal = dedupe_by_key(renewal, &key);

    let mut renewal_by_key: BTreeMap<String, usize> = BTreeMap::new();
    for (index, (record_key, _)) in renewal.iter().enumerate() {
        if let Some(record_key) = record_key {
            renewal_by_key.insert(record_key.clone(), index);
        }
    }

    let mut outcome = MatchOutcome::default();
    let mut claimed = BTreeSet::new();

    for (record_key, record) in &baseline {
        let partner = record_key.as_ref().and_then(|value| renewal_by_key.get(value)).copied();
        match partner {
            Some(index) => {
                claimed.insert(index);
                outcome.matched.push((*record, renewal[index].1));
            }
            None => outcome.removed.push(*record),
        }
    }

    outcome.added = renewal
        .iter()
        .enumerate()
        .filter(|(index, _)| !claimed.contains(index))
        .map(|(_, (_, record))| *record)
        .collect();

    outcome
}

fn dedupe_by_key<'a, T, F>(records: &'a [T], key: &F) -> Vec<(Option<String>, &'a T)>
where
    F: Fn(&T) -> Option<String>,
{
    let mut seen = BTreeSet::new();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        let record_key = key(record);
        if let Some(value) = &record_key {
            if !seen.insert(value.clone()) {
                continue;
            }
        }
        kept.push((record_key, record));
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::match_by_key;

    fn key(value: &&str) -> Option<String> {
        (!value.is_empty()).then(|| value.to_lowercase())
    }

    #[test]
    fn partitions_matched_removed_and_added() {
        let baseline = ["ACC", "home", "paperless"];
        let renewal = ["acc", "autopay", "Home"];

        let outcome = match_by_key(&baseline, &renewal, key);

        assert_eq!(outcome.matched, vec![(&"ACC", &"acc"), (&"home", &"Home")]);
        assert_eq!(outcome.removed, vec![&"paperless"]);
        assert_eq!(outcome.added, vec![&"autopay"]);
    }

    #[test]
    fn duplicate_keys_keep_first_occurrence() {
        let baseline = ["acc", "ACC"];
        let renewal = ["Acc"];

        let outcome = match_by_key(&baseline, &renewal, key);

        assert_eq!(outcome.matched, vec![(&"acc", &"Acc")]);
        assert!(outcome.removed.is_empty());
        assert!(outcome.added.is_empty());
    }

    #[test]
    fn keyless_records_are_never_dropped() {
        let baseline = ["", "acc"];
        let renewal = ["", "acc"];

        let outcome = match_by_key(&baseline, &renewal, key);

        assert_eq!(outcome.matched.len(), 1);
        assert_eq!(outcome.removed, vec![&""]);
        assert_eq!(outcome.added, vec![&""]);
    }
}
