use crate::domain::snapshot::Driver;
use crate::matching::{match_by_key, MatchOutcome};

/// Identity key for driver names.
///
/// Lower-cases, drops punctuation, removes single-letter tokens after the
/// first (middle initials, trailing letter suffixes) and collapses whitespace,
/// so `John A. Smith` and `john smith` share a key.
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| if ch.is_alphanumeric() || ch == '-' || ch == '\'' { ch } else { ' ' })
        .collect::<String>()
        .to_lowercase();

    cleaned
        .split_whitespace()
        .enumerate()
        .filter(|(index, token)| *index == 0 || token.chars().count() > 1)
        .map(|(_, token)| token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn driver_key(driver: &Driver) -> Option<String> {
    let key = normalize_name(&driver.name);
    (!key.is_empty()).then_some(key)
}

pub fn match_drivers<'a>(baseline: &'a [Driver], renewal: &'a [Driver]) -> MatchOutcome<&'a Driver> {
    match_by_key(baseline, renewal, driver_key)
}
