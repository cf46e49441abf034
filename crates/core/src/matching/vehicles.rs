use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::snapshot::Vehicle;
use crate::matching::MatchOutcome;

/// Stable identity of a vehicle within one snapshot.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum VehicleIdentity {
    Vin(String),
    /// `year|make|model#ordinal`, ordinal counted among VIN-less vehicles.
    Synthetic(String),
}

impl VehicleIdentity {
    pub fn as_key(&self) -> &str {
        match self {
            Self::Vin(value) | Self::Synthetic(value) => value,
        }
    }
}

/// Assigns identities and drops repeated ones, first occurrence wins.
pub fn identify_vehicles(vehicles: &[Vehicle]) -> Vec<(VehicleIdentity, &Vehicle)> {
    let mut ordinals: BTreeMap<String, usize> = BTreeMap::new();
    let mut seen = BTreeSet::new();
    let mut identified = Vec::with_capacity(vehicles.len());

    for vehicle in vehicles {
        let identity = match vehicle.normalized_vin() {
            Some(vin) => VehicleIdentity::Vin(vin),
            None => {
                let base = match vehicle.year_make_model() {
                    Some((year, make, model)) => format!("{year}|{make}|{model}"),
                    None => format!("unknown|{}", vehicle.label().to_lowercase()),
                };
                let ordinal = ordinals.entry(base.clone()).or_insert(0);
                *ordinal += 1;
                VehicleIdentity::Synthetic(format!("{base}#{ordinal}"))
            }
        };

        if seen.insert(identity.clone()) {
            identified.push((identity, vehicle));
        }
    }

    identified
}

/// Identity pairs each side of a vehicle match carries.
pub type IdentifiedVehicle<'a> = (VehicleIdentity, &'a Vehicle);

/// VIN equality when both sides carry a VIN; otherwise first-fit on
/// (year, make, model). Two different VINs never match.
pub fn match_vehicles<'a>(
    baseline: &'a [Vehicle],
    renewal: &'a [Vehicle],
) -> MatchOutcome<IdentifiedVehicle<'a>> {
    let baseline = identify_vehicles(baseline);
    let renewal = identify_vehicles(renewal);

    let mut renewal_taken = vec![false; renewal.len()];
    let mut partner: Vec<Option<usize>> = vec![None; baseline.len()];

    for (b_index, (identity, _)) in baseline.iter().enumerate() {
        if !matches!(identity, VehicleIdentity::Vin(_)) {
            continue;
        }
        if let Some(r_index) = renewal
            .iter()
            .enumerate()
            .position(|(r_index, (other, _))| !renewal_taken[r_index] && other == identity)
        {
            renewal_taken[r_index] = true;
            partner[b_index] = Some(r_index);
        }
    }

    for (b_index, (b_identity, b_vehicle)) in baseline.iter().enumerate() {
        if partner[b_index].is_some() {
            continue;
        }
        let Some(b_ymm) = b_vehicle.year_make_model() else {
            continue;
        };
        let found = renewal.iter().enumerate().position(|(r_index, (r_identity, r_vehicle))| {
            let either_lacks_vin = !matches!(b_identity, VehicleIdentity::Vin(_))
                || !matches!(r_identity, VehicleIdentity::Vin(_));
            !renewal_taken[r_index]
                && either_lacks_vin
                && r_vehicle.year_make_model().as_ref() == Some(&b_ymm)
        });
        if let Some(r_index) = found {
            renewal_taken[r_index] = true;
            partner[b_index] = Some(r_index);
        }
    }

    let mut outcome = MatchOutcome::default();
    for (b_index, entry) in baseline.iter().enumerate() {
        match partner[b_index] {
            Some(r_index) => outcome.matched.push((entry.clone(), renewal[r_index].clone())),
            None => outcome.removed.push(entry.clone()),
        }
    }
    outcome.added = renewal
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !renewal_taken[*index])
        .map(|(_, entry)| entry)
        .collect();

    outcome
}

/// Appends the last four VIN characters to every label shared by two or more
/// entries. Entries without a VIN keep their label.
pub fn disambiguate_labels(entries: &[(String, Option<String>)]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (label, _) in entries {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }

    entries
        .iter()
        .map(|(label, vin)| {
            let shared = counts.get(label.as_str()).copied().unwrap_or(0) > 1;
            match vin.as_deref().map(str::trim).filter(|vin| vin.len() >= 4) {
                Some(vin) if shared => {
                    let tail: String = vin.chars().skip(vin.chars().count().saturating_sub(4)).collect();
                    format!("{label} (…{})", tail.to_ascii_uppercase())
                }
                _ => label.clone(),
            }
        })
        .collect()
}
