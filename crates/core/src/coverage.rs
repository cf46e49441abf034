use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::snapshot::Coverage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageSource {
    Policy,
    Vehicle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectiveCoverage<'a> {
    pub coverage: &'a Coverage,
    pub source: CoverageSource,
}

/// Effective coverage set for one vehicle, keyed by normalized type code.
///
/// Vehicle lines replace policy lines of the same type. Within one scope the
/// first line of a type wins.
pub fn merge_coverages<'a>(
    policy: &'a [Coverage],
    vehicle: &'a [Coverage],
) -> BTreeMap<String, EffectiveCoverage<'a>> {
    let mut merged = BTreeMap::new();

    for coverage in policy {
        merged
            .entry(coverage.type_key())
            .or_insert(EffectiveCoverage { coverage, source: CoverageSource::Policy });
    }

    let mut vehicle_seen = Vec::new();
    for coverage in vehicle {
        let key = coverage.type_key();
        if vehicle_seen.contains(&key) {
            continue;
        }
        vehicle_seen.push(key.clone());
        merged.insert(key, EffectiveCoverage { coverage, source: CoverageSource::Vehicle });
    }

    merged
}
