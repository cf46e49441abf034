//! Renewal comparison orchestration.
//!
//! Runs matching, coverage merging, classification, premium deltas, claims
//! aging and review progress over one baseline/renewal pair and assembles the
//! [`ComparisonReport`]. Inputs are borrowed and never mutated.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aging::{assess_claims, ClaimsAgingReport};
use crate::catalog::CoverageCatalog;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::coverage::{merge_coverages, CoverageSource, EffectiveCoverage};
use crate::diff::{AdjustmentKind, ChangeClassifier};
use crate::domain::change::{count_material, MaterialChange, Severity};
use crate::domain::check::{CheckResult, CheckSummary};
use crate::domain::snapshot::{Adjustment, Claim, Coverage, Driver, PolicySnapshot, Vehicle};
use crate::errors::DomainError;
use crate::matching::vehicles::IdentifiedVehicle;
use crate::matching::{
    disambiguate_labels, match_by_key, match_claims, match_drivers, match_vehicles,
    normalize_name, VehicleIdentity,
};
use crate::premium::{sum_premiums, PremiumDelta};
use crate::review::{can_approve, compute_progress, derive_check_results, ReviewProgress};

const POLICY_SCOPE: &str = "policy";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Matched,
    Added,
    Removed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleComparison {
    pub key: String,
    pub identity: VehicleIdentity,
    /// Display label, suffixed with the last four VIN characters when another
    /// vehicle in the comparison shares it.
    pub label: String,
    pub status: EntityStatus,
    pub vin: Option<String>,
    pub premium: PremiumDelta,
    pub severity: Severity,
    pub material_change_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverComparison {
    pub key: String,
    pub name: String,
    pub status: EntityStatus,
    pub relationship: Option<String>,
    pub baseline_age: Option<u32>,
    pub renewal_age: Option<u32>,
    pub excluded: bool,
    pub severity: Severity,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageValues {
    pub limit_amount: Option<Decimal>,
    pub limit: Option<String>,
    pub deductible: Option<Decimal>,
    pub premium: Option<Decimal>,
}

impl From<&Coverage> for CoverageValues {
    fn from(coverage: &Coverage) -> Self {
        Self {
            limit_amount: coverage.limit_amount,
            limit: coverage.limit.clone(),
            deductible: coverage.deductible,
            premium: coverage.premium,
        }
    }
}

/// One coverage line in one scope, side by side across terms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRow {
    /// `policy` or `vehicles[<key>]`.
    pub scope: String,
    pub scope_label: String,
    pub coverage_type: String,
    pub label: String,
    pub baseline_source: Option<CoverageSource>,
    pub renewal_source: Option<CoverageSource>,
    pub baseline: Option<CoverageValues>,
    pub renewal: Option<CoverageValues>,
    pub severity: Severity,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub policy_number: Option<String>,
    pub compared_at: DateTime<Utc>,
    pub vehicles: Vec<VehicleComparison>,
    pub drivers: Vec<DriverComparison>,
    pub coverage_rows: Vec<CoverageRow>,
    pub material_changes: Vec<MaterialChange>,
    pub material_change_count: usize,
    pub premium_summary: PremiumDelta,
    pub claims_aging: ClaimsAgingReport,
    pub check_results: Vec<CheckResult>,
    pub check_summary: CheckSummary,
    pub review_progress: ReviewProgress,
    pub can_approve: bool,
    /// blake3 hex digest of the serialized material change list.
    pub fingerprint: String,
}

pub struct RenewalComparisonEngine<C: Clock = SystemClock> {
    config: EngineConfig,
    catalog: CoverageCatalog,
    clock: C,
}

impl RenewalComparisonEngine<SystemClock> {
    /// Validates the configuration; an invalid one never reaches a comparison.
    pub fn new(config: EngineConfig) -> Result<Self, DomainError> {
        config.validate()?;
        let catalog = CoverageCatalog::default().with_labels(&config.coverage_labels);
        Ok(Self { config, catalog, clock: SystemClock })
    }
}

impl<C: Clock> RenewalComparisonEngine<C> {
    pub fn with_clock<D: Clock>(self, clock: D) -> RenewalComparisonEngine<D> {
        RenewalComparisonEngine { config: self.config, catalog: self.catalog, clock }
    }

    pub fn with_catalog(mut self, catalog: CoverageCatalog) -> Self {
        self.catalog = catalog.with_labels(&self.config.coverage_labels);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CoverageCatalog {
        &self.catalog
    }

    /// Compares two terms of one policy.
    ///
    /// `checks` carries existing rule evaluations with their review state;
    /// without it, reviewable results are derived from the material changes.
    pub fn compare(
        &self,
        baseline: &PolicySnapshot,
        renewal: &PolicySnapshot,
        checks: Option<&[CheckResult]>,
    ) -> ComparisonReport {
        let now = self.clock.now();
        info!(
            event_name = "renewal.compare.started",
            baseline_vehicles = baseline.vehicles.len(),
            renewal_vehicles = renewal.vehicles.len(),
            baseline_claims = baseline.claims.len(),
            renewal_claims = renewal.claims.len(),
            "renewal comparison started"
        );

        let classifier = ChangeClassifier::new(&self.config, &self.catalog);
        let mut changes = Vec::new();
        let mut coverage_rows = Vec::new();

        let premium_summary = PremiumDelta::from_totals(
            Some(term_premium(baseline)),
            Some(term_premium(renewal)),
            &self.config.premium_bands,
        );
        changes.extend(classifier.premium_changes(&premium_summary));

        let policy_lines = match_by_key(&baseline.coverages, &renewal.coverages, coverage_key);
        let mut policy_pairs: Vec<(String, Option<&Coverage>, Option<&Coverage>)> = policy_lines
            .matched
            .iter()
            .map(|(old, new)| (old.type_key(), Some(*old), Some(*new)))
            .chain(policy_lines.removed.iter().map(|old| (old.type_key(), Some(*old), None)))
            .chain(policy_lines.added.iter().map(|new| (new.type_key(), None, Some(*new))))
            .collect();
        policy_pairs.sort_by(|left, right| left.0.cmp(&right.0));
        for (coverage_type, old, new) in policy_pairs {
            let line_changes = classifier.coverage_changes(POLICY_SCOPE, &coverage_type, old, new);
            coverage_rows.push(CoverageRow {
                scope: POLICY_SCOPE.to_string(),
                scope_label: "Policy".to_string(),
                label: classifier.coverage_label(&coverage_type, old.or(new)),
                coverage_type,
                baseline_source: old.map(|_| CoverageSource::Policy),
                renewal_source: new.map(|_| CoverageSource::Policy),
                baseline: old.map(CoverageValues::from),
                renewal: new.map(CoverageValues::from),
                severity: worst_severity(&line_changes),
            });
            changes.extend(line_changes);
        }

        let vehicles = self.compare_vehicles(
            &classifier,
            baseline,
            renewal,
            &mut changes,
            &mut coverage_rows,
        );
        let drivers = compare_drivers(&classifier, &baseline.drivers, &renewal.drivers, now, &mut changes);

        for kind in [AdjustmentKind::Discount, AdjustmentKind::Endorsement] {
            let (old, new) = match kind {
                AdjustmentKind::Discount => (&baseline.discounts, &renewal.discounts),
                AdjustmentKind::Endorsement => (&baseline.endorsements, &renewal.endorsements),
            };
            let outcome = match_by_key(old, new, adjustment_key);
            for (old, new) in outcome.matched {
                changes.extend(classifier.adjustment_changes(kind, Some(old), Some(new)));
            }
            for old in outcome.removed {
                changes.extend(classifier.adjustment_changes(kind, Some(old), None));
            }
            for new in outcome.added {
                changes.extend(classifier.adjustment_changes(kind, None, Some(new)));
            }
        }

        let claims = match_claims(&baseline.claims, &renewal.claims);
        for (old, new) in &claims.matched {
            changes.extend(classifier.claim_changes(&claim_key(new), Some(*old), Some(*new)));
        }
        for old in &claims.removed {
            changes.extend(classifier.claim_changes(&claim_key(old), Some(*old), None));
        }
        for new in &claims.added {
            changes.extend(classifier.claim_changes(&claim_key(new), None, Some(*new)));
        }
        let claims_aging = assess_claims(
            renewal.claims.iter().chain(claims.removed.iter().copied()),
            now,
            self.config.claim_surcharge_years,
        );

        changes.extend(classifier.property_changes(baseline.property.as_ref(), renewal.property.as_ref()));

        changes.sort_by_key(|change| self.catalog.category_rank(change.category));
        disambiguate_field_paths(&mut changes);

        let material_change_count = count_material(&changes);
        let check_results = match checks {
            Some(existing) => existing.to_vec(),
            None => derive_check_results(&changes),
        };
        let check_summary = CheckSummary::from_results(&check_results);
        let review_progress = compute_progress(&check_results);
        let can_approve = can_approve(&check_results, material_change_count);
        let fingerprint = fingerprint(&changes);

        info!(
            event_name = "renewal.compare.completed",
            material_change_count,
            recorded_change_count = changes.len(),
            reviewable = review_progress.total_reviewable,
            halted = check_summary.halted,
            can_approve,
            "renewal comparison completed"
        );

        ComparisonReport {
            policy_number: renewal.policy_number.clone().or_else(|| baseline.policy_number.clone()),
            compared_at: now,
            vehicles,
            drivers,
            coverage_rows,
            material_changes: changes,
            material_change_count,
            premium_summary,
            claims_aging,
            check_results,
            check_summary,
            review_progress,
            can_approve,
            fingerprint,
        }
    }

    fn compare_vehicles(
        &self,
        classifier: &ChangeClassifier<'_>,
        baseline: &PolicySnapshot,
        renewal: &PolicySnapshot,
        changes: &mut Vec<MaterialChange>,
        coverage_rows: &mut Vec<CoverageRow>,
    ) -> Vec<VehicleComparison> {
        let outcome = match_vehicles(&baseline.vehicles, &renewal.vehicles);

        let entries: Vec<VehicleEntry<'_>> = outcome
            .matched
            .iter()
            .map(|(old, new)| VehicleEntry::matched(old, new))
            .chain(outcome.removed.iter().map(VehicleEntry::removed))
            .chain(outcome.added.iter().map(VehicleEntry::added))
            .collect();

        let labels = disambiguate_labels(
            &entries
                .iter()
                .map(|entry| (entry.shown.label(), entry.shown.vin.clone()))
                .collect::<Vec<_>>(),
        );

        let mut comparisons = Vec::with_capacity(entries.len());
        for (entry, label) in entries.into_iter().zip(labels) {
            let key = entry.identity.as_key().to_string();
            let scope = format!("vehicles[{key}]");

            let mut vehicle_changes =
                classifier.vehicle_changes(&key, &label, entry.baseline, entry.renewal);

            let old_lines = entry
                .baseline
                .map(|vehicle| merge_coverages(&baseline.coverages, &vehicle.coverages))
                .unwrap_or_default();
            let new_lines = entry
                .renewal
                .map(|vehicle| merge_coverages(&renewal.coverages, &vehicle.coverages))
                .unwrap_or_default();

            let mut types: Vec<&String> = old_lines.keys().chain(new_lines.keys()).collect();
            types.sort();
            types.dedup();

            for coverage_type in types {
                let old = old_lines.get(coverage_type);
                let new = new_lines.get(coverage_type);
                let line_changes = classifier.coverage_changes(
                    &scope,
                    coverage_type,
                    old.map(|line| line.coverage),
                    new.map(|line| line.coverage),
                );

                coverage_rows.push(CoverageRow {
                    scope: scope.clone(),
                    scope_label: label.clone(),
                    coverage_type: coverage_type.clone(),
                    label: classifier.coverage_label(
                        coverage_type,
                        old.or(new).map(|line| line.coverage),
                    ),
                    baseline_source: old.map(|line| line.source),
                    renewal_source: new.map(|line| line.source),
                    baseline: old.map(|line| CoverageValues::from(line.coverage)),
                    renewal: new.map(|line| CoverageValues::from(line.coverage)),
                    severity: worst_severity(&line_changes),
                });

                // Removed and added vehicles are reported once as a whole;
                // policy-sourced lines are already classified at policy scope.
                if entry.status == EntityStatus::Matched && vehicle_sourced(old, new) {
                    vehicle_changes.extend(line_changes);
                }
            }

            let premium = PremiumDelta::from_totals(
                Some(old_lines.values().filter_map(|line| line.coverage.premium).sum()),
                Some(new_lines.values().filter_map(|line| line.coverage.premium).sum()),
                &self.config.premium_bands,
            );

            comparisons.push(VehicleComparison {
                key,
                vin: entry.shown.normalized_vin(),
                identity: entry.identity,
                label,
                status: entry.status,
                premium,
                severity: worst_severity(&vehicle_changes),
                material_change_count: count_material(&vehicle_changes),
            });
            changes.extend(vehicle_changes);
        }

        comparisons
    }
}

struct VehicleEntry<'a> {
    identity: VehicleIdentity,
    status: EntityStatus,
    baseline: Option<&'a Vehicle>,
    renewal: Option<&'a Vehicle>,
    /// The record shown to agents: renewal when present.
    shown: &'a Vehicle,
}

impl<'a> VehicleEntry<'a> {
    fn matched(old: &IdentifiedVehicle<'a>, new: &IdentifiedVehicle<'a>) -> Self {
        let identity = match &new.0 {
            VehicleIdentity::Vin(_) => new.0.clone(),
            VehicleIdentity::Synthetic(_) => old.0.clone(),
        };
        Self {
            identity,
            status: EntityStatus::Matched,
            baseline: Some(old.1),
            renewal: Some(new.1),
            shown: new.1,
        }
    }

    fn removed(old: &IdentifiedVehicle<'a>) -> Self {
        Self {
            identity: old.0.clone(),
            status: EntityStatus::Removed,
            baseline: Some(old.1),
            renewal: None,
            shown: old.1,
        }
    }

    fn added(new: &IdentifiedVehicle<'a>) -> Self {
        Self {
            identity: new.0.clone(),
            status: EntityStatus::Added,
            baseline: None,
            renewal: Some(new.1),
            shown: new.1,
        }
    }
}

fn compare_drivers(
    classifier: &ChangeClassifier<'_>,
    baseline: &[Driver],
    renewal: &[Driver],
    now: DateTime<Utc>,
    changes: &mut Vec<MaterialChange>,
) -> Vec<DriverComparison> {
    let outcome = match_drivers(baseline, renewal);
    let today = now.date_naive();

    let pairs = outcome
        .matched
        .iter()
        .map(|(old, new)| (Some(*old), Some(*new), EntityStatus::Matched))
        .chain(outcome.removed.iter().map(|old| (Some(*old), None, EntityStatus::Removed)))
        .chain(outcome.added.iter().map(|new| (None, Some(*new), EntityStatus::Added)));

    let mut comparisons = Vec::new();
    for (old, new, status) in pairs {
        let Some(shown) = new.or(old) else {
            continue;
        };
        let key = normalize_name(&shown.name);
        let driver_changes = classifier.driver_changes(&key, old, new);

        comparisons.push(DriverComparison {
            name: shown.name.trim().to_string(),
            relationship: shown.relationship.clone(),
            baseline_age: old.and_then(|driver| age_on(driver.date_of_birth, today)),
            renewal_age: new.and_then(|driver| age_on(driver.date_of_birth, today)),
            excluded: shown.excluded,
            severity: worst_severity(&driver_changes),
            key,
            status,
        });
        changes.extend(driver_changes);
    }

    comparisons
}

/// Whole years between birth and `today`; `None` for unknown or future births.
pub fn age_on(date_of_birth: Option<NaiveDate>, today: NaiveDate) -> Option<u32> {
    today.years_since(date_of_birth?)
}

/// Stated term premium, or the sum of every coverage line when absent.
pub fn term_premium(snapshot: &PolicySnapshot) -> Decimal {
    snapshot.term_premium.unwrap_or_else(|| {
        sum_premiums(
            snapshot
                .coverages
                .iter()
                .chain(snapshot.vehicles.iter().flat_map(|vehicle| vehicle.coverages.iter())),
        )
    })
}

/// Most severe entry; `unchanged` when nothing was recorded.
pub fn worst_severity(changes: &[MaterialChange]) -> Severity {
    changes.iter().map(|change| change.severity).min().unwrap_or(Severity::Unchanged)
}

fn vehicle_sourced(old: Option<&EffectiveCoverage<'_>>, new: Option<&EffectiveCoverage<'_>>) -> bool {
    [old, new].into_iter().flatten().any(|line| line.source == CoverageSource::Vehicle)
}

fn coverage_key(coverage: &Coverage) -> Option<String> {
    Some(coverage.type_key()).filter(|key| !key.is_empty())
}

fn adjustment_key(adjustment: &Adjustment) -> Option<String> {
    Some(adjustment.code_key()).filter(|key| !key.is_empty())
}

fn claim_key(claim: &Claim) -> String {
    claim.number_key().unwrap_or_else(|| {
        let date = claim.claim_date.map(|date| date.to_string()).unwrap_or_else(|| "undated".to_string());
        let kind = claim.type_key().unwrap_or_else(|| "unknown".to_string());
        format!("{date}|{kind}")
    })
}

/// Suffixes repeated field paths with `#2`, `#3`, ... in report order so every
/// change, and every check result derived from it, has its own review key.
fn disambiguate_field_paths(changes: &mut [MaterialChange]) {
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for change in changes.iter_mut() {
        if seen.insert(change.field_path.clone()) {
            continue;
        }
        let mut ordinal = 2usize;
        let unique = loop {
            let candidate = format!("{}#{ordinal}", change.field_path);
            if !seen.contains(&candidate) {
                break candidate;
            }
            ordinal += 1;
        };
        seen.insert(unique.clone());
        change.field_path = unique;
    }
}

fn fingerprint(changes: &[MaterialChange]) -> String {
    let canonical_payload = match serde_json::to_vec(changes) {
        Ok(payload) => payload,
        Err(_) => changes
            .iter()
            .map(|change| format!("{}={}", change.field_path, change.description))
            .collect::<Vec<_>>()
            .join("\n")
            .into_bytes(),
    };
    blake3::hash(&canonical_payload).to_hex().to_string()
}
