//! Field-level diffing and severity/category classification.
//!
//! The classifier is a pure function of its inputs and configuration: no
//! clock, no randomness, no hash-order iteration. Each `*_changes` method
//! takes one matched pair or an added/removed singleton and returns the
//! changes it implies, in a fixed field order.

pub mod describe;

use rust_decimal::Decimal;

use crate::catalog::CoverageCatalog;
use crate::config::EngineConfig;
use crate::domain::change::{ChangeCategory, MaterialChange, Severity};
use crate::domain::snapshot::{
    normalize_code, Adjustment, Claim, Coverage, Driver, Mortgagee, PropertyContext, Vehicle,
};
use crate::matching::match_by_key;
use crate::premium::PremiumDelta;

use self::describe::{field_change, money, percent, premium_change, presence_change, Direction};

/// Which list an adjustment came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdjustmentKind {
    Discount,
    Endorsement,
}

impl AdjustmentKind {
    fn path(&self) -> &'static str {
        match self {
            Self::Discount => "discounts",
            Self::Endorsement => "endorsements",
        }
    }

    fn added(&self) -> ChangeCategory {
        match self {
            Self::Discount => ChangeCategory::DiscountAdded,
            Self::Endorsement => ChangeCategory::EndorsementAdded,
        }
    }

    fn removed(&self) -> ChangeCategory {
        match self {
            Self::Discount => ChangeCategory::DiscountRemoved,
            Self::Endorsement => ChangeCategory::EndorsementRemoved,
        }
    }

    fn field_category(&self) -> ChangeCategory {
        match self {
            Self::Discount => ChangeCategory::Other,
            Self::Endorsement => ChangeCategory::Endorsement,
        }
    }
}

pub struct ChangeClassifier<'a> {
    config: &'a EngineConfig,
    catalog: &'a CoverageCatalog,
}

impl<'a> ChangeClassifier<'a> {
    pub fn new(config: &'a EngineConfig, catalog: &'a CoverageCatalog) -> Self {
        Self { config, catalog }
    }

    /// Fixed lookup from entity kind and field to category.
    pub fn category_for(entity: EntityKind, field: &str) -> ChangeCategory {
        match (entity, field) {
            (_, "premium") => ChangeCategory::Premium,
            (EntityKind::Coverage, "limit") => ChangeCategory::CoverageLimit,
            (EntityKind::Coverage, "deductible") => ChangeCategory::Deductible,
            (EntityKind::Endorsement, _) => ChangeCategory::Endorsement,
            (EntityKind::Claim, _) => ChangeCategory::Claim,
            (EntityKind::Property, _) => ChangeCategory::Property,
            _ => ChangeCategory::Other,
        }
    }

    fn settle(&self, field: &str, severity: Severity) -> Severity {
        if self.config.is_non_material(field) {
            Severity::Unchanged
        } else {
            severity
        }
    }

    /// Changes between two versions of one coverage line in the given scope.
    pub fn coverage_changes(
        &self,
        scope_path: &str,
        coverage_type: &str,
        baseline: Option<&Coverage>,
        renewal: Option<&Coverage>,
    ) -> Vec<MaterialChange> {
        let label = self.coverage_label(coverage_type, baseline.or(renewal));
        let path = format!("{scope_path}.coverages.{coverage_type}");

        let (baseline, renewal) = match (baseline, renewal) {
            (None, None) => return Vec::new(),
            (None, Some(added)) => {
                return vec![presence(
                    path,
                    ChangeCategory::CoverageAdded,
                    Severity::Added,
                    &label,
                    None,
                    Some(coverage_summary(added)),
                )]
            }
            (Some(removed), None) => {
                return vec![presence(
                    path,
                    ChangeCategory::CoverageRemoved,
                    Severity::Removed,
                    &label,
                    Some(coverage_summary(removed)),
                    None,
                )]
            }
            (Some(baseline), Some(renewal)) => (baseline, renewal),
        };

        let mut changes = Vec::new();

        if baseline.premium != renewal.premium {
            let delta = PremiumDelta::from_totals(
                baseline.premium,
                renewal.premium,
                &self.config.premium_bands,
            );
            let severity = delta.severity().unwrap_or(Severity::Info);
            changes.push(MaterialChange {
                field_path: format!("{path}.premium"),
                category: ChangeCategory::Premium,
                severity: self.settle("premium", severity),
                description: premium_change(
                    &format!("{label} premium"),
                    delta.baseline,
                    delta.renewal,
                    delta.delta_percent,
                ),
                old_value: baseline.premium.map(money),
                new_value: renewal.premium.map(money),
            });
        }

        let old_limit = limit_display(baseline);
        let new_limit = limit_display(renewal);
        if old_limit != new_limit {
            let severity = match Direction::of(baseline.limit_amount, renewal.limit_amount) {
                Direction::Decreased => Severity::MaterialNegative,
                Direction::Increased => Severity::MaterialPositive,
                Direction::Changed => Severity::Info,
            };
            changes.push(MaterialChange {
                field_path: format!("{path}.limit"),
                category: ChangeCategory::CoverageLimit,
                severity: self.settle("limit", severity),
                description: field_change(
                    &format!("{label} limit"),
                    Direction::of(baseline.limit_amount, renewal.limit_amount),
                    old_limit.as_deref(),
                    new_limit.as_deref(),
                ),
                old_value: old_limit,
                new_value: new_limit,
            });
        }

        if baseline.deductible != renewal.deductible {
            let direction = Direction::of(baseline.deductible, renewal.deductible);
            let severity = match direction {
                Direction::Increased => Severity::MaterialNegative,
                Direction::Decreased => Severity::MaterialPositive,
                Direction::Changed => Severity::Info,
            };
            let old_value = baseline.deductible.map(money);
            let new_value = renewal.deductible.map(money);
            changes.push(MaterialChange {
                field_path: format!("{path}.deductible"),
                category: ChangeCategory::Deductible,
                severity: self.settle("deductible", severity),
                description: field_change(
                    &format!("{label} deductible"),
                    direction,
                    old_value.as_deref(),
                    new_value.as_deref(),
                ),
                old_value,
                new_value,
            });
        }

        changes
    }

    pub fn vehicle_changes(
        &self,
        vehicle_key: &str,
        label: &str,
        baseline: Option<&Vehicle>,
        renewal: Option<&Vehicle>,
    ) -> Vec<MaterialChange> {
        let path = format!("vehicles[{vehicle_key}]");
        match (baseline, renewal) {
            (None, None) => Vec::new(),
            (None, Some(_)) => {
                vec![presence(
                    path,
                    ChangeCategory::VehicleAdded,
                    Severity::Added,
                    label,
                    None,
                    Some(label.to_string()),
                )]
            }
            (Some(_), None) => {
                vec![presence(
                    path,
                    ChangeCategory::VehicleRemoved,
                    Severity::Removed,
                    label,
                    Some(label.to_string()),
                    None,
                )]
            }
            (Some(baseline), Some(renewal)) => {
                let mut changes = Vec::new();
                self.push_text(
                    &mut changes,
                    EntityKind::Vehicle,
                    &path,
                    label,
                    "lienholder",
                    baseline.lienholder.clone(),
                    renewal.lienholder.clone(),
                    Severity::Info,
                );
                if baseline.annual_mileage != renewal.annual_mileage {
                    let direction = Direction::of(
                        baseline.annual_mileage.map(Decimal::from),
                        renewal.annual_mileage.map(Decimal::from),
                    );
                    let old_value = baseline.annual_mileage.map(|miles| format!("{miles} mi"));
                    let new_value = renewal.annual_mileage.map(|miles| format!("{miles} mi"));
                    changes.push(MaterialChange {
                        field_path: format!("{path}.annual_mileage"),
                        category: Self::category_for(EntityKind::Vehicle, "annual_mileage"),
                        severity: self.settle("annual_mileage", Severity::Info),
                        description: field_change(
                            &format!("{label} annual mileage"),
                            direction,
                            old_value.as_deref(),
                            new_value.as_deref(),
                        ),
                        old_value,
                        new_value,
                    });
                }
                changes
            }
        }
    }

    pub fn driver_changes(
        &self,
        driver_key: &str,
        baseline: Option<&Driver>,
        renewal: Option<&Driver>,
    ) -> Vec<MaterialChange> {
        let path = format!("drivers[{driver_key}]");
        match (baseline, renewal) {
            (None, None) => Vec::new(),
            (None, Some(added)) => {
                let label = added.name.trim();
                vec![presence(
                    path,
                    ChangeCategory::DriverAdded,
                    Severity::Added,
                    label,
                    None,
                    Some(label.to_string()),
                )]
            }
            (Some(removed), None) => {
                let label = removed.name.trim();
                vec![presence(
                    path,
                    ChangeCategory::DriverRemoved,
                    Severity::Removed,
                    label,
                    Some(label.to_string()),
                    None,
                )]
            }
            (Some(baseline), Some(renewal)) => {
                let label = renewal.name.trim();
                let mut changes = Vec::new();
                if baseline.excluded != renewal.excluded {
                    let (old_value, new_value) = (
                        exclusion_label(baseline.excluded).to_string(),
                        exclusion_label(renewal.excluded).to_string(),
                    );
                    let severity =
                        if renewal.excluded { Severity::Warning } else { Severity::Info };
                    changes.push(MaterialChange {
                        field_path: format!("{path}.excluded"),
                        category: Self::category_for(EntityKind::Driver, "excluded"),
                        severity: self.settle("excluded", severity),
                        description: field_change(
                            &format!("{label} rating status"),
                            Direction::Changed,
                            Some(&old_value),
                            Some(&new_value),
                        ),
                        old_value: Some(old_value),
                        new_value: Some(new_value),
                    });
                }
                self.push_text(
                    &mut changes,
                    EntityKind::Driver,
                    &path,
                    label,
                    "date_of_birth",
                    baseline.date_of_birth.map(|date| date.to_string()),
                    renewal.date_of_birth.map(|date| date.to_string()),
                    Severity::Info,
                );
                self.push_text(
                    &mut changes,
                    EntityKind::Driver,
                    &path,
                    label,
                    "relationship",
                    baseline.relationship.clone(),
                    renewal.relationship.clone(),
                    Severity::Info,
                );
                self.push_text(
                    &mut changes,
                    EntityKind::Driver,
                    &path,
                    label,
                    "license_state",
                    baseline.license_state.clone(),
                    renewal.license_state.clone(),
                    Severity::Info,
                );
                changes
            }
        }
    }

    pub fn adjustment_changes(
        &self,
        kind: AdjustmentKind,
        baseline: Option<&Adjustment>,
        renewal: Option<&Adjustment>,
    ) -> Vec<MaterialChange> {
        let Some(any) = baseline.or(renewal) else {
            return Vec::new();
        };
        let path = format!("{}[{}]", kind.path(), any.code_key());
        let label = any.label();

        match (baseline, renewal) {
            (None, _) => vec![presence(
                path,
                kind.added(),
                Severity::Added,
                &label,
                None,
                renewal.and_then(adjustment_value),
            )],
            (_, None) => vec![presence(
                path,
                kind.removed(),
                Severity::Removed,
                &label,
                baseline.and_then(adjustment_value),
                None,
            )],
            (Some(baseline), Some(renewal)) => {
                let mut changes = Vec::new();
                let entity = match kind {
                    AdjustmentKind::Discount => EntityKind::Discount,
                    AdjustmentKind::Endorsement => EntityKind::Endorsement,
                };
                for (field, old, new) in [
                    ("percent", baseline.percent, renewal.percent),
                    ("amount", baseline.amount, renewal.amount),
                ] {
                    if old == new {
                        continue;
                    }
                    let direction = Direction::of(old, new);
                    let severity = match (kind, direction) {
                        (AdjustmentKind::Discount, Direction::Decreased) => {
                            Severity::MaterialNegative
                        }
                        (AdjustmentKind::Discount, Direction::Increased) => {
                            Severity::MaterialPositive
                        }
                        _ => Severity::Info,
                    };
                    let render = |value: Decimal| {
                        if field == "percent" {
                            percent(value)
                        } else {
                            money(value)
                        }
                    };
                    let old_value = old.map(render);
                    let new_value = new.map(render);
                    changes.push(MaterialChange {
                        field_path: format!("{path}.{field}"),
                        category: kind.field_category(),
                        severity: self.settle(field, severity),
                        description: field_change(
                            &format!("{label} {field}"),
                            direction,
                            old_value.as_deref(),
                            new_value.as_deref(),
                        ),
                        old_value,
                        new_value,
                    });
                }
                self.push_text(
                    &mut changes,
                    entity,
                    &path,
                    &label,
                    "description",
                    baseline.description.clone(),
                    renewal.description.clone(),
                    Severity::Info,
                );
                changes
            }
        }
    }

    pub fn claim_changes(
        &self,
        claim_key: &str,
        baseline: Option<&Claim>,
        renewal: Option<&Claim>,
    ) -> Vec<MaterialChange> {
        let path = format!("claims[{claim_key}]");
        match (baseline, renewal) {
            (None, None) => Vec::new(),
            (None, Some(added)) => vec![MaterialChange {
                field_path: path,
                category: ChangeCategory::Claim,
                severity: Severity::Added,
                description: format!("New claim on record: {}", added.label()),
                old_value: None,
                new_value: Some(added.label()),
            }],
            (Some(removed), None) => vec![MaterialChange {
                field_path: path,
                category: ChangeCategory::Claim,
                severity: Severity::Removed,
                description: format!("Claim no longer on record: {}", removed.label()),
                old_value: Some(removed.label()),
                new_value: None,
            }],
            (Some(baseline), Some(renewal)) => {
                let label = renewal.label();
                let mut changes = Vec::new();
                if baseline.amount != renewal.amount {
                    let old_value = baseline.amount.map(money);
                    let new_value = renewal.amount.map(money);
                    changes.push(MaterialChange {
                        field_path: format!("{path}.amount"),
                        category: ChangeCategory::Claim,
                        severity: self.settle("amount", Severity::Info),
                        description: field_change(
                            &format!("{label} amount"),
                            Direction::of(baseline.amount, renewal.amount),
                            old_value.as_deref(),
                            new_value.as_deref(),
                        ),
                        old_value,
                        new_value,
                    });
                }
                self.push_text(
                    &mut changes,
                    EntityKind::Claim,
                    &path,
                    &label,
                    "status",
                    baseline.status.clone(),
                    renewal.status.clone(),
                    Severity::Info,
                );
                changes
            }
        }
    }

    pub fn property_changes(
        &self,
        baseline: Option<&PropertyContext>,
        renewal: Option<&PropertyContext>,
    ) -> Vec<MaterialChange> {
        let empty = PropertyContext::default();
        if baseline.is_none() && renewal.is_none() {
            return Vec::new();
        }
        let old = baseline.unwrap_or(&empty);
        let new = renewal.unwrap_or(&empty);
        let mut changes = Vec::new();

        let scalar_fields = [
            ("year_built", "Year built", display(old.year_built), display(new.year_built)),
            ("roof_year", "Roof year", display(old.roof_year), display(new.roof_year)),
            ("square_feet", "Square footage", display(old.square_feet), display(new.square_feet)),
            (
                "construction_type",
                "Construction type",
                old.construction_type.clone(),
                new.construction_type.clone(),
            ),
            (
                "protection_class",
                "Protection class",
                old.protection_class.clone(),
                new.protection_class.clone(),
            ),
        ];
        for (field, subject, old_value, new_value) in scalar_fields {
            if normalized(&old_value) == normalized(&new_value) {
                continue;
            }
            changes.push(MaterialChange {
                field_path: format!("property.{field}"),
                category: ChangeCategory::Property,
                severity: self.settle(field, Severity::Info),
                description: field_change(
                    subject,
                    Direction::Changed,
                    old_value.as_deref(),
                    new_value.as_deref(),
                ),
                old_value,
                new_value,
            });
        }

        if old.dwelling_replacement_cost != new.dwelling_replacement_cost {
            let old_value = old.dwelling_replacement_cost.map(money);
            let new_value = new.dwelling_replacement_cost.map(money);
            changes.push(MaterialChange {
                field_path: "property.dwelling_replacement_cost".to_string(),
                category: ChangeCategory::Property,
                severity: self.settle("dwelling_replacement_cost", Severity::Info),
                description: field_change(
                    "Dwelling replacement cost",
                    Direction::of(old.dwelling_replacement_cost, new.dwelling_replacement_cost),
                    old_value.as_deref(),
                    new_value.as_deref(),
                ),
                old_value,
                new_value,
            });
        }

        let outcome = match_by_key(&old.mortgagees, &new.mortgagees, mortgagee_key);
        for (before, after) in outcome.matched {
            let path = format!("property.mortgagees[{}]", mortgagee_key(after).unwrap_or_default());
            self.push_text(
                &mut changes,
                EntityKind::Property,
                &path,
                after.name.trim(),
                "loan_number",
                before.loan_number.clone(),
                after.loan_number.clone(),
                Severity::Info,
            );
        }
        for removed in outcome.removed {
            let name = removed.name.trim();
            changes.push(presence(
                format!("property.mortgagees[{}]", mortgagee_key(removed).unwrap_or_default()),
                ChangeCategory::MortgageeRemoved,
                Severity::Removed,
                name,
                Some(name.to_string()),
                None,
            ));
        }
        for added in outcome.added {
            let name = added.name.trim();
            changes.push(presence(
                format!("property.mortgagees[{}]", mortgagee_key(added).unwrap_or_default()),
                ChangeCategory::MortgageeAdded,
                Severity::Added,
                name,
                None,
                Some(name.to_string()),
            ));
        }

        changes
    }

    /// Policy-level premium change, if the premium moved.
    pub fn premium_changes(&self, delta: &PremiumDelta) -> Vec<MaterialChange> {
        let Some(severity) = delta.severity() else {
            return Vec::new();
        };

        vec![MaterialChange {
            field_path: "premium".to_string(),
            category: ChangeCategory::Premium,
            severity: self.settle("premium", severity),
            description: premium_change(
                "Policy premium",
                delta.baseline,
                delta.renewal,
                delta.delta_percent,
            ),
            old_value: Some(money(delta.baseline)),
            new_value: Some(money(delta.renewal)),
        }]
    }

    pub fn coverage_label(&self, coverage_type: &str, coverage: Option<&Coverage>) -> String {
        coverage
            .and_then(|coverage| coverage.label.as_deref())
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.catalog.label(coverage_type))
    }

    #[allow(clippy::too_many_arguments)]
    fn push_text(
        &self,
        changes: &mut Vec<MaterialChange>,
        entity: EntityKind,
        path: &str,
        label: &str,
        field: &str,
        old_value: Option<String>,
        new_value: Option<String>,
        severity: Severity,
    ) {
        if normalized(&old_value) == normalized(&new_value) {
            return;
        }
        changes.push(MaterialChange {
            field_path: format!("{path}.{field}"),
            category: Self::category_for(entity, field),
            severity: self.settle(field, severity),
            description: field_change(
                &format!("{label} {}", field.replace('_', " ")),
                Direction::Changed,
                old_value.as_deref(),
                new_value.as_deref(),
            ),
            old_value,
            new_value,
        });
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Coverage,
    Vehicle,
    Driver,
    Discount,
    Endorsement,
    Claim,
    Property,
}

fn presence(
    field_path: String,
    category: ChangeCategory,
    severity: Severity,
    label: &str,
    old_value: Option<String>,
    new_value: Option<String>,
) -> MaterialChange {
    let detail = match severity {
        Severity::Removed => old_value.as_deref(),
        _ => new_value.as_deref(),
    }
    .filter(|detail| *detail != label);

    MaterialChange {
        field_path,
        category,
        severity,
        description: presence_change(category, label, detail),
        old_value,
        new_value,
    }
}

/// Limit as shown: the amount when known, otherwise the carrier's text.
fn limit_display(coverage: &Coverage) -> Option<String> {
    match (coverage.limit_amount, coverage.limit.as_deref().map(str::trim)) {
        (Some(amount), _) => Some(money(amount)),
        (None, Some(raw)) if !raw.is_empty() => Some(raw.to_string()),
        _ => None,
    }
}

fn coverage_summary(coverage: &Coverage) -> String {
    let mut parts = Vec::new();
    if let Some(limit) = limit_display(coverage) {
        parts.push(format!("limit {limit}"));
    }
    if let Some(deductible) = coverage.deductible {
        parts.push(format!("deductible {}", money(deductible)));
    }
    if let Some(premium) = coverage.premium {
        parts.push(format!("premium {}", money(premium)));
    }
    if parts.is_empty() {
        "no details".to_string()
    } else {
        parts.join(", ")
    }
}

fn adjustment_value(adjustment: &Adjustment) -> Option<String> {
    match (adjustment.percent, adjustment.amount) {
        (Some(value), _) => Some(percent(value)),
        (None, Some(amount)) => Some(money(amount)),
        (None, None) => None,
    }
}

fn display<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|value| value.to_string())
}

fn exclusion_label(excluded: bool) -> &'static str {
    if excluded {
        "excluded"
    } else {
        "rated"
    }
}

fn mortgagee_key(mortgagee: &Mortgagee) -> Option<String> {
    let key = normalize_code(&mortgagee.name);
    (!key.is_empty()).then_some(key)
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{AdjustmentKind, ChangeClassifier};
    use crate::catalog::CoverageCatalog;
    use crate::config::EngineConfig;
    use crate::domain::change::{ChangeCategory, Severity};
    use crate::domain::snapshot::{Adjustment, Claim, Coverage, Driver, Mortgagee, PropertyContext};

    fn dollars(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    fn bodily(limit: i64) -> Coverage {
        Coverage {
            coverage_type: "bodily_injury".to_string(),
            limit_amount: Some(dollars(limit)),
            ..Coverage::default()
        }
    }

    fn with_classifier<T>(config: EngineConfig, run: impl FnOnce(&ChangeClassifier<'_>) -> T) -> T {
        let catalog = CoverageCatalog::default();
        let classifier = ChangeClassifier::new(&config, &catalog);
        run(&classifier)
    }

    #[test]
    fn limit_decrease_is_material_negative() {
        let changes = with_classifier(EngineConfig::default(), |c| {
            c.coverage_changes(
                "policy",
                "bodily_injury",
                Some(&bodily(100_000)),
                Some(&bodily(50_000)),
            )
        });

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].category, ChangeCategory::CoverageLimit);
        assert_eq!(changes[0].severity, Severity::MaterialNegative);
        assert_eq!(changes[0].field_path, "policy.coverages.bodily_injury.limit");
        assert_eq!(
            changes[0].description,
            "Bodily Injury limit decreased from $100,000 to $50,000"
        );
    }

    #[test]
    fn each_coverage_field_is_reported_separately() {
        let baseline = Coverage {
            coverage_type: "collision".to_string(),
            deductible: Some(dollars(500)),
            premium: Some(dollars(400)),
            ..Coverage::default()
        };
        let renewal = Coverage {
            deductible: Some(dollars(1_000)),
            premium: Some(dollars(360)),
            ..baseline.clone()
        };

        let changes = with_classifier(EngineConfig::default(), |c| {
            c.coverage_changes("policy", "collision", Some(&baseline), Some(&renewal))
        });

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].category, ChangeCategory::Premium);
        assert_eq!(changes[0].severity, Severity::MaterialPositive);
        assert_eq!(changes[1].category, ChangeCategory::Deductible);
        assert_eq!(changes[1].severity, Severity::MaterialNegative);
    }

    #[test]
    fn deductible_decrease_and_limit_increase_are_positive() {
        let baseline = Coverage { deductible: Some(dollars(1_000)), ..bodily(50_000) };
        let renewal = Coverage { deductible: Some(dollars(250)), ..bodily(100_000) };

        let changes = with_classifier(EngineConfig::default(), |c| {
            c.coverage_changes("policy", "bodily_injury", Some(&baseline), Some(&renewal))
        });

        assert!(changes.iter().all(|change| change.severity == Severity::MaterialPositive));
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn added_and_removed_coverages_use_presence_categories() {
        let towing = Coverage {
            coverage_type: "towing".to_string(),
            limit_amount: Some(dollars(100)),
            ..Coverage::default()
        };
        let (added, removed) = with_classifier(EngineConfig::default(), |c| {
            (
                c.coverage_changes("policy", "towing", None, Some(&towing)),
                c.coverage_changes("policy", "bodily_injury", Some(&bodily(100_000)), None),
            )
        });

        assert_eq!(added[0].category, ChangeCategory::CoverageAdded);
        assert_eq!(added[0].severity, Severity::Added);
        assert_eq!(added[0].description, "Towing & Labor coverage added (limit $100)");
        assert_eq!(removed[0].category, ChangeCategory::CoverageRemoved);
        assert_eq!(removed[0].severity, Severity::Removed);
    }

    #[test]
    fn raw_limit_text_change_is_informational() {
        let baseline = Coverage {
            coverage_type: "bodily_injury".to_string(),
            limit: Some("100/300".to_string()),
            ..Coverage::default()
        };
        let renewal = Coverage { limit: Some("250/500".to_string()), ..baseline.clone() };

        let changes = with_classifier(EngineConfig::default(), |c| {
            c.coverage_changes("policy", "bodily_injury", Some(&baseline), Some(&renewal))
        });

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].severity, Severity::Info);
        assert_eq!(changes[0].description, "Bodily Injury limit changed from 100/300 to 250/500");
    }

    #[test]
    fn non_material_fields_are_recorded_as_unchanged() {
        let mut config = EngineConfig::default();
        config.non_material_fields.insert("deductible".to_string());
        let baseline = Coverage { deductible: Some(dollars(500)), ..bodily(100_000) };
        let renewal = Coverage { deductible: Some(dollars(1_000)), ..bodily(100_000) };

        let changes = with_classifier(config, |c| {
            c.coverage_changes("policy", "bodily_injury", Some(&baseline), Some(&renewal))
        });

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].severity, Severity::Unchanged);
        assert!(!changes[0].is_material());
    }

    #[test]
    fn driver_exclusion_and_presence() {
        let rated = Driver { name: "Jane Doe".to_string(), ..Driver::default() };
        let excluded = Driver { excluded: true, ..rated.clone() };

        let (changed, added) = with_classifier(EngineConfig::default(), |c| {
            (
                c.driver_changes("jane doe", Some(&rated), Some(&excluded)),
                c.driver_changes("jane doe", None, Some(&rated)),
            )
        });

        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].severity, Severity::Warning);
        assert_eq!(changed[0].category, ChangeCategory::Other);
        assert_eq!(changed[0].description, "Jane Doe rating status changed from rated to excluded");
        assert_eq!(added[0].category, ChangeCategory::DriverAdded);
        assert_eq!(added[0].description, "Driver added: Jane Doe");
    }

    #[test]
    fn discount_changes() {
        let before = Adjustment {
            code: "MULTI_CAR".to_string(),
            description: Some("Multi-car".to_string()),
            percent: Some(dollars(10)),
            amount: None,
        };
        let after = Adjustment { percent: Some(dollars(5)), ..before.clone() };

        let (changed, removed) = with_classifier(EngineConfig::default(), |c| {
            (
                c.adjustment_changes(AdjustmentKind::Discount, Some(&before), Some(&after)),
                c.adjustment_changes(AdjustmentKind::Discount, Some(&before), None),
            )
        });

        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].severity, Severity::MaterialNegative);
        assert_eq!(changed[0].field_path, "discounts[multi_car].percent");
        assert_eq!(changed[0].description, "Multi-car percent decreased from 10% to 5%");
        assert_eq!(removed[0].category, ChangeCategory::DiscountRemoved);
        assert_eq!(removed[0].description, "Discount removed: Multi-car (10%)");
    }

    #[test]
    fn endorsement_field_changes_use_endorsement_category() {
        let before = Adjustment {
            code: "HO-04-90".to_string(),
            description: Some("Personal Property Replacement Cost".to_string()),
            percent: None,
            amount: Some(dollars(45)),
        };
        let after = Adjustment { amount: Some(dollars(55)), ..before.clone() };

        let changes = with_classifier(EngineConfig::default(), |c| {
            c.adjustment_changes(AdjustmentKind::Endorsement, Some(&before), Some(&after))
        });

        assert_eq!(changes[0].category, ChangeCategory::Endorsement);
        assert_eq!(changes[0].severity, Severity::Info);
    }

    #[test]
    fn claim_status_change_is_a_claim_change() {
        let before = Claim {
            claim_number: Some("CLM-9".to_string()),
            claim_type: Some("Collision".to_string()),
            status: Some("Open".to_string()),
            ..Claim::default()
        };
        let after = Claim { status: Some("Closed".to_string()), ..before.clone() };

        let changes = with_classifier(EngineConfig::default(), |c| {
            c.claim_changes("clm-9", Some(&before), Some(&after))
        });

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].category, ChangeCategory::Claim);
        assert_eq!(changes[0].description, "Collision #CLM-9 status changed from Open to Closed");
    }

    #[test]
    fn property_and_mortgagee_changes() {
        let before = PropertyContext {
            roof_year: Some(2005),
            mortgagees: vec![Mortgagee { name: "First Bank".to_string(), loan_number: None }],
            ..PropertyContext::default()
        };
        let after = PropertyContext {
            roof_year: Some(2022),
            mortgagees: vec![Mortgagee { name: "Second Lending".to_string(), loan_number: None }],
            ..PropertyContext::default()
        };

        let changes = with_classifier(EngineConfig::default(), |c| {
            c.property_changes(Some(&before), Some(&after))
        });

        let categories: Vec<ChangeCategory> = changes.iter().map(|c| c.category).collect();
        assert_eq!(
            categories,
            vec![
                ChangeCategory::Property,
                ChangeCategory::MortgageeRemoved,
                ChangeCategory::MortgageeAdded
            ]
        );
        assert_eq!(changes[0].description, "Roof year changed from 2005 to 2022");
        assert_eq!(changes[2].description, "Mortgagee added: Second Lending");
    }

    #[test]
    fn classification_is_repeatable() {
        let run = || {
            with_classifier(EngineConfig::default(), |c| {
                c.coverage_changes(
                    "policy",
                    "bodily_injury",
                    Some(&bodily(100_000)),
                    Some(&bodily(50_000)),
                )
            })
        };
        let first = serde_json::to_string(&run()).expect("serialize");
        let second = serde_json::to_string(&run()).expect("serialize");
        assert_eq!(first, second);
    }
}
