use serde::{Deserialize, Serialize};

/// Closed set of change categories surfaced to agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    Premium,
    CoverageLimit,
    CoverageRemoved,
    CoverageAdded,
    Deductible,
    VehicleRemoved,
    VehicleAdded,
    DriverRemoved,
    DriverAdded,
    Endorsement,
    EndorsementRemoved,
    EndorsementAdded,
    DiscountRemoved,
    DiscountAdded,
    Claim,
    MortgageeAdded,
    MortgageeRemoved,
    Property,
    Other,
}

impl ChangeCategory {
    pub const ALL: [ChangeCategory; 19] = [
        Self::Premium,
        Self::CoverageLimit,
        Self::CoverageRemoved,
        Self::CoverageAdded,
        Self::Deductible,
        Self::VehicleRemoved,
        Self::VehicleAdded,
        Self::DriverRemoved,
        Self::DriverAdded,
        Self::Endorsement,
        Self::EndorsementRemoved,
        Self::EndorsementAdded,
        Self::DiscountRemoved,
        Self::DiscountAdded,
        Self::Claim,
        Self::MortgageeAdded,
        Self::MortgageeRemoved,
        Self::Property,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Premium => "premium",
            Self::CoverageLimit => "coverage_limit",
            Self::CoverageRemoved => "coverage_removed",
            Self::CoverageAdded => "coverage_added",
            Self::Deductible => "deductible",
            Self::VehicleRemoved => "vehicle_removed",
            Self::VehicleAdded => "vehicle_added",
            Self::DriverRemoved => "driver_removed",
            Self::DriverAdded => "driver_added",
            Self::Endorsement => "endorsement",
            Self::EndorsementRemoved => "endorsement_removed",
            Self::EndorsementAdded => "endorsement_added",
            Self::DiscountRemoved => "discount_removed",
            Self::DiscountAdded => "discount_added",
            Self::Claim => "claim",
            Self::MortgageeAdded => "mortgagee_added",
            Self::MortgageeRemoved => "mortgagee_removed",
            Self::Property => "property",
            Self::Other => "other",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    MaterialNegative,
    Removed,
    Added,
    MaterialPositive,
    Info,
    /// Recorded for context only; never counts as material.
    Unchanged,
}

impl Severity {
    pub fn is_material(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::MaterialNegative => "material_negative",
            Self::Removed => "removed",
            Self::Added => "added",
            Self::MaterialPositive => "material_positive",
            Self::Info => "info",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Output unit of the classifier: one detected difference between terms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialChange {
    pub field_path: String,
    pub category: ChangeCategory,
    pub severity: Severity,
    pub description: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl MaterialChange {
    pub fn is_material(&self) -> bool {
        self.severity.is_material()
    }
}

pub fn count_material(changes: &[MaterialChange]) -> usize {
    changes.iter().filter(|change| change.is_material()).count()
}
