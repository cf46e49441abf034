use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical policy-term record produced upstream by extraction or sync.
///
/// Baseline and renewal terms share this shape. The engine only reads it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    #[serde(default)]
    pub policy_number: Option<String>,
    #[serde(default)]
    pub term_effective: Option<NaiveDate>,
    #[serde(default)]
    pub term_expiration: Option<NaiveDate>,
    #[serde(default)]
    pub term_premium: Option<Decimal>,
    #[serde(default)]
    pub insured: InsuredIdentity,
    #[serde(default)]
    pub coverages: Vec<Coverage>,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub discounts: Vec<Adjustment>,
    #[serde(default)]
    pub endorsements: Vec<Adjustment>,
    #[serde(default)]
    pub claims: Vec<Claim>,
    #[serde(default)]
    pub property: Option<PropertyContext>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuredIdentity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mailing_address: Option<String>,
    #[serde(default)]
    pub carrier: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    #[serde(rename = "type")]
    pub coverage_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub limit_amount: Option<Decimal>,
    /// Limit as printed by the carrier, e.g. `100/300` or `Actual Cash Value`.
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub deductible: Option<Decimal>,
    #[serde(default)]
    pub premium: Option<Decimal>,
    #[serde(default)]
    pub valuation: BTreeMap<String, String>,
}

impl Coverage {
    pub fn type_key(&self) -> String {
        normalize_code(&self.coverage_type)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub annual_mileage: Option<u32>,
    #[serde(default)]
    pub lienholder: Option<String>,
    #[serde(default)]
    pub coverages: Vec<Coverage>,
}

impl Vehicle {
    /// Upper-cased 17-character VIN, or `None` when absent or partial.
    pub fn normalized_vin(&self) -> Option<String> {
        let vin = self.vin.as_deref()?.trim().to_ascii_uppercase();
        (vin.len() == 17 && vin.chars().all(|ch| ch.is_ascii_alphanumeric())).then_some(vin)
    }

    /// Lower-cased (year, make, model) triple used as the fallback identity.
    pub fn year_make_model(&self) -> Option<(u16, String, String)> {
        let year = self.year?;
        let make = self.make.as_deref().map(normalize_code).filter(|v| !v.is_empty())?;
        let model = self.model.as_deref().map(normalize_code).filter(|v| !v.is_empty())?;
        Some((year, make, model))
    }

    pub fn label(&self) -> String {
        let parts: Vec<String> = [
            self.year.map(|year| year.to_string()),
            self.make.as_ref().map(|v| v.trim().to_string()),
            self.model.as_ref().map(|v| v.trim().to_string()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect();

        if parts.is_empty() {
            "Unknown vehicle".to_string()
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub license_state: Option<String>,
    #[serde(default)]
    pub excluded: bool,
}

/// A discount or endorsement line, keyed by its carrier code.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub percent: Option<Decimal>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl Adjustment {
    pub fn code_key(&self) -> String {
        normalize_code(&self.code)
    }

    pub fn label(&self) -> String {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.code.trim().to_string())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(default)]
    pub claim_number: Option<String>,
    #[serde(default)]
    pub claim_date: Option<NaiveDate>,
    #[serde(default)]
    pub claim_type: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    /// Free-text hint such as `Home Claim` or `Auto Violation`.
    #[serde(default)]
    pub category_hint: Option<String>,
}

impl Claim {
    pub fn number_key(&self) -> Option<String> {
        self.claim_number.as_deref().map(normalize_code).filter(|value| !value.is_empty())
    }

    pub fn type_key(&self) -> Option<String> {
        self.claim_type.as_deref().map(normalize_code).filter(|value| !value.is_empty())
    }

    pub fn label(&self) -> String {
        let kind = self.claim_type.as_deref().unwrap_or("Claim").trim();
        match (&self.claim_number, self.claim_date) {
            (Some(number), _) => format!("{kind} #{}", number.trim()),
            (None, Some(date)) => format!("{kind} on {date}"),
            (None, None) => kind.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyContext {
    #[serde(default)]
    pub year_built: Option<u16>,
    #[serde(default)]
    pub roof_year: Option<u16>,
    #[serde(default)]
    pub square_feet: Option<u32>,
    #[serde(default)]
    pub construction_type: Option<String>,
    #[serde(default)]
    pub protection_class: Option<String>,
    #[serde(default)]
    pub dwelling_replacement_cost: Option<Decimal>,
    #[serde(default)]
    pub mortgagees: Vec<Mortgagee>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mortgagee {
    pub name: String,
    #[serde(default)]
    pub loan_number: Option<String>,
}

/// Case-insensitive code key: trimmed, lower-cased, inner whitespace collapsed.
pub fn normalize_code(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{normalize_code, Vehicle};

    #[test]
    fn partial_vins_do_not_count_as_identity() {
        let vehicle = Vehicle { vin: Some("1FTFW1E5".to_string()), ..Vehicle::default() };
        assert_eq!(vehicle.normalized_vin(), None);

        let vehicle =
            Vehicle { vin: Some(" 1ftfw1e50mfa12345 ".to_string()), ..Vehicle::default() };
        assert_eq!(vehicle.normalized_vin().as_deref(), Some("1FTFW1E50MFA12345"));
    }

    #[test]
    fn label_skips_missing_parts() {
        let vehicle = Vehicle {
            year: Some(2021),
            make: Some("Ford".to_string()),
            model: None,
            ..Vehicle::default()
        };
        assert_eq!(vehicle.label(), "2021 Ford");
        assert_eq!(Vehicle::default().label(), "Unknown vehicle");
    }

    #[test]
    fn codes_compare_case_insensitively() {
        assert_eq!(normalize_code("  Multi  Car "), normalize_code("MULTI car"));
    }
}
