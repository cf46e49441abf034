use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::change::ChangeCategory;
use crate::domain::snapshot::normalize_code;

const DEFAULT_LABELS: [(&str, &str); 22] = [
    ("bodily_injury", "Bodily Injury"),
    ("property_damage", "Property Damage"),
    ("combined_single_limit", "Combined Single Limit"),
    ("uninsured_motorist", "Uninsured Motorist"),
    ("underinsured_motorist", "Underinsured Motorist"),
    ("uninsured_motorist_pd", "Uninsured Motorist Property Damage"),
    ("medical_payments", "Medical Payments"),
    ("personal_injury_protection", "Personal Injury Protection"),
    ("collision", "Collision"),
    ("comprehensive", "Comprehensive"),
    ("rental_reimbursement", "Rental Reimbursement"),
    ("towing", "Towing & Labor"),
    ("gap", "Loan/Lease Gap"),
    ("dwelling", "Dwelling"),
    ("other_structures", "Other Structures"),
    ("personal_property", "Personal Property"),
    ("loss_of_use", "Loss of Use"),
    ("personal_liability", "Personal Liability"),
    ("medical_payments_to_others", "Medical Payments to Others"),
    ("water_backup", "Water Backup"),
    ("wind_hail", "Wind/Hail"),
    ("all_perils", "All Other Perils"),
];

/// Injectable lookup tables for labels and category ordering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCatalog {
    labels: BTreeMap<String, String>,
    category_order: BTreeMap<ChangeCategory, u32>,
}

impl Default for CoverageCatalog {
    fn default() -> Self {
        let labels = DEFAULT_LABELS
            .iter()
            .map(|(code, label)| ((*code).to_string(), (*label).to_string()))
            .collect();
        let category_order = ChangeCategory::ALL
            .iter()
            .enumerate()
            .map(|(index, category)| (*category, index as u32))
            .collect();

        Self { labels, category_order }
    }
}

impl CoverageCatalog {
    pub fn new(
        labels: BTreeMap<String, String>,
        category_order: BTreeMap<ChangeCategory, u32>,
    ) -> Self {
        let labels = labels.into_iter().map(|(code, label)| (normalize_code(&code), label)).collect();
        Self { labels, category_order }
    }

    pub fn with_labels(mut self, labels: &BTreeMap<String, String>) -> Self {
        for (code, label) in labels {
            self.labels.insert(normalize_code(code), label.clone());
        }
        self
    }

    /// Label for a coverage code; unknown codes are title-cased.
    pub fn label(&self, coverage_type: &str) -> String {
        let key = normalize_code(coverage_type);
        if let Some(label) = self.labels.get(&key) {
            return label.clone();
        }

        title_case(&key)
    }

    /// Sort rank for a category. Unlisted categories sort last.
    pub fn category_rank(&self, category: ChangeCategory) -> u32 {
        self.category_order.get(&category).copied().unwrap_or(u32::MAX)
    }
}

fn title_case(code: &str) -> String {
    code.split(|ch: char| ch == '_' || ch == '-' || ch.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::CoverageCatalog;
    use crate::domain::change::ChangeCategory;

    #[test]
    fn known_codes_use_catalog_labels() {
        let catalog = CoverageCatalog::default();
        assert_eq!(catalog.label("BODILY_INJURY"), "Bodily Injury");
        assert_eq!(catalog.label("towing"), "Towing & Labor");
    }

    #[test]
    fn unknown_codes_fall_back_to_title_case() {
        let catalog = CoverageCatalog::default();
        assert_eq!(catalog.label("pet_injury"), "Pet Injury");
        assert_eq!(catalog.label("identity-theft"), "Identity Theft");
    }

    #[test]
    fn injected_order_overrides_default_rank() {
        let mut order = BTreeMap::new();
        order.insert(ChangeCategory::Claim, 0);
        order.insert(ChangeCategory::Premium, 1);
        let catalog = CoverageCatalog::new(BTreeMap::new(), order);

        assert!(catalog.category_rank(ChangeCategory::Claim)
            < catalog.category_rank(ChangeCategory::Premium));
        assert_eq!(catalog.category_rank(ChangeCategory::Other), u32::MAX);
        assert_eq!(catalog.label("collision"), "Collision");
    }

    #[test]
    fn extra_labels_replace_defaults() {
        let mut labels = BTreeMap::new();
        labels.insert("Collision".to_string(), "Collision (ACV)".to_string());
        let catalog = CoverageCatalog::default().with_labels(&labels);
        assert_eq!(catalog.label("collision"), "Collision (ACV)");
    }
}
