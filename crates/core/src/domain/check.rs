use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::change::{ChangeCategory, Severity};

/// One rule-evaluation hit. Only the reviewed triple ever changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub rule_id: String,
    pub field: String,
    pub category: ChangeCategory,
    pub severity: Severity,
    pub change_description: String,
    #[serde(default)]
    pub suggested_action: Option<String>,
    #[serde(default)]
    pub reviewed: bool,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl CheckResult {
    pub fn is_reviewable(&self) -> bool {
        self.severity.is_material()
    }

    pub fn matches(&self, rule_id: &str, field: &str) -> bool {
        self.rule_id == rule_id && self.field == field
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub counts: BTreeMap<Severity, usize>,
    pub halted: bool,
    pub blocking_rule_ids: Vec<String>,
}

impl CheckSummary {
    /// Unreviewed critical results block the run.
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut counts = BTreeMap::new();
        let mut blocking_rule_ids = Vec::new();

        for result in results {
            *counts.entry(result.severity).or_insert(0) += 1;
            if result.severity == Severity::Critical
                && !result.reviewed
                && !blocking_rule_ids.contains(&result.rule_id)
            {
                blocking_rule_ids.push(result.rule_id.clone());
            }
        }

        Self { counts, halted: !blocking_rule_ids.is_empty(), blocking_rule_ids }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.counts.get(&severity).copied().unwrap_or(0)
    }
}
