//! Agent acknowledgment of detected changes and the approval gate.
//!
//! These functions never mutate their input. A toggle returns a new result
//! set; persisting it (and rejecting stale writes) is the caller's job.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::change::{ChangeCategory, MaterialChange, Severity};
use crate::domain::check::CheckResult;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub rule_id: String,
    pub field: String,
    pub reviewed: bool,
    pub reviewer_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    Updated { result: CheckResult, results: Vec<CheckResult> },
    NotFound { rule_id: String, field: String },
}

/// Sets the reviewed triple on the `(rule_id, field)` result.
///
/// Marking reviewed stamps reviewer and time; clearing resets both to `None`.
/// Re-applying the current state returns the record unchanged.
pub fn toggle_review(
    results: &[CheckResult],
    request: &ToggleRequest,
    at: DateTime<Utc>,
) -> ToggleOutcome {
    let Some(index) = results.iter().position(|result| result.matches(&request.rule_id, &request.field))
    else {
        debug!(
            event_name = "renewal.review.not_found",
            rule_id = %request.rule_id,
            field = %request.field,
            "review toggle target not found"
        );
        return ToggleOutcome::NotFound {
            rule_id: request.rule_id.clone(),
            field: request.field.clone(),
        };
    };

    let mut results = results.to_vec();
    let target = &mut results[index];
    if target.reviewed != request.reviewed {
        target.reviewed = request.reviewed;
        if request.reviewed {
            target.reviewed_by = Some(request.reviewer_id.clone());
            target.reviewed_at = Some(at);
        } else {
            target.reviewed_by = None;
            target.reviewed_at = None;
        }
    }

    debug!(
        event_name = "renewal.review.toggled",
        rule_id = %request.rule_id,
        field = %request.field,
        reviewed = request.reviewed,
        "review state updated"
    );

    let result = results[index].clone();
    ToggleOutcome::Updated { result, results }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewProgress {
    pub reviewed_count: usize,
    pub total_reviewable: usize,
    /// 0..=100, two decimals; 100 when nothing is reviewable.
    pub progress_percent: Decimal,
}

impl ReviewProgress {
    pub fn is_complete(&self) -> bool {
        self.reviewed_count >= self.total_reviewable
    }
}

pub fn compute_progress(results: &[CheckResult]) -> ReviewProgress {
    let reviewable = results.iter().filter(|result| result.is_reviewable());
    let total_reviewable = reviewable.clone().count();
    let reviewed_count = reviewable.filter(|result| result.reviewed).count();

    let progress_percent = if total_reviewable == 0 {
        Decimal::ONE_HUNDRED
    } else {
        (Decimal::from(reviewed_count) * Decimal::ONE_HUNDRED / Decimal::from(total_reviewable))
            .round_dp_with_strategy(2, RoundingStrategy::ToZero)
    };

    ReviewProgress { reviewed_count, total_reviewable, progress_percent }
}

/// Approval gate.
///
/// With reviewable results, every one must be reviewed. With none, approval
/// is allowed only when no material change exists either, so a material
/// change that produced no rule hit cannot slip through.
pub fn can_approve(results: &[CheckResult], material_change_count: usize) -> bool {
    let progress = compute_progress(results);
    if progress.total_reviewable > 0 {
        progress.is_complete()
    } else {
        material_change_count == 0
    }
}

/// Reviewable results for changes that arrived without rule evaluations.
/// `unchanged` changes are skipped.
pub fn derive_check_results(changes: &[MaterialChange]) -> Vec<CheckResult> {
    changes
        .iter()
        .filter(|change| change.is_material())
        .map(|change| CheckResult {
            rule_id: change.category.as_str().to_string(),
            field: change.field_path.clone(),
            category: change.category,
            severity: change.severity,
            change_description: change.description.clone(),
            suggested_action: suggested_action(change.category, change.severity)
                .map(str::to_string),
            reviewed: false,
            reviewed_by: None,
            reviewed_at: None,
        })
        .collect()
}

fn suggested_action(category: ChangeCategory, severity: Severity) -> Option<&'static str> {
    let action = match category {
        ChangeCategory::Premium => match severity {
            Severity::Critical => "Remarket the policy and call the insured before renewal",
            Severity::Warning => "Explain the increase to the insured and review discounts",
            _ => return None,
        },
        ChangeCategory::CoverageLimit | ChangeCategory::Deductible => match severity {
            Severity::MaterialNegative => "Confirm the insured accepted the reduced protection",
            _ => return None,
        },
        ChangeCategory::CoverageRemoved => "Confirm the coverage removal was requested",
        ChangeCategory::CoverageAdded => "Confirm the insured wants the added coverage",
        ChangeCategory::VehicleRemoved | ChangeCategory::VehicleAdded => {
            "Verify the vehicle schedule with the insured"
        }
        ChangeCategory::DriverRemoved | ChangeCategory::DriverAdded => {
            "Verify household drivers with the insured"
        }
        ChangeCategory::DiscountRemoved => "Check whether the discount can be restored",
        ChangeCategory::EndorsementRemoved => "Confirm the endorsement removal was intended",
        ChangeCategory::Claim => "Review claim history for rating impact",
        ChangeCategory::MortgageeAdded | ChangeCategory::MortgageeRemoved => {
            "Verify mortgagee details against the lender's records"
        }
        ChangeCategory::Endorsement
        | ChangeCategory::EndorsementAdded
        | ChangeCategory::DiscountAdded
        | ChangeCategory::Property
        | ChangeCategory::Other => return None,
    };
    Some(action)
}
