use std::path::Path;

use renewal_core::domain::check::{CheckResult, CheckSummary};
use renewal_core::review::{can_approve, compute_progress, ReviewProgress};
use serde::Serialize;

use crate::commands::{read_json, CommandResult};

const COMMAND: &str = "progress";

#[derive(Debug, Serialize)]
struct ProgressOutput {
    progress: ReviewProgress,
    material_change_count: usize,
    can_approve: bool,
    summary: CheckSummary,
}

/// Without an explicit count, every reviewable result stands for one material
/// change.
pub fn run(checks: &Path, material_changes: Option<usize>) -> CommandResult {
    let results: Vec<CheckResult> = match read_json("check results", checks) {
        Ok(results) => results,
        Err(error) => return CommandResult::from_application(COMMAND, "input_parse", error),
    };

    let progress = compute_progress(&results);
    let material_change_count = material_changes.unwrap_or(progress.total_reviewable);

    CommandResult::data(
        COMMAND,
        &ProgressOutput {
            progress,
            material_change_count,
            can_approve: can_approve(&results, material_change_count),
            summary: CheckSummary::from_results(&results),
        },
    )
}
