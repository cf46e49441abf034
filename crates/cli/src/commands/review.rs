use std::path::PathBuf;

use renewal_core::clock::{Clock, SystemClock};
use renewal_core::domain::check::CheckResult;
use renewal_core::review::{compute_progress, toggle_review, ReviewProgress, ToggleOutcome, ToggleRequest};
use serde::Serialize;

use crate::commands::{parse_timestamp, read_json, CommandResult};

const COMMAND: &str = "review";

#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub checks: PathBuf,
    pub rule_id: String,
    pub field: String,
    pub reviewer: String,
    pub reviewed: bool,
    /// RFC 3339; the current time when absent.
    pub at: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReviewOutput<'a> {
    #[serde(flatten)]
    outcome: &'a ToggleOutcome,
    progress: ReviewProgress,
}

/// An unknown `(rule_id, field)` is reported as `not_found` with exit code 0;
/// the input set is left as it was.
pub fn run(input: &ReviewInput) -> CommandResult {
    let results: Vec<CheckResult> = match read_json("check results", &input.checks) {
        Ok(results) => results,
        Err(error) => return CommandResult::from_application(COMMAND, "input_parse", error),
    };

    let at = match input.at.as_deref() {
        Some(raw) => match parse_timestamp("--at", raw) {
            Ok(at) => at,
            Err(error) => return CommandResult::from_application(COMMAND, "argument_parse", error),
        },
        None => SystemClock.now(),
    };

    let request = ToggleRequest {
        rule_id: input.rule_id.clone(),
        field: input.field.clone(),
        reviewed: input.reviewed,
        reviewer_id: input.reviewer.clone(),
    };
    let outcome = toggle_review(&results, &request, at);
    let progress = match &outcome {
        ToggleOutcome::Updated { results, .. } => compute_progress(results),
        ToggleOutcome::NotFound { .. } => compute_progress(&results),
    };

    CommandResult::data(COMMAND, &ReviewOutput { outcome: &outcome, progress })
}
