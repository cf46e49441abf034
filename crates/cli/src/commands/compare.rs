use std::path::PathBuf;

use renewal_core::clock::FixedClock;
use renewal_core::config::AppConfig;
use renewal_core::domain::check::CheckResult;
use renewal_core::domain::snapshot::PolicySnapshot;
use renewal_core::errors::ApplicationError;
use renewal_core::RenewalComparisonEngine;

use crate::commands::{parse_timestamp, read_json, CommandResult};

const COMMAND: &str = "compare";

#[derive(Debug, Clone)]
pub struct CompareInput {
    pub baseline: PathBuf,
    pub renewal: PathBuf,
    pub checks: Option<PathBuf>,
    /// RFC 3339; the current time when absent.
    pub now: Option<String>,
}

pub fn run(input: &CompareInput, config: &AppConfig) -> CommandResult {
    let baseline: PolicySnapshot = match read_json("baseline snapshot", &input.baseline) {
        Ok(snapshot) => snapshot,
        Err(error) => return CommandResult::from_application(COMMAND, "input_parse", error),
    };
    let renewal: PolicySnapshot = match read_json("renewal snapshot", &input.renewal) {
        Ok(snapshot) => snapshot,
        Err(error) => return CommandResult::from_application(COMMAND, "input_parse", error),
    };
    let checks: Option<Vec<CheckResult>> = match &input.checks {
        Some(path) => match read_json("check results", path) {
            Ok(results) => Some(results),
            Err(error) => return CommandResult::from_application(COMMAND, "input_parse", error),
        },
        None => None,
    };

    let engine = match RenewalComparisonEngine::new(config.engine.clone()) {
        Ok(engine) => engine,
        Err(error) => {
            return CommandResult::from_application(
                COMMAND,
                "config_validation",
                ApplicationError::from(error),
            )
        }
    };

    let report = match input.now.as_deref() {
        Some(raw) => match parse_timestamp("--now", raw) {
            Ok(now) => engine.with_clock(FixedClock(now)).compare(&baseline, &renewal, checks.as_deref()),
            Err(error) => return CommandResult::from_application(COMMAND, "argument_parse", error),
        },
        None => engine.compare(&baseline, &renewal, checks.as_deref()),
    };

    CommandResult::data(COMMAND, &report)
}
