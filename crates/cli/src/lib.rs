pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use renewal_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "renewal",
    about = "Renewal comparison operator CLI",
    long_about = "Compare baseline and renewal policy snapshots, track review of detected changes, and inspect configuration.",
    after_help = "Examples:\n  renewal compare --baseline current.json --renewal renewal.json\n  renewal review --checks checks.json --rule-id premium --field premium --reviewer agent-7\n  renewal progress --checks checks.json\n  renewal config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a renewal.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Compare two policy snapshots and print the comparison report")]
    Compare {
        #[arg(long, help = "Baseline (current term) snapshot JSON file")]
        baseline: PathBuf,
        #[arg(long, help = "Renewal term snapshot JSON file")]
        renewal: PathBuf,
        #[arg(long, help = "Existing check results JSON file with review state")]
        checks: Option<PathBuf>,
        #[arg(long, help = "Evaluation time as RFC 3339, defaults to the current time")]
        now: Option<String>,
    },
    #[command(about = "Mark a check result reviewed (or unreviewed) and print the updated set")]
    Review {
        #[arg(long, help = "Check results JSON file")]
        checks: PathBuf,
        #[arg(long)]
        rule_id: String,
        #[arg(long)]
        field: String,
        #[arg(long, help = "Reviewer identity recorded on the result")]
        reviewer: String,
        #[arg(long, help = "Clear the reviewed flag instead of setting it")]
        unreviewed: bool,
        #[arg(long, help = "Review time as RFC 3339, defaults to the current time")]
        at: Option<String>,
    },
    #[command(about = "Report review progress and whether approval is allowed")]
    Progress {
        #[arg(long, help = "Check results JSON file")]
        checks: PathBuf,
        #[arg(long, help = "Material change count for the approval gate")]
        material_changes: Option<usize>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config.clone(),
        ..LoadOptions::default()
    };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            let result = CommandResult::failure("startup", "config_validation", error.to_string(), 2);
            println!("{}", result.output);
            return ExitCode::from(result.exit_code);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Compare { baseline, renewal, checks, now } => commands::compare::run(
            &commands::compare::CompareInput { baseline, renewal, checks, now },
            &config,
        ),
        Command::Review { checks, rule_id, field, reviewer, unreviewed, at } => {
            commands::review::run(&commands::review::ReviewInput {
                checks,
                rule_id,
                field,
                reviewer,
                reviewed: !unreviewed,
                at,
            })
        }
        Command::Progress { checks, material_changes } => {
            commands::progress::run(&checks, material_changes)
        }
        Command::Config => CommandResult {
            exit_code: 0,
            output: commands::config::run(cli.config.as_deref()),
        },
    };

    debug!(event_name = "renewal.cli.completed", exit_code = result.exit_code, "command finished");
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays a single JSON payload.
fn init_logging(config: &AppConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(log_filter(config))
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn log_filter(config: &AppConfig) -> EnvFilter {
    EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use renewal_core::config::AppConfig;

    use super::log_filter;

    #[test]
    fn log_filter_follows_configured_level() {
        let mut config = AppConfig::default();
        config.logging.level = "debug".to_string();

        assert_eq!(log_filter(&config).to_string(), "debug");
    }

    #[test]
    fn unparseable_level_falls_back_to_info() {
        let mut config = AppConfig::default();
        config.logging.level = "renewal=verbose".to_string();

        assert_eq!(log_filter(&config).to_string(), "info");
    }
}
