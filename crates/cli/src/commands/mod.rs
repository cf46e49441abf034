pub mod compare;
pub mod config;
pub mod progress;
pub mod review;

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use renewal_core::errors::ApplicationError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Exit codes shared by every command.
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_SERIALIZATION: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
struct DataOutcome<'a, T: Serialize> {
    command: &'a str,
    status: &'a str,
    data: &'a T,
}

impl CommandResult {
    /// Pretty JSON envelope around a structured result.
    pub fn data<T: Serialize>(command: &str, data: &T) -> Self {
        let payload = DataOutcome { command, status: "ok", data };
        match serde_json::to_string_pretty(&payload) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => {
                Self::failure(command, "serialization", error.to_string(), EXIT_SERIALIZATION)
            }
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure carrying the interface-safe message plus the detail.
    pub fn from_application(command: &str, error_class: &str, error: ApplicationError) -> Self {
        let exit_code = match error {
            ApplicationError::Input(_) => EXIT_INPUT,
            ApplicationError::Domain(_) | ApplicationError::Configuration(_) => EXIT_CONFIG,
        };
        let interface = error.into_interface(command);
        let message = format!("{} ({interface})", interface.user_message());
        Self::failure(command, error_class, message, exit_code)
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(label: &str, path: &Path) -> Result<T, ApplicationError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ApplicationError::Input(format!("could not read {label} `{}`: {error}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        ApplicationError::Input(format!("invalid {label} json in `{}`: {error}", path.display()))
    })
}

pub(crate) fn parse_timestamp(label: &str, raw: &str) -> Result<DateTime<Utc>, ApplicationError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| {
            ApplicationError::Input(format!("invalid {label} `{raw}` (expected RFC 3339): {error}"))
        })
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
