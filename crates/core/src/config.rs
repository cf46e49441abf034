use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::DomainError;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Tunables for one comparison run. `now` is injected via [`crate::clock::Clock`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub claim_surcharge_years: u32,
    pub premium_bands: PremiumBandThresholds,
    /// Field names whose changes are recorded as `unchanged`.
    pub non_material_fields: BTreeSet<String>,
    /// Extra or replacement coverage labels layered over the built-in catalog.
    pub coverage_labels: BTreeMap<String, String>,
}

/// Percent thresholds for premium banding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumBandThresholds {
    /// Above this a premium change is at least informational.
    pub info: Decimal,
    /// At or above this the change is a warning.
    pub warning: Decimal,
    /// Above this the change is critical.
    pub critical: Decimal,
}

impl Default for PremiumBandThresholds {
    fn default() -> Self {
        Self { info: Decimal::ZERO, warning: Decimal::new(5, 0), critical: Decimal::new(15, 0) }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            claim_surcharge_years: 3,
            premium_bands: PremiumBandThresholds::default(),
            non_material_fields: ["annual_mileage", "description"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            coverage_labels: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.claim_surcharge_years == 0 {
            return Err(DomainError::InvalidSurchargeWindow { years: self.claim_surcharge_years });
        }

        let bands = self.premium_bands;
        if bands.info > bands.warning || bands.warning > bands.critical {
            return Err(DomainError::InvalidBandThresholds {
                info: bands.info,
                warning: bands.warning,
                critical: bands.critical,
            });
        }

        Ok(())
    }

    pub fn is_non_material(&self, field: &str) -> bool {
        self.non_material_fields.contains(field)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub claim_surcharge_years: Option<u32>,
    pub premium_bands: Option<PremiumBandThresholds>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl From<DomainError> for ConfigError {
    fn from(value: DomainError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("renewal.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(engine) = patch.engine {
            if let Some(years) = engine.claim_surcharge_years {
                self.engine.claim_surcharge_years = years;
            }
            if let Some(bands) = engine.premium_bands {
                if let Some(info) = bands.info {
                    self.engine.premium_bands.info = info;
                }
                if let Some(warning) = bands.warning {
                    self.engine.premium_bands.warning = warning;
                }
                if let Some(critical) = bands.critical {
                    self.engine.premium_bands.critical = critical;
                }
            }
            if let Some(fields) = engine.non_material_fields {
                self.engine.non_material_fields = fields.into_iter().collect();
            }
            if let Some(labels) = engine.coverage_labels {
                self.engine.coverage_labels.extend(labels);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RENEWAL_CLAIM_SURCHARGE_YEARS") {
            self.engine.claim_surcharge_years = parse_u32("RENEWAL_CLAIM_SURCHARGE_YEARS", &value)?;
        }
        if let Some(value) = read_env("RENEWAL_PREMIUM_BAND_INFO") {
            self.engine.premium_bands.info = parse_decimal("RENEWAL_PREMIUM_BAND_INFO", &value)?;
        }
        if let Some(value) = read_env("RENEWAL_PREMIUM_BAND_WARNING") {
            self.engine.premium_bands.warning =
                parse_decimal("RENEWAL_PREMIUM_BAND_WARNING", &value)?;
        }
        if let Some(value) = read_env("RENEWAL_PREMIUM_BAND_CRITICAL") {
            self.engine.premium_bands.critical =
                parse_decimal("RENEWAL_PREMIUM_BAND_CRITICAL", &value)?;
        }
        if let Some(value) = read_env("RENEWAL_NON_MATERIAL_FIELDS") {
            self.engine.non_material_fields = value
                .split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .map(str::to_string)
                .collect();
        }

        let log_level = read_env("RENEWAL_LOGGING_LEVEL").or_else(|| read_env("RENEWAL_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("RENEWAL_LOGGING_FORMAT").or_else(|| read_env("RENEWAL_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(years) = overrides.claim_surcharge_years {
            self.engine.claim_surcharge_years = years;
        }
        if let Some(bands) = overrides.premium_bands {
            self.engine.premium_bands = bands;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("renewal.toml"), PathBuf::from("config/renewal.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    engine: Option<EnginePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    claim_surcharge_years: Option<u32>,
    premium_bands: Option<PremiumBandsPatch>,
    non_material_fields: Option<Vec<String>>,
    coverage_labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct PremiumBandsPatch {
    info: Option<Decimal>,
    warning: Option<Decimal>,
    critical: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, EngineConfig, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ENV_VARS: [&str; 9] = [
        "RENEWAL_CLAIM_SURCHARGE_YEARS",
        "RENEWAL_PREMIUM_BAND_INFO",
        "RENEWAL_PREMIUM_BAND_WARNING",
        "RENEWAL_PREMIUM_BAND_CRITICAL",
        "RENEWAL_NON_MATERIAL_FIELDS",
        "RENEWAL_LOGGING_LEVEL",
        "RENEWAL_LOG_LEVEL",
        "RENEWAL_LOGGING_FORMAT",
        "RENEWAL_LOG_FORMAT",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_match_documented_policy() {
        let config = EngineConfig::default();
        assert_eq!(config.claim_surcharge_years, 3);
        assert_eq!(config.premium_bands.info, Decimal::ZERO);
        assert_eq!(config.premium_bands.warning, Decimal::new(5, 0));
        assert_eq!(config.premium_bands.critical, Decimal::new(15, 0));
        assert!(config.is_non_material("annual_mileage"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_VARS);
        env::set_var("TEST_RENEWAL_WINDOW", "5");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("renewal.toml");
            fs::write(
                &path,
                r#"
[engine]
claim_surcharge_years = ${TEST_RENEWAL_WINDOW}
non_material_fields = ["lienholder"]

[engine.premium_bands]
warning = "7.5"

[engine.coverage_labels]
gap = "Loan/Lease Gap"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.engine.claim_surcharge_years == 5, "window should come from env")?;
            ensure(
                config.engine.premium_bands.warning == Decimal::new(75, 1),
                "warning band should be read from file",
            )?;
            ensure(
                config.engine.premium_bands.critical == Decimal::new(15, 0),
                "unset band should keep its default",
            )?;
            ensure(
                config.engine.is_non_material("lienholder")
                    && !config.engine.is_non_material("annual_mileage"),
                "file list should replace non-material defaults",
            )?;
            ensure(
                config.engine.coverage_labels.get("gap").map(String::as_str)
                    == Some("Loan/Lease Gap"),
                "coverage labels should be loaded",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_RENEWAL_WINDOW"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_VARS);
        env::set_var("RENEWAL_CLAIM_SURCHARGE_YEARS", "4");
        env::set_var("RENEWAL_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("renewal.toml");
            fs::write(
                &path,
                r#"
[engine]
claim_surcharge_years = 2

[logging]
level = "warn"
format = "pretty"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.engine.claim_surcharge_years == 4, "env should win over file")?;
            ensure(config.logging.level == "debug", "override should win over file")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "env log format alias should win over file",
            )?;
            Ok(())
        })();

        clear_vars(&ENV_VARS);
        result
    }

    #[test]
    fn zero_year_window_fails_fast() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_VARS);
        env::set_var("RENEWAL_CLAIM_SURCHARGE_YEARS", "0");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("surcharge window")
            );
            ensure(has_message, "validation failure should mention the surcharge window")
        })();

        clear_vars(&ENV_VARS);
        result
    }

    #[test]
    fn negative_window_is_an_invalid_override() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&ENV_VARS);
        env::set_var("RENEWAL_CLAIM_SURCHARGE_YEARS", "-3");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. })
                if key == "RENEWAL_CLAIM_SURCHARGE_YEARS" =>
            {
                Ok(())
            }
            other => Err(format!("expected invalid override, got {other:?}")),
        };

        clear_vars(&ENV_VARS);
        result
    }

    #[test]
    fn unordered_bands_are_rejected() {
        let mut config = EngineConfig::default();
        config.premium_bands.warning = Decimal::new(20, 0);

        let error = AppConfig { engine: config, ..AppConfig::default() }
            .validate()
            .expect_err("warning above critical should fail");
        assert!(matches!(error, ConfigError::Validation(ref message) if message.contains("info <= warning <= critical")));
    }

    #[test]
    fn missing_required_file_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("absent.toml");
        let error = AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        })
        .expect_err("missing file should fail");

        assert!(matches!(error, ConfigError::MissingConfigFile(ref missing) if *missing == path));
    }
}
