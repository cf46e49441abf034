use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use renewal_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run(explicit_path: Option<&Path>) -> String {
    let options = LoadOptions {
        config_path: explicit_path.map(Path::to_path_buf),
        require_file: explicit_path.is_some(),
        ..LoadOptions::default()
    };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(explicit_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let engine = &config.engine;
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "engine.claim_surcharge_years",
        &engine.claim_surcharge_years.to_string(),
        source("engine.claim_surcharge_years", &["RENEWAL_CLAIM_SURCHARGE_YEARS"]),
    ));
    lines.push(render_line(
        "engine.premium_bands.info",
        &engine.premium_bands.info.to_string(),
        source("engine.premium_bands.info", &["RENEWAL_PREMIUM_BAND_INFO"]),
    ));
    lines.push(render_line(
        "engine.premium_bands.warning",
        &engine.premium_bands.warning.to_string(),
        source("engine.premium_bands.warning", &["RENEWAL_PREMIUM_BAND_WARNING"]),
    ));
    lines.push(render_line(
        "engine.premium_bands.critical",
        &engine.premium_bands.critical.to_string(),
        source("engine.premium_bands.critical", &["RENEWAL_PREMIUM_BAND_CRITICAL"]),
    ));

    let non_material = engine.non_material_fields.iter().cloned().collect::<Vec<_>>().join(",");
    lines.push(render_line(
        "engine.non_material_fields",
        if non_material.is_empty() { "<none>" } else { &non_material },
        source("engine.non_material_fields", &["RENEWAL_NON_MATERIAL_FIELDS"]),
    ));
    lines.push(render_line(
        "engine.coverage_labels",
        &format!("{} custom", engine.coverage_labels.len()),
        source("engine.coverage_labels", &[]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["RENEWAL_LOGGING_LEVEL", "RENEWAL_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["RENEWAL_LOGGING_FORMAT", "RENEWAL_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn detect_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("renewal.toml"), PathBuf::from("config/renewal.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
