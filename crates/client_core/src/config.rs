use std::{fs, time::Duration};

use tracing::warn;
use url::Url;

use crate::{error::ConfigError, form::ValidationMode};

pub const CONFIG_FILE: &str = "assessment.toml";

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_SESSION_DATABASE_URL: &str = "sqlite://./data/session.db";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    /// `None` waits for the service indefinitely.
    pub request_timeout: Option<Duration>,
    pub validation_mode: ValidationMode,
    pub session_database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            validation_mode: ValidationMode::Lenient,
            session_database_url: DEFAULT_SESSION_DATABASE_URL.into(),
        }
    }
}

/// Defaults, then `assessment.toml` in the working directory, then the environment.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let file = fs::read_to_string(CONFIG_FILE).ok();
    resolve_settings(file.as_deref(), |name| std::env::var(name).ok())
}

pub(crate) fn resolve_settings(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<toml::Table>(raw) {
            Ok(table) => {
                let lookup = |key: &str| table.get(key).map(toml_value_to_string);
                apply(&mut settings, "api_base_url", lookup("api_base_url"));
                apply(&mut settings, "request_timeout_secs", lookup("request_timeout_secs"));
                apply(&mut settings, "validation_mode", lookup("validation_mode"));
                apply(&mut settings, "session_database_url", lookup("session_database_url"));
            }
            Err(err) => warn!(file = CONFIG_FILE, error = %err, "ignoring unreadable config file"),
        }
    }

    for (var, key) in [
        ("API_BASE_URL", "api_base_url"),
        ("APP__API_BASE_URL", "api_base_url"),
        ("APP__REQUEST_TIMEOUT_SECS", "request_timeout_secs"),
        ("APP__VALIDATION_MODE", "validation_mode"),
        ("SESSION_DATABASE_URL", "session_database_url"),
        ("APP__SESSION_DATABASE_URL", "session_database_url"),
    ] {
        apply(&mut settings, key, env(var));
    }

    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    Ok(settings)
}

fn apply(settings: &mut Settings, key: &str, value: Option<String>) {
    let Some(value) = value else {
        return;
    };

    match key {
        "api_base_url" => settings.api_base_url = value,
        "session_database_url" => settings.session_database_url = value,
        "request_timeout_secs" => match value.trim().parse::<u64>() {
            Ok(0) => settings.request_timeout = None,
            Ok(secs) => settings.request_timeout = Some(Duration::from_secs(secs)),
            Err(_) => warn!(value, "ignoring non-numeric request timeout"),
        },
        "validation_mode" => {
            if value.eq_ignore_ascii_case("strict") {
                settings.validation_mode = ValidationMode::Strict;
            } else if value.eq_ignore_ascii_case("lenient") {
                settings.validation_mode = ValidationMode::Lenient;
            } else {
                warn!(value, "ignoring unknown validation mode");
            }
        }
        _ => {}
    }
}

fn toml_value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Trims whitespace and trailing slashes so endpoint paths can be appended directly.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');

    let parsed = Url::parse(trimmed).map_err(|source| ConfigError::InvalidBaseUrl {
        raw: raw.to_string(),
        source,
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            scheme: parsed.scheme().to_string(),
        });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
