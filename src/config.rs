//! Configuration types.

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Default location of the trained model artifact.
pub const DEFAULT_MODEL_PATH: &str = "models/scam_nb.json";

/// Minimum submission length, in characters after trimming.
pub const DEFAULT_MIN_CHARS: usize = 10;

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path the model artifact is loaded from at startup.
    pub model_path: PathBuf,
    /// Submissions shorter than this are rejected before prediction.
    pub min_chars: usize,
    /// Serve the keyword classifier when the artifact is missing instead of
    /// refusing to start.
    pub allow_fallback: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            min_chars: DEFAULT_MIN_CHARS,
            allow_fallback: false,
        }
    }
}

impl ServerConfig {
    /// Build from `SCAM_CLASSIFIER_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any `SCAM_CLASSIFIER_*` key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let host = lookup("SCAM_CLASSIFIER_HOST").unwrap_or(defaults.host);

        let port = match lookup("SCAM_CLASSIFIER_PORT") {
            Some(raw) => parse_value("SCAM_CLASSIFIER_PORT", &raw)?,
            None => defaults.port,
        };

        let model_path = lookup("SCAM_CLASSIFIER_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let min_chars = match lookup("SCAM_CLASSIFIER_MIN_CHARS") {
            Some(raw) => parse_value("SCAM_CLASSIFIER_MIN_CHARS", &raw)?,
            None => defaults.min_chars,
        };

        let allow_fallback = match lookup("SCAM_CLASSIFIER_ALLOW_FALLBACK") {
            Some(raw) => parse_flag("SCAM_CLASSIFIER_ALLOW_FALLBACK", &raw)?,
            None => defaults.allow_fallback,
        };

        let config = Self {
            host,
            port,
            model_path,
            min_chars,
            allow_fallback,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "host".into(),
                message: "must not be empty".into(),
            });
        }
        if self.min_chars == 0 {
            return Err(ConfigError::InvalidValue {
                key: "min_chars".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// `host:port` for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> std::result::Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        })
}

fn parse_flag(key: &str, raw: &str) -> std::result::Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?} is not a boolean"),
        }),
    }
}
