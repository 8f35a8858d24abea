//! Engine settings loaded from the environment or any serde source.

use evstage_core::EngineConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable holding the engine name.
pub const ENV_NAME: &str = "EVSTAGE_NAME";
/// Environment variable holding the maximum queue size (`0` = unbounded).
pub const ENV_QUEUE_SIZE: &str = "EVSTAGE_QUEUE_SIZE";
/// Environment variable toggling diagnostics.
pub const ENV_ENABLE_LOGGING: &str = "EVSTAGE_ENABLE_LOGGING";
/// Environment variable holding the health high-water fraction.
pub const ENV_HEALTH_THRESHOLD: &str = "EVSTAGE_HEALTH_THRESHOLD";

/// Errors raised while loading [`Settings`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// A value could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    Invalid {
        /// The offending key.
        key: &'static str,
        /// The raw value.
        value: String,
    },

    /// The health threshold is outside `(0, 1]`.
    #[error("health threshold must be in (0, 1], got {0}")]
    ThresholdOutOfRange(f64),
}

/// Serializable engine settings.
///
/// Missing fields take their defaults, so a partial TOML/JSON document or a
/// partially populated environment is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Engine name.
    pub name: String,
    /// Maximum queue size, `0` for unbounded.
    pub max_queue_size: usize,
    /// Whether diagnostics reach the log sink.
    pub enable_logging: bool,
    /// Fraction of capacity above which the queue reports unhealthy.
    pub health_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: "evstage".to_string(),
            max_queue_size: 10_000,
            enable_logging: true,
            health_threshold: 0.9,
        }
    }
}

impl Settings {
    /// Load settings from `EVSTAGE_*` environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup, starting from the
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Some(name) = lookup(ENV_NAME) {
            settings.name = name;
        }
        if let Some(raw) = lookup(ENV_QUEUE_SIZE) {
            settings.max_queue_size = parse(ENV_QUEUE_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ENABLE_LOGGING) {
            settings.enable_logging = parse_flag(ENV_ENABLE_LOGGING, &raw)?;
        }
        if let Some(raw) = lookup(ENV_HEALTH_THRESHOLD) {
            settings.health_threshold = parse(ENV_HEALTH_THRESHOLD, &raw)?;
        }

        settings.validate()?;
        tracing::debug!(
            name = %settings.name,
            max_queue_size = settings.max_queue_size,
            enable_logging = settings.enable_logging,
            "settings loaded"
        );
        Ok(settings)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.health_threshold > 0.0 && self.health_threshold <= 1.0) {
            return Err(SettingsError::ThresholdOutOfRange(self.health_threshold));
        }
        Ok(())
    }

    /// An engine configuration carrying these settings and no callbacks yet.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.name.clone())
            .max_queue_size(self.max_queue_size)
            .enable_logging(self.enable_logging)
    }
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, SettingsError> {
    raw.trim().parse().map_err(|_| SettingsError::Invalid {
        key,
        value: raw.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, SettingsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}
