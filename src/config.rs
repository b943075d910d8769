//! Engine configuration
//!
//! Operational constants of the billing core, read from a TOML file
//! (default: `~/.config/washhub/config.toml`). Every field has a safe
//! default so an absent file or section is not an error for the caller.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds past a program's max duration before a running execution
    /// counts as expired
    pub expiration_grace_secs: u64,
    /// Interval of the background expiry sweep
    pub sweep_interval_secs: u64,
    /// Capacity of the domain event broadcast channel
    pub event_capacity: usize,
    /// Currency code used in formatted output
    pub currency: String,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expiration_grace_secs: 3600,
            sweep_interval_secs: 300,
            event_capacity: 64,
            currency: "EUR".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::seconds(self.expiration_grace_secs as i64)
    }
}

/// Default config file location: `<user config dir>/washhub/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("washhub")
        .join("config.toml")
}

/// Initialize tracing with the configured default level. RUST_LOG wins
/// when set.
pub fn init_tracing(config: &EngineConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.expiration_grace_secs, 3600);
        assert_eq!(cfg.grace_period(), Duration::hours(1));
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg: EngineConfig = toml::from_str("expiration_grace_secs = 600").unwrap();
        assert_eq!(cfg.expiration_grace_secs, 600);
        assert_eq!(cfg.sweep_interval_secs, 300);
        assert_eq!(cfg.currency, "EUR");
    }

    #[test]
    fn full_toml_roundtrip() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            expiration_grace_secs = 1800
            sweep_interval_secs = 60
            event_capacity = 16
            currency = "CHF"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.grace_period(), Duration::minutes(30));
        assert_eq!(cfg.event_capacity, 16);
        assert_eq!(cfg.currency, "CHF");
        assert_eq!(cfg.logging.level, "debug");
    }
}
