//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use att_api::{ApiError, Client};
use att_core::{IdleThresholds, ValidationError};
use att_tracker::TrackerConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the attendance API, e.g. `https://hr.example.com/api`.
    pub api_base_url: String,
    /// Bearer token sent with every request.
    pub api_token: Option<String>,
    /// Idle seconds before the warning.
    pub warning_threshold_secs: u64,
    /// Idle seconds before the automatic punch-out.
    pub auto_punch_out_threshold_secs: u64,
    pub reconciliation_interval_ms: u64,
    pub tick_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("warning_threshold_secs", &self.warning_threshold_secs)
            .field(
                "auto_punch_out_threshold_secs",
                &self.auto_punch_out_threshold_secs,
            )
            .field("reconciliation_interval_ms", &self.reconciliation_interval_ms)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            api_token: None,
            warning_threshold_secs: 240,
            auto_punch_out_threshold_secs: 300,
            reconciliation_interval_ms: 30_000,
            tick_interval_ms: 1_000,
            request_timeout_ms: 10_000,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ATT_*)
        figment = figment.merge(Env::prefixed("ATT_"));

        figment.extract()
    }

    /// Timing settings for the tracker.
    pub fn tracker_config(&self) -> Result<TrackerConfig, ValidationError> {
        let config = TrackerConfig {
            thresholds: IdleThresholds::new(
                Duration::from_secs(self.warning_threshold_secs),
                Duration::from_secs(self.auto_punch_out_threshold_secs),
            )?,
            reconciliation_interval: Duration::from_millis(self.reconciliation_interval_ms),
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            fetch_timeout: self.request_timeout(),
        };
        config.validate()?;
        Ok(config)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Builds an API client from the configured URL and token.
    pub fn client(&self) -> Result<Client, ApiError> {
        Client::new(
            &self.api_base_url,
            self.api_token.clone(),
            self.request_timeout(),
        )
    }

    /// A copy that is safe to print.
    pub fn redacted(&self) -> Self {
        Self {
            api_token: self.api_token.as_ref().map(|_| "[REDACTED]".to_string()),
            ..self.clone()
        }
    }
}

/// Returns the platform-specific config directory for att.
///
/// On Linux: `~/.config/att`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("att"))
}
