//! Configuration module
//!
//! Loaded from a TOML file, by default
//! `~/.config/roaming-outcomes/config.toml`. Every section is optional.
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "plain"   # or "json"
//!
//! [push]
//! timeout_secs = 30
//! lock_timeout_secs = 5
//! entity_timeout_secs = 10
//!
//! [[providers]]
//! id = "OICP"
//!
//! [[providers]]
//! id = "OCPI"
//! enabled = false
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ids::RoamingProviderId;
use crate::support::errors::ConfigError;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "ROAMING_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub push: PushConfig,
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `roaming_outcomes=debug`
    pub level: String,
    /// `plain` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "plain".to_string(),
        }
    }
}

/// Time budgets for pushes and bulk commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Upper bound for a whole fan-out to all providers
    pub timeout_secs: u64,
    /// How long a bulk command waits for the command lock
    pub lock_timeout_secs: u64,
    /// Budget of one entity operation inside a bulk command
    pub entity_timeout_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            lock_timeout_secs: 5,
            entity_timeout_secs: 10,
        }
    }
}

impl PushConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    pub fn entity_timeout(&self) -> Duration {
        Duration::from_secs(self.entity_timeout_secs)
    }
}

/// A roaming provider known to this deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: RoamingProviderId,
    /// Disabled providers are answered with `AdminDown` and never contacted
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl AppConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let push = &self.push;
        if push.timeout_secs == 0 || push.lock_timeout_secs == 0 || push.entity_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "push timeouts must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.id.as_str().trim().is_empty() {
                return Err(ConfigError::Invalid("provider id must not be empty".to_string()));
            }
            if !seen.insert(&provider.id) {
                return Err(ConfigError::Invalid(format!(
                    "provider '{}' is configured twice",
                    provider.id
                )));
            }
        }
        Ok(())
    }

    pub fn provider(&self, id: &RoamingProviderId) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| &p.id == id)
    }
}

/// `~/.config/roaming-outcomes/config.toml`, or `./config.toml` when the
/// platform has no config directory.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("roaming-outcomes").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

/// Config path from [`CONFIG_PATH_ENV`], falling back to the default.
pub fn config_path_from_env() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path())
}
