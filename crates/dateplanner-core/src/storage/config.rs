//! TOML-based application configuration.
//!
//! Stores:
//! - Transition delay and countdown tick period
//! - Storage keys for the snapshot and the user identity
//! - An optional custom stage list replacing the built-in date plan
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use super::state_store::{StorageKeys, DEFAULT_STATE_KEY, DEFAULT_USER_ID_KEY};
use crate::error::ConfigError;
use crate::progression::EngineSettings;
use crate::stage::{StageDefinition, StageRegistry};

/// Timing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Delay between confirming a stage and the next unlock, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Countdown tick period in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Storage key configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_key")]
    pub state_key: String,
    #[serde(default = "default_user_id_key")]
    pub user_id_key: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Custom stage list. Empty means the built-in date plan.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<StageDefinition>,
}

// Default functions
fn default_delay_ms() -> u64 {
    30_000
}
fn default_tick_ms() -> u64 {
    1_000
}
fn default_state_key() -> String {
    DEFAULT_STATE_KEY.into()
}
fn default_user_id_key() -> String {
    DEFAULT_USER_ID_KEY.into()
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_key: default_state_key(),
            user_id_key: default_user_id_key(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            storage: StorageConfig::default(),
            stages: Vec::new(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()
            .map_err(|e| ConfigError::DataDir(e.to_string()))?
            .join("config.toml"))
    }

    /// Load from the data directory or return (and write) the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, creating it with defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed, holds invalid values,
    /// or the default cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory, validating the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save it to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value is invalid,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Check values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.tick_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timing.tick_ms".into(),
                message: "tick period must be positive".into(),
            });
        }
        if self.storage.state_key.is_empty() || self.storage.user_id_key.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "storage".into(),
                message: "storage keys must not be empty".into(),
            });
        }
        if self.storage.state_key == self.storage.user_id_key {
            return Err(ConfigError::InvalidValue {
                key: "storage".into(),
                message: "state and user id keys must differ".into(),
            });
        }
        if !self.stages.is_empty() {
            StageRegistry::new(self.stages.clone())?;
        }
        Ok(())
    }

    /// The stage registry: the custom list if one is configured, otherwise
    /// the built-in date plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the custom stage list is invalid.
    pub fn registry(&self) -> Result<StageRegistry, ConfigError> {
        if self.stages.is_empty() {
            Ok(StageRegistry::date_plan())
        } else {
            StageRegistry::new(self.stages.clone())
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            delay: Duration::from_millis(self.timing.delay_ms),
            tick_period: Duration::from_millis(self.timing.tick_ms.max(1)),
        }
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys {
            state: self.storage.state_key.clone(),
            user_id: self.storage.user_id_key.clone(),
        }
    }
}
