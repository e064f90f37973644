//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The child's age group and buddy
//! - Session timing (buddy fade, check-in display, prompt timeout)
//! - Surprise event odds
//! - Background notification preferences
//!
//! Configuration is stored at `~/.config/study-buddy/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::catalog::{AgeGroup, DEFAULT_SURPRISE_FREQUENCY};
use crate::error::ConfigError;
use crate::session::SessionSettings;

/// Upper bound applied to the surprise multiplier.
pub const MAX_SURPRISE_MULTIPLIER: f64 = 3.0;

/// Who is studying and with which buddy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default)]
    pub age_group: AgeGroup,
    #[serde(default = "default_buddy_name")]
    pub buddy_name: String,
    #[serde(default)]
    pub buddy_personality: Option<String>,
}

/// Session timing configuration (seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_buddy_fade_delay")]
    pub buddy_fade_delay_secs: u64,
    #[serde(default = "default_check_in_display")]
    pub check_in_display_secs: u64,
    #[serde(default = "default_prompt_timeout")]
    pub prompt_timeout_secs: u64,
    /// Overrides the age profile's session length.
    #[serde(default)]
    pub session_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurprisesConfig {
    #[serde(default = "default_surprise_frequency")]
    pub frequency: f64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

/// Background notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_notification_count")]
    pub count: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/study-buddy/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub surprises: SurprisesConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_buddy_name() -> String {
    "Buddy".into()
}
fn default_buddy_fade_delay() -> u64 {
    60
}
fn default_check_in_display() -> u64 {
    5
}
fn default_prompt_timeout() -> u64 {
    30
}
fn default_surprise_frequency() -> f64 {
    DEFAULT_SURPRISE_FREQUENCY
}
fn default_multiplier() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_notification_count() -> u32 {
    3
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            age_group: AgeGroup::default(),
            buddy_name: default_buddy_name(),
            buddy_personality: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            buddy_fade_delay_secs: default_buddy_fade_delay(),
            check_in_display_secs: default_check_in_display(),
            prompt_timeout_secs: default_prompt_timeout(),
            session_minutes: None,
        }
    }
}

impl Default for SurprisesConfig {
    fn default() -> Self {
        Self {
            frequency: default_surprise_frequency(),
            multiplier: default_multiplier(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: default_notification_count(),
        }
    }
}

impl SurprisesConfig {
    /// Multiplier clamped to `[0, MAX_SURPRISE_MULTIPLIER]`; NaN counts as 1.
    pub fn effective_multiplier(&self) -> f64 {
        if self.multiplier.is_nan() {
            return 1.0;
        }
        self.multiplier.clamp(0.0, MAX_SURPRISE_MULTIPLIER)
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

    fn parse_number(key: &str, value: &str) -> Result<serde_json::Value, ConfigError> {
        if let Ok(n) = value.parse::<u64>() {
            return Ok(serde_json::Value::Number(n.into()));
        }
        value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("cannot parse '{value}' as number"),
            })
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => {
                        let b = value.parse::<bool>().map_err(|e| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?;
                        serde_json::Value::Bool(b)
                    }
                    serde_json::Value::Number(_) => Self::parse_number(key, value)?,
                    // Optional fields: "none" clears, numbers stay numbers.
                    serde_json::Value::Null => {
                        if value.eq_ignore_ascii_case("none") || value.is_empty() {
                            serde_json::Value::Null
                        } else {
                            Self::parse_number(key, value)
                                .unwrap_or_else(|_| serde_json::Value::String(value.into()))
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?
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
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there when the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Update a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Engine-facing timing and surprise settings.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            buddy_fade_delay_ms: self.session.buddy_fade_delay_secs.saturating_mul(1000),
            check_in_display_ms: self.session.check_in_display_secs.saturating_mul(1000),
            prompt_timeout_ms: self.session.prompt_timeout_secs.saturating_mul(1000),
            session_minutes: self.session.session_minutes,
            surprise_frequency: self.surprises.frequency.clamp(0.0, 1.0),
            surprise_multiplier: self.surprises.effective_multiplier(),
            notifications_enabled: self.notifications.enabled,
            notification_count: self.notifications.count.min(3) as usize,
            buddy_personality: self.profile.buddy_personality.clone(),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
