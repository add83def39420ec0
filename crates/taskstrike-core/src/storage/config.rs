//! TOML-based application configuration.
//!
//! Stores user preferences for the countdown loop, display, notifications
//! and logging. Configuration lives at `~/.config/taskstrike/config.toml`
//! and is created with defaults on first use.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::TimerConfig;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsSection {
    /// Countdown length in minutes when the CLI gets no explicit duration.
    #[serde(default = "default_duration")]
    pub default_duration: u32,
}

/// Countdown loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSection {
    /// Seconds per tick of the countdown loop.
    #[serde(default = "default_tick_interval")]
    pub tick_interval: u64,
    /// Seconds to wait for a prompt answer before defaulting to "not finished".
    #[serde(default = "default_prompt_timeout")]
    pub prompt_timeout: u64,
}

/// Display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySection {
    /// Clear the terminal before drawing each frame.
    #[serde(default = "default_true")]
    pub clear_screen: bool,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Popup lifetime in seconds.
    #[serde(default = "default_popup_duration")]
    pub popup_duration: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/taskstrike/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: SettingsSection,
    #[serde(default)]
    pub timer: TimerSection,
    #[serde(default)]
    pub display: DisplaySection,
    #[serde(default)]
    pub notifications: NotificationsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

// Default functions
fn default_duration() -> u32 {
    25
}
fn default_tick_interval() -> u64 {
    1
}
fn default_prompt_timeout() -> u64 {
    30
}
fn default_popup_duration() -> u32 {
    10
}
fn default_log_level() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            default_duration: default_duration(),
        }
    }
}

impl Default for TimerSection {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            prompt_timeout: default_prompt_timeout(),
        }
    }
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self { clear_screen: true }
    }
}

impl Default for NotificationsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            popup_duration: default_popup_duration(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: SettingsSection::default(),
            timer: TimerSection::default(),
            display: DisplaySection::default(),
            notifications: NotificationsSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl Config {
    /// Path of the config file inside the data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be resolved.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::DataDir(e.to_string()))?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing a default config file on first use.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "settings.default_duration" => Some(self.settings.default_duration.to_string()),
            "timer.tick_interval" => Some(self.timer.tick_interval.to_string()),
            "timer.prompt_timeout" => Some(self.timer.prompt_timeout.to_string()),
            "display.clear_screen" => Some(self.display.clear_screen.to_string()),
            "notifications.enabled" => Some(self.notifications.enabled.to_string()),
            "notifications.popup_duration" => Some(self.notifications.popup_duration.to_string()),
            "logging.level" => Some(self.logging.level.clone()),
            _ => None,
        }
    }

    /// Set a config value by dot-separated key and persist it.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Update a single field without persisting.
    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "settings.default_duration" => self.settings.default_duration = parse(key, value)?,
            "timer.tick_interval" => self.timer.tick_interval = parse(key, value)?,
            "timer.prompt_timeout" => self.timer.prompt_timeout = parse(key, value)?,
            "display.clear_screen" => self.display.clear_screen = parse(key, value)?,
            "notifications.enabled" => self.notifications.enabled = parse(key, value)?,
            "notifications.popup_duration" => {
                self.notifications.popup_duration = parse(key, value)?
            }
            "logging.level" => self.logging.level = value.to_string(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// The explicit configuration handed to the timer state machine.
    ///
    /// A zero tick interval is clamped to one second.
    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig {
            tick_interval: Duration::from_secs(self.timer.tick_interval.max(1)),
            clear_screen: self.display.clear_screen,
            prompt_timeout: Duration::from_secs(self.timer.prompt_timeout),
        }
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
