//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default wind-down lighting (fade length, color, sound)
//! - Wake-up alarm and its pre-sleep mode
//! - Pomodoro durations and focus sound
//! - Sound asset location
//! - Notification permission
//!
//! Configuration is stored at `~/.config/sleepwell/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::capability::Permission;
use crate::clock::TimeOfDay;
use crate::color::Rgb;
use crate::error::{ConfigError, ValidationError};
use crate::pomodoro::PomodoroSettings;
use crate::session::SessionConfig;
use crate::sound::NO_SOUND;

const CONFIG_FILE: &str = "config.toml";

/// Defaults for `sleepwell lighting`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightingConfig {
    #[serde(default = "default_fade_minutes")]
    pub fade_duration_minutes: u32,
    #[serde(default = "default_sleep_color")]
    pub color: Rgb,
    #[serde(default = "default_no_sound")]
    pub sound: String,
    #[serde(default = "default_50")]
    pub volume: u8,
    #[serde(default = "default_true")]
    pub fullscreen: bool,
}

/// Wake-up alarm and the wind-down that precedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmConfig {
    #[serde(default = "default_wake_time")]
    pub time: TimeOfDay,
    #[serde(default = "default_wake_sound")]
    pub wake_sound: String,
    #[serde(default = "default_70")]
    pub wake_volume: u8,
    #[serde(default = "default_wake_color")]
    pub wake_color: Rgb,
    #[serde(default = "default_fade_minutes")]
    pub sleep_fade_minutes: u32,
    #[serde(default = "default_sleep_color")]
    pub sleep_color: Rgb,
    #[serde(default = "default_no_sound")]
    pub sleep_sound: String,
    #[serde(default = "default_50")]
    pub sleep_volume: u8,
    #[serde(default = "default_true")]
    pub fullscreen: bool,
    /// Re-arm a triggered alarm for the next day.
    #[serde(default)]
    pub auto_rearm: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_work")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break")]
    pub long_break_minutes: u32,
    #[serde(default = "default_sessions_until_long_break")]
    pub sessions_until_long_break: u32,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_work: bool,
    #[serde(default = "default_no_sound")]
    pub focus_sound: String,
    #[serde(default = "default_50")]
    pub focus_volume: u8,
    #[serde(default = "default_focus_color")]
    pub color: Rgb,
    #[serde(default = "default_true")]
    pub fullscreen: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundsConfig {
    /// Directory holding the audio assets. Defaults to `<data dir>/sounds`.
    #[serde(default)]
    pub asset_dir: Option<PathBuf>,
    #[serde(default = "default_50")]
    pub default_volume: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Whether the user allowed desktop notifications.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/sleepwell/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
    #[serde(default)]
    pub sounds: SoundsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_fade_minutes() -> u32 {
    15
}
fn default_sleep_color() -> Rgb {
    Rgb::new(0xCC, 0x00, 0x00)
}
fn default_wake_color() -> Rgb {
    Rgb::new(0xFF, 0x6B, 0x35)
}
fn default_focus_color() -> Rgb {
    Rgb::new(0x1E, 0x3A, 0x8A)
}
fn default_wake_time() -> TimeOfDay {
    TimeOfDay::new_unchecked(7, 0)
}
fn default_wake_sound() -> String {
    "birds".into()
}
fn default_no_sound() -> String {
    NO_SOUND.into()
}
fn default_true() -> bool {
    true
}
fn default_50() -> u8 {
    50
}
fn default_70() -> u8 {
    70
}
fn default_work() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_sessions_until_long_break() -> u32 {
    4
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            fade_duration_minutes: default_fade_minutes(),
            color: default_sleep_color(),
            sound: default_no_sound(),
            volume: 50,
            fullscreen: true,
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            time: default_wake_time(),
            wake_sound: default_wake_sound(),
            wake_volume: 70,
            wake_color: default_wake_color(),
            sleep_fade_minutes: default_fade_minutes(),
            sleep_color: default_sleep_color(),
            sleep_sound: default_no_sound(),
            sleep_volume: 50,
            fullscreen: true,
            auto_rearm: false,
        }
    }
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work(),
            short_break_minutes: default_short_break(),
            long_break_minutes: default_long_break(),
            sessions_until_long_break: default_sessions_until_long_break(),
            auto_start_breaks: false,
            auto_start_work: false,
            focus_sound: default_no_sound(),
            focus_volume: 50,
            color: default_focus_color(),
            fullscreen: true,
        }
    }
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            asset_dir: None,
            default_volume: 50,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl LightingConfig {
    pub fn session(&self) -> Result<SessionConfig, ConfigError> {
        SessionConfig::new(self.fade_duration_minutes, self.color)
            .and_then(|c| c.with_sound(&self.sound, self.volume))
            .map(|c| c.with_fullscreen(self.fullscreen))
            .map_err(|e| invalid("lighting", e))
    }
}

impl AlarmConfig {
    /// The wind-down that runs before the alarm.
    pub fn sleep_session(&self) -> Result<SessionConfig, ConfigError> {
        SessionConfig::new(self.sleep_fade_minutes, self.sleep_color)
            .and_then(|c| c.with_sound(&self.sleep_sound, self.sleep_volume))
            .map(|c| c.with_fullscreen(self.fullscreen))
            .map_err(|e| invalid("alarm", e))
    }
}

impl PomodoroConfig {
    pub fn settings(&self) -> PomodoroSettings {
        PomodoroSettings {
            work_minutes: self.work_minutes,
            short_break_minutes: self.short_break_minutes,
            long_break_minutes: self.long_break_minutes,
            sessions_until_long_break: self.sessions_until_long_break,
            auto_start_breaks: self.auto_start_breaks,
            auto_start_work: self.auto_start_work,
        }
    }
}

impl NotificationsConfig {
    pub fn permission(&self) -> Permission {
        if self.enabled {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }
}

fn invalid(key: &str, e: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
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
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => {
                    serde_json::Value::Bool(value.parse::<bool>().map_err(|e| invalid(key, e))?)
                }
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else {
                        value
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(key, format!("cannot parse '{value}' as number")))?
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(key, e))?
                }
                // Optional values are absent until set; take them as strings.
                serde_json::Value::Null | serde_json::Value::String(_) => {
                    serde_json::Value::String(value.into())
                }
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// Path of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join(CONFIG_FILE))
    }

    /// Load from disk, writing defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                tracing::info!(path = %path.display(), "wrote default configuration");
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
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
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))
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

    /// Set a value by dot-separated key, keeping the existing type, and
    /// validate the result. Does not save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value does not parse as
    /// the field's type, or the result is out of range for the commands
    /// that use it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(key, e))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Self = serde_json::from_value(json).map_err(|e| invalid(key, e))?;
        updated.check().map_err(|e| invalid(key, e))?;
        *self = updated;
        Ok(())
    }

    /// Everything a command will build from this config must be accepted.
    fn check(&self) -> Result<(), ValidationError> {
        SessionConfig::new(self.lighting.fade_duration_minutes, self.lighting.color)?
            .with_sound(&self.lighting.sound, self.lighting.volume)?;
        SessionConfig::new(self.alarm.sleep_fade_minutes, self.alarm.sleep_color)?
            .with_sound(&self.alarm.sleep_sound, self.alarm.sleep_volume)?;
        self.pomodoro.settings().validate()?;
        let volumes = [
            ("alarm.wake_volume", self.alarm.wake_volume),
            ("pomodoro.focus_volume", self.pomodoro.focus_volume),
            ("sounds.default_volume", self.sounds.default_volume),
        ];
        for (field, value) in volumes {
            if value > 100 {
                return Err(ValidationError::OutOfRange {
                    field: field.into(),
                    value: i64::from(value),
                    min: 0,
                    max: 100,
                });
            }
        }
        Ok(())
    }

    /// Every leaf as `(dot.path, value)`, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let path = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&path, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Where sound assets live.
    pub fn asset_dir(&self) -> PathBuf {
        self.sounds
            .asset_dir
            .clone()
            .or_else(|| data_dir().ok().map(|d| d.join("sounds")))
            .unwrap_or_else(|| PathBuf::from("sounds"))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using default configuration: {e}");
            Self::default()
        })
    }
}

/// Returns `~/.config/sleepwell[-dev]/` based on SLEEPWELL_ENV, or
/// SLEEPWELL_CONFIG_DIR when set.
///
/// Set SLEEPWELL_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("SLEEPWELL_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("SLEEPWELL_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("sleepwell-dev")
            } else {
                base_dir.join("sleepwell")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DirUnavailable(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert!(toml_str.contains("time = \"07:00\""));
        assert!(toml_str.contains("color = \"#CC0000\""));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[alarm]\ntime = \"6:45\"\nauto_rearm = true\n").unwrap();
        assert_eq!(parsed.alarm.time, TimeOfDay::new(6, 45).unwrap());
        assert!(parsed.alarm.auto_rearm);
        assert_eq!(parsed.alarm.wake_sound, "birds");
        assert_eq!(parsed.pomodoro.work_minutes, 25);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("alarm.time").as_deref(), Some("07:00"));
        assert_eq!(cfg.get("pomodoro.work_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert!(cfg.get("alarm.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_keeps_field_types() {
        let mut cfg = Config::default();
        cfg.set("pomodoro.work_minutes", "50").unwrap();
        cfg.set("alarm.auto_rearm", "true").unwrap();
        cfg.set("lighting.color", "#FF8000").unwrap();
        cfg.set("sounds.asset_dir", "/opt/sounds").unwrap();
        assert_eq!(cfg.pomodoro.work_minutes, 50);
        assert!(cfg.alarm.auto_rearm);
        assert_eq!(cfg.lighting.color, Rgb::new(0xFF, 0x80, 0x00));
        assert_eq!(cfg.asset_dir(), PathBuf::from("/opt/sounds"));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("alarm.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("", "value"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("alarm.auto_rearm", "not_a_bool").is_err());
        assert!(cfg.set("alarm.time", "25:00").is_err());
        assert!(cfg.set("lighting.color", "red").is_err());
        assert!(cfg.set("lighting.volume", "300").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_values_commands_cannot_use() {
        let mut cfg = Config::default();
        for (key, value) in [
            ("pomodoro.sessions_until_long_break", "0"),
            ("pomodoro.work_minutes", "0"),
            ("lighting.fade_duration_minutes", "0"),
            ("alarm.sleep_fade_minutes", "0"),
            ("lighting.volume", "101"),
            ("alarm.wake_volume", "150"),
        ] {
            let err = cfg.set(key, value).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { key: k, .. } if k == key),
                "{key}: {err}"
            );
        }
        assert_eq!(cfg, Config::default());
        assert!(cfg.lighting.session().is_ok());
    }

    #[test]
    fn load_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("lighting.fade_duration_minutes", "45").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().lighting.fade_duration_minutes, 45);
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[alarm]\ntime = 7\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn entries_lists_every_leaf() {
        let entries = Config::default().entries();
        assert!(entries.contains(&("alarm.wake_sound".to_string(), "birds".to_string())));
        assert!(entries.contains(&("pomodoro.sessions_until_long_break".to_string(), "4".to_string())));
        assert!(entries.iter().any(|(k, _)| k == "sounds.asset_dir"));
    }

    #[test]
    fn sessions_from_config() {
        let cfg = Config::default();
        let lighting = cfg.lighting.session().unwrap();
        assert_eq!(lighting.fade_duration_minutes, 15);
        assert_eq!(lighting.sound_id, None);

        let mut cfg = cfg;
        cfg.alarm.sleep_sound = "rain".into();
        let sleep = cfg.alarm.sleep_session().unwrap();
        assert_eq!(sleep.sound_id.as_deref(), Some("rain"));
        assert_eq!(cfg.pomodoro.settings(), PomodoroSettings::default());
    }

    #[test]
    fn notification_permission_follows_flag() {
        let mut cfg = Config::default();
        assert_eq!(cfg.notifications.permission(), Permission::Granted);
        cfg.notifications.enabled = false;
        assert_eq!(cfg.notifications.permission(), Permission::Denied);
    }
}
