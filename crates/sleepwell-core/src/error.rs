//! Core error types for sleepwell-core.
//!
//! Only configuration, validation and state-transition errors ever reach a
//! caller as hard failures. Playback and capability errors exist so the
//! components that swallow them have something concrete to log.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for sleepwell-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session state machine misuse
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Audio playback errors
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Platform capability errors
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// The configuration directory could not be determined or created
    #[error("Configuration directory unavailable: {0}")]
    DirUnavailable(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Time of day not in "HH:MM" form
    #[error("Invalid time of day '{0}': expected HH:MM")]
    InvalidTimeOfDay(String),

    /// Color not in "#RRGGBB" form
    #[error("Invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    /// Fade duration must be positive
    #[error("Fade duration must be at least one minute")]
    ZeroDuration,

    /// Out of range numeric value
    #[error("Value {value} for '{field}' is out of range {min}..={max}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Unknown identifier in a static table
    #[error("Unknown {kind} '{id}'")]
    UnknownId { kind: String, id: String },
}

/// Invalid transitions of a session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} a session that is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// Audio playback errors. Callers log these and carry on silently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// The asset behind a sound id does not exist
    #[error("audio asset missing: {0}")]
    AssetMissing(PathBuf),

    /// The asset exists but could not be decoded
    #[error("failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Output device refused to play (no device, blocked autoplay)
    #[error("playback blocked: {0}")]
    Blocked(String),
}

/// Best-effort platform capability failures (fullscreen, wake lock,
/// notifications).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("{capability} unavailable: {message}")]
    Unavailable {
        capability: &'static str,
        message: String,
    },
}

impl CapabilityError {
    pub fn unavailable(capability: &'static str, message: impl Into<String>) -> Self {
        CapabilityError::Unavailable {
            capability,
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
