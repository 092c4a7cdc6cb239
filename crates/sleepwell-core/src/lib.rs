//! # SleepWell Core Library
//!
//! This library provides the core logic for SleepWell: wind-down lighting
//! sessions that fade a colored screen to black, a wake-up alarm, a
//! Pomodoro focus timer, an ambient sound registry and a circadian advisor.
//! The `sleepwell` CLI is a thin terminal front end over the same library.
//!
//! ## Architecture
//!
//! - **Session controller**: A wall-clock fade state machine driven by
//!   periodic `tick()` calls; it owns no threads
//! - **Alarm**: One scheduler running both the exact-match and the
//!   look-ahead window check, wired to the wind-down and the wake sound
//! - **Sounds**: A lazily loaded registry of cached handles over a
//!   pluggable audio backend
//! - **Capabilities**: Fullscreen, notifications and wake locks as traits
//!   whose failures are logged, never fatal
//!
//! ## Key Components
//!
//! - [`SessionController`]: Wind-down session state machine
//! - [`AlarmClock`]: Wake-up alarm with pre-sleep mode
//! - [`PomodoroTimer`]: Focus timer state machine
//! - [`SoundRegistry`]: Sound id to playback handle cache
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod capability;
pub mod circadian;
pub mod clock;
pub mod color;
pub mod config;
pub mod error;
pub mod events;
pub mod fade;
pub mod pomodoro;
pub mod session;
pub mod sound;

pub use alarm::{AlarmClock, AlarmScheduler, AlarmStatus, TriggerCheck};
pub use capability::{Notifier, Permission, Presenter, WakeLock};
pub use circadian::{Advice, Chronotype, LightingSuggestion};
pub use clock::{Clock, ManualClock, SystemClock, TimeOfDay};
pub use color::Rgb;
pub use config::Config;
pub use error::{CapabilityError, ConfigError, CoreError, PlaybackError, SessionError, ValidationError};
pub use events::Event;
pub use fade::FadeFrame;
pub use pomodoro::{PomodoroSettings, PomodoroTimer, SessionType, TimerStatus};
pub use session::{SessionClock, SessionConfig, SessionController, SessionState};
pub use sound::{AudioBackend, AudioHandle, SoundCatalog, SoundHandle, SoundMixer, SoundRegistry};
