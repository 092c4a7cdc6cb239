//! Wind-down session controller.
//!
//! One controller serves the standalone lighting tool, the alarm's
//! pre-sleep mode and the focus overlay. It knows nothing about which of
//! them is driving it: color, sound and duration come in through
//! [`SessionConfig`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused <-> Running) -> Idle
//!            \-> FadeComplete (still Running, brightness 0, sound stopped)
//! ```
//!
//! Like the timer engines elsewhere in this crate the controller owns no
//! thread. The caller invokes [`SessionController::tick`] once per frame.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::clock::SessionClock;
use crate::capability::{enter_fullscreen_best_effort, exit_fullscreen_best_effort, Presenter};
use crate::clock::Clock;
use crate::color::Rgb;
use crate::error::{Result, SessionError, ValidationError};
use crate::events::Event;
use crate::fade::{self, FadeFrame};
use crate::sound::{self, SoundHandle, SoundRegistry};

/// What a wind-down session looks and sounds like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub fade_duration_minutes: u32,
    /// `None` for a silent session.
    pub sound_id: Option<String>,
    pub volume_percent: u8,
    pub color: Rgb,
    /// Request fullscreen presentation on start.
    pub fullscreen: bool,
}

impl SessionConfig {
    pub fn new(fade_duration_minutes: u32, color: Rgb) -> std::result::Result<Self, ValidationError> {
        let config = Self {
            fade_duration_minutes,
            sound_id: None,
            volume_percent: 50,
            color,
            fullscreen: true,
        };
        config.validate()?;
        Ok(config)
    }

    /// `"none"` clears the sound.
    pub fn with_sound(mut self, sound_id: &str, volume_percent: u8) -> std::result::Result<Self, ValidationError> {
        self.sound_id = (!sound::is_silent(sound_id)).then(|| sound_id.to_string());
        self.volume_percent = volume_percent;
        self.validate()?;
        Ok(self)
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.fade_duration_minutes == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        if self.volume_percent > 100 {
            return Err(ValidationError::OutOfRange {
                field: "volume_percent".into(),
                value: self.volume_percent as i64,
                min: 0,
                max: 100,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
}

impl SessionState {
    fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
        }
    }
}

struct ActiveSession {
    config: SessionConfig,
    clock: SessionClock,
    frame: FadeFrame,
    sound: Option<SoundHandle>,
    in_fullscreen: bool,
    fade_complete: bool,
}

pub struct SessionController {
    clock: Arc<dyn Clock>,
    sounds: Arc<SoundRegistry>,
    presenter: Arc<dyn Presenter>,
    active: Option<ActiveSession>,
}

impl SessionController {
    pub fn new(clock: Arc<dyn Clock>, sounds: Arc<SoundRegistry>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            clock,
            sounds,
            presenter,
            active: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        match &self.active {
            None => SessionState::Idle,
            Some(s) if s.clock.is_paused() => SessionState::Paused,
            Some(_) => SessionState::Running,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Brightness has bottomed out but the session was not stopped.
    pub fn is_fade_complete(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.fade_complete)
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.active.as_ref().map(|s| &s.config)
    }

    /// Last computed frame; `None` while idle.
    pub fn frame(&self) -> Option<FadeFrame> {
        self.active.as_ref().map(|s| s.frame)
    }

    pub fn started_at_ms(&self) -> Option<i64> {
        self.active.as_ref().map(|s| s.clock.started_at_ms())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fade. Refuses to restart a session that is already active.
    pub fn start(&mut self, config: SessionConfig) -> Result<Event> {
        if self.active.is_some() {
            return Err(self.invalid("start").into());
        }
        config.validate()?;

        let in_fullscreen = config.fullscreen && enter_fullscreen_best_effort(self.presenter.as_ref());
        let now_ms = self.clock.now_ms();
        let sound = config.sound_id.as_deref().and_then(|id| {
            let handle = self.sounds.get(id);
            if handle.is_none() {
                tracing::warn!(id, "unknown sound id, starting silently");
            }
            handle
        });
        if let Some(handle) = &sound {
            sound::play_looped(handle.as_ref(), config.volume_percent);
        }

        tracing::info!(
            duration_min = config.fade_duration_minutes,
            sound = config.sound_id.as_deref().unwrap_or(sound::NO_SOUND),
            "wind-down session started"
        );
        let event = Event::SessionStarted {
            duration_minutes: config.fade_duration_minutes,
            sound_id: config.sound_id.clone(),
            color: config.color,
            fullscreen: in_fullscreen,
            at: Utc::now(),
        };
        self.active = Some(ActiveSession {
            frame: FadeFrame::initial(config.fade_duration_minutes),
            config,
            clock: SessionClock::start(now_ms),
            sound,
            in_fullscreen,
            fade_complete: false,
        });
        Ok(event)
    }

    /// Freeze the fade and pause the sound where it is.
    pub fn pause(&mut self) -> Result<Event> {
        let now_ms = self.clock.now_ms();
        let state = self.state();
        let Some(session) = self.active.as_mut().filter(|_| state == SessionState::Running) else {
            return Err(self.invalid("pause").into());
        };

        session.frame = fade::compute(
            session.clock.started_at_ms(),
            now_ms,
            session.config.fade_duration_minutes,
        );
        session.clock.pause(now_ms);
        if let Some(handle) = &session.sound {
            handle.pause();
        }
        Ok(Event::SessionPaused {
            brightness: session.frame.brightness,
            seconds_remaining: session.frame.seconds_remaining,
            at: Utc::now(),
        })
    }

    /// Continue the fade as if the pause never happened.
    pub fn resume(&mut self) -> Result<Event> {
        let now_ms = self.clock.now_ms();
        let Some(session) = self.active.as_mut().filter(|s| s.clock.is_paused()) else {
            return Err(self.invalid("resume").into());
        };

        let paused_ms = session.clock.resume(now_ms).unwrap_or(0);
        if !session.fade_complete {
            if let Some(handle) = &session.sound {
                sound::resume(handle.as_ref());
            }
        }
        tracing::debug!(paused_ms, "wind-down session resumed");
        Ok(Event::SessionResumed {
            paused_ms,
            at: Utc::now(),
        })
    }

    /// End the session. A no-op on an idle controller.
    pub fn stop(&mut self) -> Option<Event> {
        let session = self.active.take()?;
        if session.in_fullscreen {
            exit_fullscreen_best_effort(self.presenter.as_ref());
        }
        if let Some(handle) = &session.sound {
            sound::stop(handle.as_ref());
        }
        tracing::info!("wind-down session stopped");
        Some(Event::SessionStopped { at: Utc::now() })
    }

    /// Recompute the frame. Returns `FadeCompleted` once, at the tick where
    /// brightness reaches zero; the looping sound is stopped at that point.
    pub fn tick(&mut self) -> Option<Event> {
        let now_ms = self.clock.now_ms();
        let session = self.active.as_mut()?;
        if session.clock.is_paused() || session.fade_complete {
            return None;
        }

        session.frame = fade::compute(
            session.clock.started_at_ms(),
            now_ms,
            session.config.fade_duration_minutes,
        );
        if !session.frame.complete {
            return None;
        }

        session.fade_complete = true;
        if let Some(handle) = &session.sound {
            sound::stop(handle.as_ref());
        }
        tracing::info!("fade complete");
        Some(Event::FadeCompleted { at: Utc::now() })
    }

    /// Change the volume of the running session's sound.
    pub fn set_volume(&mut self, volume_percent: u8) {
        let volume_percent = volume_percent.min(100);
        if let Some(session) = self.active.as_mut() {
            session.config.volume_percent = volume_percent;
            if let Some(handle) = &session.sound {
                handle.set_volume(sound::percent_to_volume(volume_percent));
            }
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state().as_str(),
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state())
            .field("frame", &self.frame())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::NoPresenter;
    use crate::clock::ManualClock;
    use crate::error::{CapabilityError, CoreError};
    use crate::sound::{MemoryBackend, SoundCatalog};
    use chrono::{Duration, Local, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingPresenter {
        entered: AtomicUsize,
        exited: AtomicUsize,
    }

    impl Presenter for CountingPresenter {
        fn enter_fullscreen(&self) -> std::result::Result<(), CapabilityError> {
            self.entered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn exit_fullscreen(&self) -> std::result::Result<(), CapabilityError> {
            self.exited.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        backend: Arc<MemoryBackend>,
        presenter: Arc<CountingPresenter>,
        controller: SessionController,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2025, 1, 6, 22, 0, 0).unwrap(),
        ));
        let backend = Arc::new(MemoryBackend::new());
        let sounds = Arc::new(SoundRegistry::new(SoundCatalog::builtin("/assets"), backend.clone()));
        let presenter = Arc::new(CountingPresenter::default());
        let controller = SessionController::new(clock.clone(), sounds, presenter.clone());
        Fixture {
            clock,
            backend,
            presenter,
            controller,
        }
    }

    fn rain(minutes: u32) -> SessionConfig {
        SessionConfig::new(minutes, Rgb::new(0xCC, 0, 0))
            .unwrap()
            .with_sound("rain", 40)
            .unwrap()
    }

    #[test]
    fn start_plays_sound_and_enters_fullscreen() {
        let mut f = fixture();
        let event = f.controller.start(rain(15)).unwrap();
        assert!(matches!(event, Event::SessionStarted { fullscreen: true, .. }));
        assert_eq!(f.controller.state(), SessionState::Running);
        assert_eq!(f.presenter.entered.load(Ordering::SeqCst), 1);

        let state = f.backend.state("rain").unwrap();
        assert!(state.playing && state.looping);
        assert_eq!(state.volume, 0.4);
    }

    #[test]
    fn start_while_running_is_refused() {
        let mut f = fixture();
        f.controller.start(rain(15)).unwrap();
        f.clock.advance(Duration::minutes(5));
        f.controller.tick();
        let started = f.controller.started_at_ms();

        let err = f.controller.start(rain(30)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Session(SessionError::InvalidTransition { action: "start", state: "running" })
        ));
        assert_eq!(f.controller.started_at_ms(), started);
        assert_eq!(f.controller.config().unwrap().fade_duration_minutes, 15);
    }

    #[test]
    fn fade_scenario_fifteen_minutes() {
        let mut f = fixture();
        f.controller.start(rain(15)).unwrap();

        f.clock.advance(Duration::seconds(450));
        assert_eq!(f.controller.tick(), None);
        let frame = f.controller.frame().unwrap();
        assert!((frame.brightness - 0.5).abs() < 1e-9);

        f.clock.advance(Duration::seconds(450));
        assert!(matches!(f.controller.tick(), Some(Event::FadeCompleted { .. })));
        assert_eq!(f.controller.frame().unwrap().brightness, 0.0);
        assert!(f.controller.is_fade_complete());
        assert_eq!(f.controller.state(), SessionState::Running);

        let state = f.backend.state("rain").unwrap();
        assert!(!state.playing && state.at_start);

        // Completion is reported once.
        f.clock.advance(Duration::minutes(1));
        assert_eq!(f.controller.tick(), None);
    }

    #[test]
    fn pause_freezes_and_resume_shifts_start() {
        let mut f = fixture();
        f.controller.start(rain(10)).unwrap();
        let started = f.controller.started_at_ms().unwrap();

        f.clock.advance(Duration::minutes(2));
        f.controller.tick();
        f.controller.pause().unwrap();
        assert_eq!(f.controller.state(), SessionState::Paused);
        let frozen = f.controller.frame().unwrap();

        let rain_state = f.backend.state("rain").unwrap();
        assert!(!rain_state.playing);
        assert!(!rain_state.at_start, "pause must not rewind");

        f.clock.advance(Duration::minutes(7));
        assert_eq!(f.controller.tick(), None);
        assert_eq!(f.controller.frame().unwrap(), frozen);

        let event = f.controller.resume().unwrap();
        assert!(matches!(event, Event::SessionResumed { paused_ms: 420_000, .. }));
        assert_eq!(f.controller.started_at_ms().unwrap(), started + 420_000);
        assert!(f.backend.state("rain").unwrap().playing);

        f.controller.tick();
        assert!((f.controller.frame().unwrap().brightness - 0.8).abs() < 1e-9);
    }

    #[test]
    fn invalid_transitions_are_guarded() {
        let mut f = fixture();
        assert!(f.controller.pause().is_err());
        assert!(f.controller.resume().is_err());
        f.controller.start(rain(10)).unwrap();
        assert!(f.controller.resume().is_err());
        f.controller.pause().unwrap();
        assert!(f.controller.pause().is_err());
    }

    #[test]
    fn stop_rewinds_and_exits_fullscreen() {
        let mut f = fixture();
        f.controller.start(rain(10)).unwrap();
        f.clock.advance(Duration::minutes(1));
        f.controller.pause().unwrap();

        assert!(matches!(f.controller.stop(), Some(Event::SessionStopped { .. })));
        assert_eq!(f.controller.state(), SessionState::Idle);
        assert!(f.controller.frame().is_none());
        assert_eq!(f.presenter.exited.load(Ordering::SeqCst), 1);
        assert!(f.backend.state("rain").unwrap().at_start);
    }

    #[test]
    fn stop_on_idle_is_a_no_op() {
        let mut f = fixture();
        assert_eq!(f.controller.stop(), None);
        assert_eq!(f.controller.stop(), None);
        assert_eq!(f.presenter.exited.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fullscreen_failure_does_not_block_start() {
        let clock = Arc::new(ManualClock::new(Local::now()));
        let sounds = Arc::new(SoundRegistry::new(
            SoundCatalog::builtin("/assets"),
            Arc::new(MemoryBackend::new()),
        ));
        let mut controller = SessionController::new(clock, sounds, Arc::new(NoPresenter));
        let event = controller.start(rain(5)).unwrap();
        assert!(matches!(event, Event::SessionStarted { fullscreen: false, .. }));
        assert_eq!(controller.state(), SessionState::Running);
    }

    #[test]
    fn silent_and_unknown_sounds_start_without_audio() {
        let mut f = fixture();
        let silent = SessionConfig::new(5, Rgb::BLACK).unwrap().with_sound("none", 50).unwrap();
        assert_eq!(silent.sound_id, None);
        f.controller.start(silent).unwrap();
        f.controller.stop();

        let mut unknown = rain(5);
        unknown.sound_id = Some("bagpipes".into());
        f.controller.start(unknown).unwrap();
        assert_eq!(f.controller.state(), SessionState::Running);
    }

    #[test]
    fn volume_changes_reach_the_playing_sound() {
        let mut f = fixture();
        f.controller.start(rain(10)).unwrap();
        f.controller.set_volume(75);
        assert_eq!(f.backend.state("rain").unwrap().volume, 0.75);
        assert_eq!(f.controller.config().unwrap().volume_percent, 75);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert_eq!(
            SessionConfig::new(0, Rgb::BLACK).unwrap_err(),
            ValidationError::ZeroDuration
        );
        assert!(SessionConfig::new(5, Rgb::BLACK).unwrap().with_sound("rain", 101).is_err());
    }

    #[test]
    fn debug_output_shows_state_while_a_sound_plays() {
        let mut f = fixture();
        f.controller.start(rain(15)).unwrap();
        let debug = format!("{:?}", f.controller);
        assert!(debug.starts_with("SessionController"));
        assert!(debug.contains("Running"));
    }
}
