//! The alarm feature: a scheduler, an optional pre-sleep wind-down, and
//! what happens when the alarm goes off.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::scheduler::{AlarmScheduler, AlarmStatus};
use crate::capability::{
    acquire_wake_lock_best_effort, notify_if_permitted, request_permission_once, Notifier,
    Permission, Presenter, WakeLock,
};
use crate::clock::{Clock, TimeOfDay};
use crate::color::Rgb;
use crate::error::Result;
use crate::events::Event;
use crate::session::{SessionConfig, SessionController};
use crate::sound::{self, SoundHandle, SoundRegistry};

pub const NOTIFICATION_TITLE: &str = "SleepWell Alarm";

/// How the alarm wakes the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeSettings {
    pub sound_id: Option<String>,
    pub volume_percent: u8,
    pub color: Rgb,
}

/// Capabilities the alarm borrows from the platform.
#[derive(Clone)]
pub struct AlarmPlatform {
    pub presenter: Arc<dyn Presenter>,
    pub notifier: Arc<dyn Notifier>,
    pub wake_lock: Arc<dyn WakeLock>,
}

pub struct AlarmClock {
    clock: Arc<dyn Clock>,
    sounds: Arc<SoundRegistry>,
    scheduler: AlarmScheduler,
    wind_down: SessionController,
    notifier: Arc<dyn Notifier>,
    wake_lock: Arc<dyn WakeLock>,
    wake: WakeSettings,
    ringing: Option<SoundHandle>,
    wake_lock_held: bool,
    permission: Permission,
}

impl AlarmClock {
    /// Asks for notification permission if the user has not decided yet.
    pub fn new(
        clock: Arc<dyn Clock>,
        sounds: Arc<SoundRegistry>,
        platform: AlarmPlatform,
        wake: WakeSettings,
        auto_rearm: bool,
    ) -> Self {
        let permission = request_permission_once(platform.notifier.as_ref());
        let wind_down = SessionController::new(clock.clone(), sounds.clone(), platform.presenter);
        Self {
            clock,
            sounds,
            scheduler: AlarmScheduler::new(auto_rearm),
            wind_down,
            notifier: platform.notifier,
            wake_lock: platform.wake_lock,
            wake,
            ringing: None,
            wake_lock_held: false,
            permission,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> AlarmStatus {
        self.scheduler.status()
    }

    pub fn scheduler(&self) -> &AlarmScheduler {
        &self.scheduler
    }

    pub fn wind_down(&self) -> &SessionController {
        &self.wind_down
    }

    pub fn wake(&self) -> &WakeSettings {
        &self.wake
    }

    pub fn is_ringing(&self) -> bool {
        self.ringing.is_some()
    }

    pub fn notification_permission(&self) -> Permission {
        self.permission
    }

    pub fn is_stalled(&self) -> bool {
        self.scheduler.is_stalled(self.clock.now().naive_local())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Set (or change) the wake time. Re-arms a triggered alarm.
    pub fn arm(&mut self, target: TimeOfDay) -> Event {
        if !self.wake_lock_held {
            self.wake_lock_held = acquire_wake_lock_best_effort(self.wake_lock.as_ref());
        }
        self.scheduler.set_target(Some(target))
    }

    pub fn disarm(&mut self) -> Event {
        self.release_wake_lock();
        self.scheduler.set_target(None)
    }

    /// Change the wake sound; a ringing alarm is silenced first.
    pub fn set_wake(&mut self, wake: WakeSettings) {
        self.dismiss();
        self.wake = wake;
    }

    pub fn start_wind_down(&mut self, config: SessionConfig) -> Result<Event> {
        self.wind_down.start(config)
    }

    pub fn pause_wind_down(&mut self) -> Result<Event> {
        self.wind_down.pause()
    }

    pub fn resume_wind_down(&mut self) -> Result<Event> {
        self.wind_down.resume()
    }

    pub fn stop_wind_down(&mut self) -> Option<Event> {
        self.wind_down.stop()
    }

    /// Per-frame update of the wind-down overlay.
    pub fn tick_frame(&mut self) -> Option<Event> {
        self.wind_down.tick()
    }

    /// One-second scheduler tick.
    pub fn tick_alarm(&mut self) -> Vec<Event> {
        let now = self.clock.now().naive_local();
        let fired = self.scheduler.tick(now);
        self.handle(fired)
    }

    /// Immediate exact-match check, e.g. after the process was suspended.
    pub fn recheck_now(&mut self) -> Vec<Event> {
        let now = self.clock.now().naive_local();
        let fired = self.scheduler.recheck_now(now);
        self.handle(fired)
    }

    /// Silence the wake sound. Returns whether it was ringing.
    pub fn dismiss(&mut self) -> bool {
        match self.ringing.take() {
            Some(handle) => {
                sound::stop(handle.as_ref());
                true
            }
            None => false,
        }
    }

    fn handle(&mut self, event: Option<Event>) -> Vec<Event> {
        let Some(event) = event else {
            return Vec::new();
        };
        let mut events = Vec::with_capacity(2);
        let triggered = matches!(event, Event::AlarmTriggered { .. });
        events.push(event);
        if triggered {
            events.extend(self.on_trigger());
        }
        events
    }

    fn on_trigger(&mut self) -> Option<Event> {
        let stopped = self.wind_down.stop();

        if let Some(handle) = self.wake.sound_id.as_deref().and_then(|id| self.sounds.get(id)) {
            sound::play_looped(handle.as_ref(), self.wake.volume_percent);
            self.ringing = Some(handle);
        }

        if let Some(target) = self.scheduler.target() {
            let body = format!("Wake up! It's {}", target.format_12h());
            notify_if_permitted(self.notifier.as_ref(), NOTIFICATION_TITLE, &body);
        }
        stopped
    }

    fn release_wake_lock(&mut self) {
        if self.wake_lock_held {
            self.wake_lock.release();
            self.wake_lock_held = false;
        }
    }
}

impl Drop for AlarmClock {
    fn drop(&mut self) {
        self.dismiss();
        self.release_wake_lock();
    }
}

impl std::fmt::Debug for AlarmClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlarmClock")
            .field("scheduler", &self.scheduler)
            .field("wind_down", &self.wind_down)
            .field("ringing", &self.is_ringing())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::NoPresenter;
    use crate::clock::ManualClock;
    use crate::error::CapabilityError;
    use crate::session::SessionState;
    use crate::sound::{MemoryBackend, SoundCatalog};
    use chrono::{Duration, Local, TimeZone};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingNotifier {
        permission: Permission,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn permission(&self) -> Permission {
            self.permission
        }

        fn request_permission(&self) -> Permission {
            self.permission
        }

        fn notify(&self, title: &str, body: &str) -> std::result::Result<(), CapabilityError> {
            self.sent.lock().unwrap().push((title.into(), body.into()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FlagLock {
        held: AtomicBool,
        acquired: AtomicUsize,
    }

    impl WakeLock for FlagLock {
        fn acquire(&self) -> std::result::Result<(), CapabilityError> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            self.held.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn release(&self) {
            self.held.store(false, Ordering::SeqCst);
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        backend: Arc<MemoryBackend>,
        notifier: Arc<RecordingNotifier>,
        lock: Arc<FlagLock>,
        alarm: AlarmClock,
    }

    fn fixture(permission: Permission) -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2025, 1, 6, 22, 0, 0).unwrap(),
        ));
        let backend = Arc::new(MemoryBackend::new());
        let sounds = Arc::new(SoundRegistry::new(SoundCatalog::builtin("/assets"), backend.clone()));
        let notifier = Arc::new(RecordingNotifier {
            permission,
            sent: Mutex::new(Vec::new()),
        });
        let lock = Arc::new(FlagLock::default());
        let platform = AlarmPlatform {
            presenter: Arc::new(NoPresenter),
            notifier: notifier.clone(),
            wake_lock: lock.clone(),
        };
        let wake = WakeSettings {
            sound_id: Some("birds".into()),
            volume_percent: 70,
            color: Rgb::new(0xFF, 0x6B, 0x35),
        };
        let alarm = AlarmClock::new(clock.clone(), sounds, platform, wake, false);
        Fixture {
            clock,
            backend,
            notifier,
            lock,
            alarm,
        }
    }

    #[test]
    fn trigger_stops_wind_down_and_rings() {
        let mut f = fixture(Permission::Granted);
        f.alarm.arm("22:20".parse().unwrap());
        assert!(f.lock.held.load(Ordering::SeqCst));

        let config = SessionConfig::new(15, Rgb::new(0xCC, 0, 0))
            .unwrap()
            .with_sound("rain", 50)
            .unwrap();
        f.alarm.start_wind_down(config).unwrap();
        assert!(f.backend.state("rain").unwrap().playing);

        f.clock.advance(Duration::minutes(20));
        let events = f.alarm.tick_alarm();
        assert!(matches!(events[0], Event::AlarmTriggered { .. }));
        assert!(matches!(events[1], Event::SessionStopped { .. }));
        assert_eq!(f.alarm.status(), AlarmStatus::Triggered);
        assert_eq!(f.alarm.wind_down().state(), SessionState::Idle);

        let rain = f.backend.state("rain").unwrap();
        assert!(!rain.playing && rain.at_start);
        let birds = f.backend.state("birds").unwrap();
        assert!(birds.playing && birds.looping);
        assert_eq!(birds.volume, 0.7);
        assert!(f.alarm.is_ringing());

        let sent = f.notifier.sent.lock().unwrap();
        assert_eq!(
            sent.as_slice(),
            &[(NOTIFICATION_TITLE.to_string(), "Wake up! It's 10:20 PM".to_string())]
        );
    }

    #[test]
    fn no_notification_without_permission() {
        let mut f = fixture(Permission::Denied);
        f.alarm.arm("22:00".parse().unwrap());
        let events = f.alarm.tick_alarm();
        assert_eq!(events.len(), 1);
        assert!(f.notifier.sent.lock().unwrap().is_empty());
        assert!(f.alarm.is_ringing());
    }

    #[test]
    fn dismiss_silences_wake_sound() {
        let mut f = fixture(Permission::Granted);
        f.alarm.arm("22:00".parse().unwrap());
        f.alarm.tick_alarm();
        assert!(f.alarm.dismiss());
        assert!(!f.alarm.dismiss());
        let birds = f.backend.state("birds").unwrap();
        assert!(!birds.playing && birds.at_start);
    }

    #[test]
    fn repeated_checks_fire_once() {
        let mut f = fixture(Permission::Granted);
        f.alarm.arm("22:00".parse().unwrap());
        let first = f.alarm.tick_alarm();
        let again = f.alarm.recheck_now();
        let later = f.alarm.tick_alarm();
        assert!(!first.is_empty());
        assert!(again.is_empty() && later.is_empty());
        assert_eq!(f.backend.state("birds").unwrap().play_calls, 1);
    }

    #[test]
    fn disarm_releases_wake_lock() {
        let mut f = fixture(Permission::Granted);
        f.alarm.arm("07:00".parse().unwrap());
        f.alarm.arm("07:30".parse().unwrap());
        assert_eq!(f.lock.acquired.load(Ordering::SeqCst), 1);
        f.alarm.disarm();
        assert!(!f.lock.held.load(Ordering::SeqCst));
        assert_eq!(f.alarm.status(), AlarmStatus::Inactive);
    }

    #[test]
    fn changing_wake_sound_silences_ringing_alarm() {
        let mut f = fixture(Permission::Granted);
        f.alarm.arm("22:00".parse().unwrap());
        f.alarm.tick_alarm();
        f.alarm.set_wake(WakeSettings {
            sound_id: Some("chimes".into()),
            volume_percent: 30,
            color: Rgb::BLACK,
        });
        assert!(!f.alarm.is_ringing());
        assert!(!f.backend.state("birds").unwrap().playing);
    }
}
