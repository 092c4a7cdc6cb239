use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Args;
use crossterm::event::{KeyCode, KeyEvent};
use sleepwell_core::alarm::{AlarmPlatform, WakeSettings, STALL_THRESHOLD_SECS, TICK_PERIOD_SECS};
use sleepwell_core::capability::{enter_fullscreen_best_effort, exit_fullscreen_best_effort};
use sleepwell_core::session::{SessionConfig, SessionState};
use sleepwell_core::{color, AlarmClock, AlarmStatus, Clock, Event, Presenter, Rgb, TimeOfDay};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::{lock, sound_choice, CommandResult, Context};
use crate::overlay::View;
use crate::platform::{DesktopNotifier, InhibitWakeLock};
use crate::runtime::{self, Control, Screen};

#[derive(Args)]
pub struct AlarmArgs {
    /// Wake time as HH:MM, 24-hour (defaults to alarm.time)
    #[arg(long)]
    at: Option<TimeOfDay>,
    /// Start the wind-down fade right away
    #[arg(long)]
    wind_down: bool,
    /// Wind-down fade duration in minutes
    #[arg(long)]
    fade_minutes: Option<u32>,
    /// Wind-down color as #RRGGBB or a preset name
    #[arg(long)]
    sleep_color: Option<String>,
    /// Sound to wake up to ("none" for silence)
    #[arg(long)]
    wake_sound: Option<String>,
    /// Wake sound volume (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    wake_volume: Option<u8>,
    /// Wake color as #RRGGBB or a preset name
    #[arg(long)]
    wake_color: Option<String>,
    /// Re-arm for the next day after ringing
    #[arg(long)]
    repeat: bool,
    /// Draw a status line instead of taking over the terminal
    #[arg(long)]
    no_fullscreen: bool,
    /// Do not play any audio
    #[arg(long)]
    mute: bool,
    /// Print events as JSON lines and exit once the alarm goes off
    #[arg(long)]
    headless: bool,
}

pub fn run(args: AlarmArgs) -> CommandResult {
    let ctx = Context::open(args.mute)?;
    let defaults = &ctx.config.alarm;

    let target = args.at.unwrap_or(defaults.time);
    let wake = WakeSettings {
        sound_id: sound_choice(args.wake_sound.as_deref().unwrap_or(&defaults.wake_sound)),
        volume_percent: args.wake_volume.unwrap_or(defaults.wake_volume),
        color: match &args.wake_color {
            Some(value) => color::resolve(value)?,
            None => defaults.wake_color,
        },
    };
    let fullscreen = defaults.fullscreen && !args.no_fullscreen && !args.headless;
    let mut sleep = defaults.sleep_session()?.with_fullscreen(fullscreen);
    if let Some(minutes) = args.fade_minutes {
        sleep.fade_duration_minutes = minutes;
    }
    if let Some(value) = &args.sleep_color {
        sleep.color = color::resolve(value)?;
    }
    sleep.validate()?;

    let platform = AlarmPlatform {
        presenter: ctx.presenter.clone(),
        notifier: Arc::new(DesktopNotifier::new(ctx.config.notifications.permission())),
        wake_lock: Arc::new(InhibitWakeLock::new()),
    };
    let repeat = defaults.auto_rearm || args.repeat;
    let mut alarm = AlarmClock::new(ctx.clock.clone(), ctx.sounds.clone(), platform, wake, repeat);

    let mut events = vec![alarm.arm(target)];
    if args.wind_down {
        events.push(alarm.start_wind_down(sleep.clone())?);
    }
    runtime::emit(events, args.headless);
    tracing::info!(wake_at = %target, repeat, "alarm armed");

    let alarm = Arc::new(Mutex::new(alarm));
    let (tx, rx) = mpsc::unbounded_channel();
    let mut screen = AlarmScreen {
        alarm: alarm.clone(),
        fired: rx,
        clock: ctx.clock.clone(),
        presenter: ctx.presenter.clone(),
        sleep,
        fullscreen,
        repeat,
        headless: args.headless,
        pending: Vec::new(),
        ringing_fullscreen: false,
        dismissed: false,
    };

    runtime::block_on(async {
        let supervisor = tokio::spawn(supervise(alarm, tx));
        let result = runtime::run(&mut screen, &ctx.presenter, args.headless).await;
        supervisor.abort();
        result
    })??;
    Ok(())
}

/// Poll the alarm once a second, forwarding what it fires.
fn spawn_poller(alarm: Arc<Mutex<AlarmClock>>, fired: UnboundedSender<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval(Duration::from_secs(TICK_PERIOD_SECS as u64));
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticks.tick().await;
            let events = lock(&alarm).tick_alarm();
            for event in events {
                if fired.send(event).is_err() {
                    return;
                }
            }
        }
    })
}

/// Keep the poller alive: restart it if it exits, panics or stops ticking.
async fn supervise(alarm: Arc<Mutex<AlarmClock>>, fired: UnboundedSender<Event>) {
    supervise_with(alarm, fired, spawn_poller).await;
}

async fn supervise_with<F>(alarm: Arc<Mutex<AlarmClock>>, fired: UnboundedSender<Event>, mut spawn: F)
where
    F: FnMut(Arc<Mutex<AlarmClock>>, UnboundedSender<Event>) -> JoinHandle<()>,
{
    let mut poller = spawn(alarm.clone(), fired.clone());
    let mut checks = interval(Duration::from_secs(STALL_THRESHOLD_SECS as u64));
    loop {
        checks.tick().await;
        if fired.is_closed() {
            break;
        }
        let stalled = lock(&alarm).is_stalled();
        if !poller.is_finished() && !stalled {
            continue;
        }
        tracing::error!(stalled, "alarm polling loop stopped, restarting it");
        poller.abort();
        poller = spawn(alarm.clone(), fired.clone());
        let missed = lock(&alarm).recheck_now();
        for event in missed {
            if fired.send(event).is_err() {
                break;
            }
        }
    }
    poller.abort();
}

struct AlarmScreen {
    alarm: Arc<Mutex<AlarmClock>>,
    fired: UnboundedReceiver<Event>,
    clock: Arc<dyn Clock>,
    presenter: Arc<dyn Presenter>,
    sleep: SessionConfig,
    fullscreen: bool,
    repeat: bool,
    headless: bool,
    pending: Vec<Event>,
    ringing_fullscreen: bool,
    dismissed: bool,
}

impl AlarmScreen {
    fn on_ring(&mut self) {
        self.dismissed = false;
        if self.fullscreen && !self.ringing_fullscreen {
            self.ringing_fullscreen = enter_fullscreen_best_effort(self.presenter.as_ref());
        }
    }

    fn leave_fullscreen(&mut self) {
        if self.ringing_fullscreen {
            exit_fullscreen_best_effort(self.presenter.as_ref());
            self.ringing_fullscreen = false;
        }
    }

    fn is_ringing(&self) -> bool {
        !self.dismissed && lock(&self.alarm).status() == AlarmStatus::Triggered
    }

    fn dismiss(&mut self) -> Control {
        lock(&self.alarm).dismiss();
        self.dismissed = true;
        self.leave_fullscreen();
        if self.repeat {
            Control::Continue
        } else {
            Control::Quit
        }
    }

    fn toggle_wind_down(&mut self) {
        let mut alarm = lock(&self.alarm);
        let result = match alarm.wind_down().state() {
            SessionState::Idle => alarm.start_wind_down(self.sleep.clone()),
            SessionState::Running => alarm.pause_wind_down(),
            SessionState::Paused => alarm.resume_wind_down(),
        };
        match result {
            Ok(event) => self.pending.push(event),
            Err(e) => tracing::warn!("{e}"),
        }
    }

    fn countdown(&self, alarm: &AlarmClock) -> String {
        let now = self.clock.now().naive_local();
        match alarm.scheduler().time_until(now) {
            Some(left) => format_until(left),
            None => "not armed".to_string(),
        }
    }
}

/// `"in 8h 05m"`, `"in 12m"`, or `"in under a minute"`.
fn format_until(left: chrono::Duration) -> String {
    let minutes = left.num_minutes();
    match (minutes / 60, minutes % 60) {
        (0, 0) => "in under a minute".to_string(),
        (0, m) => format!("in {m}m"),
        (h, m) => format!("in {h}h {m:02}m"),
    }
}

impl Screen for AlarmScreen {
    fn on_frame(&mut self) -> Vec<Event> {
        let mut events = std::mem::take(&mut self.pending);
        while let Ok(event) = self.fired.try_recv() {
            if matches!(event, Event::AlarmTriggered { .. }) {
                self.on_ring();
            }
            events.push(event);
        }
        events.extend(lock(&self.alarm).tick_frame());
        events
    }

    fn on_key(&mut self, key: KeyEvent) -> Control {
        if self.is_ringing() {
            return self.dismiss();
        }
        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('w') => self.toggle_wind_down(),
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            _ => {}
        }
        Control::Continue
    }

    fn view(&self) -> View {
        let alarm = lock(&self.alarm);
        let label = alarm
            .scheduler()
            .target()
            .map(|t| t.format_12h())
            .unwrap_or_default();

        if !self.dismissed && alarm.status() == AlarmStatus::Triggered {
            return View {
                color: alarm.wake().color,
                brightness: 1.0,
                headline: format!("Wake up! It's {label}"),
                detail: "Good morning".to_string(),
                hint: "press any key to dismiss".to_string(),
            };
        }

        let wind_down = alarm.wind_down();
        match (wind_down.frame(), wind_down.config()) {
            (Some(frame), Some(config)) => View {
                color: config.color,
                brightness: frame.brightness,
                headline: frame.remaining_display(),
                detail: format!("Alarm {label}, {}", self.countdown(&alarm)),
                hint: "space pause  q quit".to_string(),
            },
            _ => View {
                color: Rgb::BLACK,
                brightness: 0.0,
                headline: format!("Alarm set for {label}"),
                detail: self.countdown(&alarm),
                hint: "w wind down  q quit".to_string(),
            },
        }
    }

    fn is_finished(&self) -> bool {
        self.headless && lock(&self.alarm).status() == AlarmStatus::Triggered
    }

    fn on_exit(&mut self) -> Vec<Event> {
        let mut events = std::mem::take(&mut self.pending);
        {
            let mut alarm = lock(&self.alarm);
            events.extend(alarm.stop_wind_down());
            alarm.dismiss();
            if alarm.status() != AlarmStatus::Inactive {
                events.push(alarm.disarm());
            }
        }
        self.leave_fullscreen();
        events
    }
}
