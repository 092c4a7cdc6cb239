use std::io::Write;
use std::sync::Arc;

use clap::Args;
use crossterm::event::{KeyCode, KeyEvent};
use sleepwell_core::capability::notify_if_permitted;
use sleepwell_core::session::{SessionConfig, SessionController, SessionState};
use sleepwell_core::{color, Event, Notifier, PomodoroTimer, SessionType, TimerStatus};

use super::{CommandResult, Context};
use crate::overlay::View;
use crate::platform::DesktopNotifier;
use crate::runtime::{self, Control, Screen};

/// Overlay brightness while no work session is on screen.
const IDLE_BRIGHTNESS: f64 = 0.4;

#[derive(Args)]
pub struct FocusArgs {
    /// Session to begin with: work, short or long
    #[arg(long, short, default_value = "work")]
    session: SessionType,
    /// Sound to loop during work sessions ("none" for silence)
    #[arg(long)]
    sound: Option<String>,
    /// Sound volume (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: Option<u8>,
    /// Color as #RRGGBB or a preset name
    #[arg(long, short)]
    color: Option<String>,
    /// Draw a status line instead of taking over the terminal
    #[arg(long)]
    no_fullscreen: bool,
    /// Do not play any audio
    #[arg(long)]
    mute: bool,
    /// Print events as JSON lines and exit after the first session ends
    #[arg(long)]
    headless: bool,
}

pub fn run(args: FocusArgs) -> CommandResult {
    let ctx = Context::open(args.mute)?;
    let defaults = &ctx.config.pomodoro;

    let color = match &args.color {
        Some(value) => color::resolve(value)?,
        None => defaults.color,
    };
    let settings = defaults.settings();
    let overlay = SessionConfig::new(settings.work_minutes, color)?
        .with_sound(
            args.sound.as_deref().unwrap_or(&defaults.focus_sound),
            args.volume.unwrap_or(defaults.focus_volume),
        )?
        .with_fullscreen(defaults.fullscreen && !args.no_fullscreen && !args.headless);
    let mut timer = PomodoroTimer::new(ctx.clock.clone(), settings)?;

    let mut events = Vec::new();
    if args.session != SessionType::Work {
        events.push(timer.select_session(args.session)?);
    }

    let mut screen = FocusScreen::new(
        timer,
        SessionController::new(ctx.clock.clone(), ctx.sounds.clone(), ctx.presenter.clone()),
        overlay,
        Arc::new(DesktopNotifier::new(ctx.config.notifications.permission())),
    );
    screen.bell = !args.headless;
    screen.exit_after_completion = args.headless;
    screen.start_or_pause();
    events.append(&mut screen.pending);
    runtime::emit(events, args.headless);

    runtime::block_on(runtime::run(&mut screen, &ctx.presenter, args.headless))??;
    Ok(())
}

/// Pomodoro timer whose work sessions run under the wind-down overlay.
/// The session controller owns the fade, the focus sound and fullscreen.
struct FocusScreen {
    timer: PomodoroTimer,
    overlay: SessionController,
    overlay_config: SessionConfig,
    notifier: Arc<dyn Notifier>,
    /// Ring the terminal bell when a session ends.
    bell: bool,
    pending: Vec<Event>,
    exit_after_completion: bool,
    completed_once: bool,
}

impl FocusScreen {
    fn new(
        timer: PomodoroTimer,
        overlay: SessionController,
        overlay_config: SessionConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            timer,
            overlay,
            overlay_config,
            notifier,
            bell: false,
            pending: Vec::new(),
            exit_after_completion: false,
            completed_once: false,
        }
    }

    fn start_or_pause(&mut self) {
        let event = match self.timer.status() {
            TimerStatus::Running => self.timer.pause(),
            TimerStatus::Idle | TimerStatus::Paused => self.timer.start(),
        };
        self.pending.extend(event);
        self.sync_overlay();
    }

    fn skip(&mut self) {
        if let Some(event) = self.timer.skip() {
            self.on_completed(&event);
            self.pending.push(event);
        }
        self.sync_overlay();
    }

    fn reset(&mut self) {
        self.pending.push(self.timer.reset());
        self.sync_overlay();
    }

    fn select(&mut self, session: SessionType) {
        match self.timer.select_session(session) {
            Ok(event) => self.pending.push(event),
            Err(e) => tracing::debug!("{e}"),
        }
    }

    fn on_completed(&mut self, event: &Event) {
        if let Event::PomodoroCompleted { completed, next, .. } = event {
            self.completed_once = true;
            if self.bell {
                ring_bell(&mut std::io::stdout());
            }
            notify_if_permitted(
                self.notifier.as_ref(),
                completed.completion_title(),
                next.next_session_message(),
            );
        }
    }

    /// The overlay lives for the whole work session and mirrors its pauses.
    /// Breaks and idle time run without one.
    fn sync_overlay(&mut self) {
        let work = self.timer.session_type() == SessionType::Work;
        let result = match (work, self.timer.status(), self.overlay.state()) {
            (true, TimerStatus::Running, SessionState::Idle) => self.overlay.start(self.overlay_config.clone()),
            (true, TimerStatus::Running, SessionState::Paused) => self.overlay.resume(),
            (true, TimerStatus::Paused, SessionState::Running) => self.overlay.pause(),
            (true, TimerStatus::Running, SessionState::Running)
            | (true, TimerStatus::Paused, SessionState::Paused)
            | (_, _, SessionState::Idle) => return,
            _ => {
                self.pending.extend(self.overlay.stop());
                return;
            }
        };
        match result {
            Ok(event) => self.pending.push(event),
            Err(e) => tracing::warn!("{e}"),
        }
    }
}

impl Screen for FocusScreen {
    fn on_frame(&mut self) -> Vec<Event> {
        self.pending.extend(self.overlay.tick());
        if let Some(event) = self.timer.tick() {
            self.on_completed(&event);
            self.pending.push(event);
            self.sync_overlay();
        }
        std::mem::take(&mut self.pending)
    }

    fn on_key(&mut self, key: KeyEvent) -> Control {
        match key.code {
            KeyCode::Char(' ') => self.start_or_pause(),
            KeyCode::Char('s') => self.skip(),
            KeyCode::Char('r') => self.reset(),
            KeyCode::Char('1') => self.select(SessionType::Work),
            KeyCode::Char('2') => self.select(SessionType::ShortBreak),
            KeyCode::Char('3') => self.select(SessionType::LongBreak),
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            _ => {}
        }
        Control::Continue
    }

    fn view(&self) -> View {
        let timer = &self.timer;
        let brightness = match (self.overlay.frame(), timer.status()) {
            (Some(frame), _) => frame.brightness,
            (None, TimerStatus::Running) => 1.0,
            (None, _) => IDLE_BRIGHTNESS,
        };
        let detail = if timer.auto_start_pending() {
            format!("{} Starting shortly.", timer.session_type().next_session_message())
        } else {
            format!(
                "{}  |  {} done, {} min focused",
                timer.session_type(),
                timer.completed_work_sessions(),
                timer.total_focus_minutes()
            )
        };
        let hint = match timer.status() {
            TimerStatus::Idle => "space start  1/2/3 session  q quit",
            TimerStatus::Running => "space pause  s skip  r reset  q quit",
            TimerStatus::Paused => "space resume  s skip  r reset  q quit",
        };
        View {
            color: self.overlay_config.color,
            brightness,
            headline: timer.display(),
            detail,
            hint: hint.to_string(),
        }
    }

    fn is_finished(&self) -> bool {
        self.exit_after_completion
            && self.completed_once
            && self.timer.status() == TimerStatus::Idle
            && !self.timer.auto_start_pending()
    }

    fn on_exit(&mut self) -> Vec<Event> {
        let mut events = std::mem::take(&mut self.pending);
        events.extend(self.overlay.stop());
        if self.timer.status() != TimerStatus::Idle {
            events.push(self.timer.stop());
        }
        events
    }
}

fn ring_bell(out: &mut impl Write) {
    if let Err(e) = out.write_all(b"\x07").and_then(|()| out.flush()) {
        tracing::debug!("terminal bell failed: {e}");
    }
}
