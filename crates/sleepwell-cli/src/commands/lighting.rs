use clap::Args;
use crossterm::event::{KeyCode, KeyEvent};
use sleepwell_core::session::{SessionConfig, SessionController, SessionState};
use sleepwell_core::{color, Event, FadeFrame, Rgb};

use super::{CommandResult, Context};
use crate::overlay::View;
use crate::runtime::{self, Control, Screen};

const VOLUME_STEP: u8 = 5;

#[derive(Args)]
pub struct LightingArgs {
    /// Fade duration in minutes
    #[arg(long, short)]
    minutes: Option<u32>,
    /// Color as #RRGGBB or a preset name (e.g. "warm-amber")
    #[arg(long, short)]
    color: Option<String>,
    /// Sound to loop during the fade ("none" for silence)
    #[arg(long)]
    sound: Option<String>,
    /// Sound volume (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: Option<u8>,
    /// Draw a status line instead of taking over the terminal
    #[arg(long)]
    no_fullscreen: bool,
    /// Do not play any audio
    #[arg(long)]
    mute: bool,
    /// Print events as JSON lines and exit when the fade completes
    #[arg(long)]
    headless: bool,
}

pub fn run(args: LightingArgs) -> CommandResult {
    let ctx = Context::open(args.mute)?;
    let defaults = &ctx.config.lighting;

    let color = match &args.color {
        Some(value) => color::resolve(value)?,
        None => defaults.color,
    };
    let session = SessionConfig::new(args.minutes.unwrap_or(defaults.fade_duration_minutes), color)?
        .with_sound(
            args.sound.as_deref().unwrap_or(&defaults.sound),
            args.volume.unwrap_or(defaults.volume),
        )?
        .with_fullscreen(defaults.fullscreen && !args.no_fullscreen && !args.headless);

    let mut screen = LightingScreen::new(
        SessionController::new(ctx.clock.clone(), ctx.sounds.clone(), ctx.presenter.clone()),
        session,
        args.headless,
    );
    let started = screen.controller.start(screen.session.clone())?;
    runtime::emit(vec![started], args.headless);

    runtime::block_on(runtime::run(&mut screen, &ctx.presenter, args.headless))??;
    Ok(())
}

struct LightingScreen {
    controller: SessionController,
    session: SessionConfig,
    volume: u8,
    pending: Vec<Event>,
    exit_on_complete: bool,
}

impl LightingScreen {
    fn new(controller: SessionController, session: SessionConfig, exit_on_complete: bool) -> Self {
        Self {
            controller,
            volume: session.volume_percent,
            session,
            pending: Vec::new(),
            exit_on_complete,
        }
    }

    fn toggle_pause(&mut self) {
        let result = match self.controller.state() {
            SessionState::Running => self.controller.pause(),
            SessionState::Paused => self.controller.resume(),
            SessionState::Idle => return,
        };
        match result {
            Ok(event) => self.pending.push(event),
            Err(e) => tracing::warn!("{e}"),
        }
    }

    fn nudge_volume(&mut self, up: bool) {
        self.volume = if up {
            self.volume.saturating_add(VOLUME_STEP).min(100)
        } else {
            self.volume.saturating_sub(VOLUME_STEP)
        };
        self.controller.set_volume(self.volume);
    }
}

impl Screen for LightingScreen {
    fn on_frame(&mut self) -> Vec<Event> {
        let mut events = std::mem::take(&mut self.pending);
        events.extend(self.controller.tick());
        events
    }

    fn on_key(&mut self, key: KeyEvent) -> Control {
        match key.code {
            KeyCode::Char(' ') => self.toggle_pause(),
            KeyCode::Up | KeyCode::Char('+') => self.nudge_volume(true),
            KeyCode::Down | KeyCode::Char('-') => self.nudge_volume(false),
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            _ => {}
        }
        Control::Continue
    }

    fn view(&self) -> View {
        let frame = self
            .controller
            .frame()
            .unwrap_or_else(|| FadeFrame::initial(self.session.fade_duration_minutes));
        let detail = match (self.controller.state(), frame.complete) {
            (SessionState::Paused, _) => "Paused".to_string(),
            (_, true) => "Lights out. Sleep well.".to_string(),
            _ => format!("{:.0}% brightness", frame.brightness * 100.0),
        };
        let hint = if self.session.sound_id.is_some() {
            format!("space pause  up/down volume ({}%)  q quit", self.volume)
        } else {
            "space pause  q quit".to_string()
        };
        View {
            color: self.session.color,
            brightness: frame.brightness,
            headline: frame.remaining_display(),
            detail,
            hint,
        }
    }

    fn is_finished(&self) -> bool {
        self.exit_on_complete && self.controller.is_fade_complete()
    }

    fn on_exit(&mut self) -> Vec<Event> {
        let mut events = std::mem::take(&mut self.pending);
        events.extend(self.controller.stop());
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local, TimeZone};
    use crossterm::event::KeyModifiers;
    use sleepwell_core::capability::NoPresenter;
    use sleepwell_core::clock::ManualClock;
    use sleepwell_core::sound::{MemoryBackend, SoundCatalog, SoundRegistry};
    use std::sync::Arc;

    fn screen() -> (LightingScreen, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Local.with_ymd_and_hms(2025, 1, 6, 22, 0, 0).unwrap()));
        let sounds = Arc::new(SoundRegistry::new(
            SoundCatalog::builtin("/tmp/sounds"),
            Arc::new(MemoryBackend::new()),
        ));
        let controller = SessionController::new(clock.clone(), sounds, Arc::new(NoPresenter));
        let session = SessionConfig::new(10, Rgb::new(200, 0, 0)).unwrap();
        let mut screen = LightingScreen::new(controller, session.clone(), true);
        screen.controller.start(session).unwrap();
        (screen, clock)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn view_follows_the_fade() {
        let (mut screen, clock) = screen();
        clock.advance(Duration::minutes(5));
        screen.on_frame();
        let view = screen.view();
        assert!((view.brightness - 0.5).abs() < 1e-9);
        assert_eq!(view.headline, "5:00");
        assert_eq!(view.background(), Rgb::new(100, 0, 0));
    }

    #[test]
    fn space_toggles_pause() {
        let (mut screen, _clock) = screen();
        screen.on_key(key(KeyCode::Char(' ')));
        assert_eq!(screen.controller.state(), SessionState::Paused);
        assert_eq!(screen.view().detail, "Paused");

        screen.on_key(key(KeyCode::Char(' ')));
        assert_eq!(screen.controller.state(), SessionState::Running);

        let events = screen.on_frame();
        assert!(matches!(events[0], Event::SessionPaused { .. }));
        assert!(matches!(events[1], Event::SessionResumed { .. }));
    }

    #[test]
    fn headless_run_finishes_when_dark() {
        let (mut screen, clock) = screen();
        assert!(!screen.is_finished());
        clock.advance(Duration::minutes(10));
        let events = screen.on_frame();
        assert!(events.iter().any(|e| matches!(e, Event::FadeCompleted { .. })));
        assert!(screen.is_finished());
    }

    #[test]
    fn quit_keys_and_exit_stop_the_session() {
        let (mut screen, _clock) = screen();
        assert!(matches!(screen.on_key(key(KeyCode::Char('q'))), Control::Quit));
        let events = screen.on_exit();
        assert!(matches!(events.last(), Some(Event::SessionStopped { .. })));
        assert_eq!(screen.controller.state(), SessionState::Idle);
    }

    #[test]
    fn volume_is_clamped() {
        let (mut screen, _clock) = screen();
        for _ in 0..30 {
            screen.on_key(key(KeyCode::Up));
        }
        assert_eq!(screen.volume, 100);
        for _ in 0..30 {
            screen.on_key(key(KeyCode::Down));
        }
        assert_eq!(screen.volume, 0);
    }
}
