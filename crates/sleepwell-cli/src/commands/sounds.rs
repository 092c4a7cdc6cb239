use std::path::PathBuf;

use clap::Subcommand;
use crossterm::event::{KeyCode, KeyEvent};
use serde::Serialize;
use sleepwell_core::sound::SoundCatalog;
use sleepwell_core::{Config, Event, Rgb, SoundMixer};

use super::{CommandResult, Context};
use crate::overlay::View;
use crate::runtime::{self, Control, Screen};

const VOLUME_STEP: u8 = 5;

#[derive(Subcommand)]
pub enum SoundsAction {
    /// List the built-in sounds and where their files are expected
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Loop one or more sounds together until you quit
    Play {
        /// Sound ids (see `sleepwell sounds list`)
        #[arg(required = true)]
        ids: Vec<String>,
        /// Starting volume for every sound (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        volume: Option<u8>,
        /// Do not play any audio
        #[arg(long)]
        mute: bool,
    },
}

#[derive(Debug, Serialize)]
struct SoundEntry {
    id: String,
    path: PathBuf,
    available: bool,
}

fn entries(catalog: &SoundCatalog) -> Vec<SoundEntry> {
    catalog
        .ids()
        .filter_map(|id| {
            let path = catalog.path_for(id)?;
            Some(SoundEntry {
                id: id.to_string(),
                available: path.is_file(),
                path,
            })
        })
        .collect()
}

pub fn run(action: SoundsAction) -> CommandResult {
    match action {
        SoundsAction::List { json } => {
            let catalog = SoundCatalog::builtin(Config::load_or_default().asset_dir());
            let listed = entries(&catalog);
            if json {
                println!("{}", serde_json::to_string_pretty(&listed)?);
            } else {
                for entry in &listed {
                    let marker = if entry.available { "" } else { "  (missing)" };
                    println!("{:<12} {}{marker}", entry.id, entry.path.display());
                }
            }
        }
        SoundsAction::Play { ids, volume, mute } => {
            let ctx = Context::open(mute)?;
            let volume = volume.unwrap_or(ctx.config.sounds.default_volume);
            let mut mixer = SoundMixer::new(ctx.sounds.clone());
            for id in &ids {
                if !mixer.is_playing(id) {
                    mixer.toggle(id)?;
                }
                mixer.set_volume(id, volume);
            }
            tracing::info!(sounds = ?ids, volume, "mixer started");

            let mut screen = MixerScreen { mixer, selected: 0 };
            runtime::block_on(runtime::run(&mut screen, &ctx.presenter, false))??;
        }
    }
    Ok(())
}

struct MixerScreen {
    mixer: SoundMixer,
    selected: usize,
}

impl MixerScreen {
    fn selected_id(&self) -> Option<String> {
        self.mixer.playing().get(self.selected).map(|c| c.id.clone())
    }

    fn nudge_volume(&mut self, up: bool) {
        let Some(id) = self.selected_id() else {
            return;
        };
        let current = self.mixer.volume(&id);
        let next = if up {
            current.saturating_add(VOLUME_STEP).min(100)
        } else {
            current.saturating_sub(VOLUME_STEP)
        };
        self.mixer.set_volume(&id, next);
    }

    fn cycle(&mut self, forward: bool) {
        let count = self.mixer.playing().len();
        if count == 0 {
            return;
        }
        self.selected = if forward {
            (self.selected + 1) % count
        } else {
            (self.selected + count - 1) % count
        };
    }
}

impl Screen for MixerScreen {
    fn on_frame(&mut self) -> Vec<Event> {
        Vec::new()
    }

    fn on_key(&mut self, key: KeyEvent) -> Control {
        match key.code {
            KeyCode::Up | KeyCode::Char('+') => self.nudge_volume(true),
            KeyCode::Down | KeyCode::Char('-') => self.nudge_volume(false),
            KeyCode::Tab | KeyCode::Right => self.cycle(true),
            KeyCode::BackTab | KeyCode::Left => self.cycle(false),
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            _ => {}
        }
        Control::Continue
    }

    fn view(&self) -> View {
        let channels: Vec<String> = self
            .mixer
            .playing()
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mark = if i == self.selected { ">" } else { " " };
                format!("{mark}{} {}%", c.id, c.volume_percent)
            })
            .collect();
        View {
            color: Rgb::BLACK,
            brightness: 0.0,
            headline: "Mixing".to_string(),
            detail: channels.join("  "),
            hint: "tab select  up/down volume  q quit".to_string(),
        }
    }

    fn on_exit(&mut self) -> Vec<Event> {
        self.mixer.stop_all();
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use sleepwell_core::sound::{MemoryBackend, SoundRegistry};
    use std::sync::Arc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn entries_report_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rain.mp3"), b"").unwrap();
        let listed = entries(&SoundCatalog::builtin(dir.path()));

        let rain = listed.iter().find(|e| e.id == "rain").unwrap();
        assert!(rain.available);
        let ocean = listed.iter().find(|e| e.id == "ocean").unwrap();
        assert!(!ocean.available);
        assert_eq!(ocean.path, dir.path().join("waves.mp3"));
    }

    #[test]
    fn keys_adjust_the_selected_channel() {
        let backend = Arc::new(MemoryBackend::new());
        let registry = Arc::new(SoundRegistry::new(SoundCatalog::builtin("/tmp/sounds"), backend.clone()));
        let mut mixer = SoundMixer::new(registry);
        mixer.toggle("rain").unwrap();
        mixer.toggle("fire").unwrap();
        let mut screen = MixerScreen { mixer, selected: 0 };

        screen.on_key(key(KeyCode::Tab));
        screen.on_key(key(KeyCode::Up));
        assert_eq!(screen.mixer.volume("fire"), 55);
        assert_eq!(screen.mixer.volume("rain"), 50);
        assert!(screen.view().detail.contains(">fire 55%"));

        screen.on_key(key(KeyCode::Tab));
        screen.on_key(key(KeyCode::Down));
        assert_eq!(screen.mixer.volume("rain"), 45);

        screen.on_exit();
        assert!(!backend.state("rain").unwrap().playing);
        assert!(!backend.state("fire").unwrap().playing);
    }
}
