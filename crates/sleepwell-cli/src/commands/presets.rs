use clap::{Args, ValueEnum};
use serde::Serialize;
use sleepwell_core::color::{ColorPreset, FOCUS_COLORS, SLEEP_COLORS, WAKE_COLORS};

use super::CommandResult;

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Sleep,
    Wake,
    Focus,
}

impl Kind {
    fn presets(self) -> &'static [ColorPreset] {
        match self {
            Kind::Sleep => SLEEP_COLORS,
            Kind::Wake => WAKE_COLORS,
            Kind::Focus => FOCUS_COLORS,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Kind::Sleep => "Sleep",
            Kind::Wake => "Wake",
            Kind::Focus => "Focus",
        }
    }
}

#[derive(Args)]
pub struct PresetsArgs {
    /// Only this palette (default: all)
    #[arg(long, short, value_enum)]
    kind: Option<Kind>,
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Palette {
    kind: &'static str,
    presets: &'static [ColorPreset],
}

pub fn run(args: PresetsArgs) -> CommandResult {
    let kinds = match args.kind {
        Some(kind) => vec![kind],
        None => vec![Kind::Sleep, Kind::Wake, Kind::Focus],
    };

    if args.json {
        let palettes: Vec<Palette> = kinds
            .iter()
            .map(|k| Palette {
                kind: k.title(),
                presets: k.presets(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&palettes)?);
        return Ok(());
    }

    for kind in kinds {
        println!("{}:", kind.title());
        for preset in kind.presets() {
            println!("  {:<16} {}  {}", preset.name, preset.color, preset.description);
        }
    }
    Ok(())
}
