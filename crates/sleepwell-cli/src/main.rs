use clap::{Parser, Subcommand};

mod audio;
mod commands;
mod logging;
mod overlay;
mod platform;
mod runtime;

#[derive(Parser)]
#[command(name = "sleepwell", version, about = "SleepWell: wind-down lighting, alarm, focus timer and ambient sounds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fade a colored screen to black over a set time
    Lighting(commands::lighting::LightingArgs),
    /// Wake-up alarm with an optional wind-down before sleep
    Alarm(commands::alarm::AlarmArgs),
    /// Pomodoro focus timer
    Focus(commands::focus::FocusArgs),
    /// Ambient sounds
    Sounds {
        #[command(subcommand)]
        action: commands::sounds::SoundsAction,
    },
    /// Chronotype advice and energy curve
    Circadian(commands::circadian::CircadianArgs),
    /// List color presets
    Presets(commands::presets::PresetsArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command {
        Commands::Lighting(args) => commands::lighting::run(args),
        Commands::Alarm(args) => commands::alarm::run(args),
        Commands::Focus(args) => commands::focus::run(args),
        Commands::Sounds { action } => commands::sounds::run(action),
        Commands::Circadian(args) => commands::circadian::run(args),
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
