use chrono::Local;
use clap::Args;
use serde::Serialize;
use sleepwell_core::circadian::{render_ascii_chart, ChronotypeProfile};
use sleepwell_core::{Advice, Chronotype, LightingSuggestion, TimeOfDay};

use super::CommandResult;

#[derive(Args)]
pub struct CircadianArgs {
    /// lion, bear, wolf or dolphin
    #[arg(long, short, default_value = "bear")]
    chronotype: Chronotype,
    /// Time of day to advise for, HH:MM (defaults to now)
    #[arg(long)]
    at: Option<TimeOfDay>,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    profile: &'static ChronotypeProfile,
    time: TimeOfDay,
    advice: AdviceReport,
    lighting: LightingReport,
    energy_curve: [u8; 24],
}

#[derive(Serialize)]
struct AdviceReport {
    kind: Advice,
    title: &'static str,
    detail: &'static str,
    quick_actions: &'static [&'static str],
}

#[derive(Serialize)]
struct LightingReport {
    kind: LightingSuggestion,
    title: &'static str,
    detail: &'static str,
}

fn report(chronotype: Chronotype, time: TimeOfDay) -> Report {
    let advice = chronotype.advice(time);
    let lighting = chronotype.lighting_suggestion(time);
    Report {
        profile: chronotype.profile(),
        time,
        advice: AdviceReport {
            kind: advice,
            title: advice.title(),
            detail: advice.detail(),
            quick_actions: advice.quick_actions(),
        },
        lighting: LightingReport {
            kind: lighting,
            title: lighting.title(),
            detail: lighting.detail(),
        },
        energy_curve: chronotype.energy_curve(),
    }
}

pub fn run(args: CircadianArgs) -> CommandResult {
    let time = args.at.unwrap_or_else(|| TimeOfDay::from_time(&Local::now()));
    let report = report(args.chronotype, time);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let profile = report.profile;
    println!("{} ({}): {}", profile.name, time.format_12h(), profile.description);
    println!(
        "Sleep window {} - {}",
        profile.bedtime.format_12h(),
        profile.wakeup.format_12h()
    );
    println!();
    println!("{}", report.advice.title);
    println!("  {}", report.advice.detail);
    for action in report.advice.quick_actions {
        println!("  > {action}");
    }
    println!();
    println!("Lighting: {}", report.lighting.title);
    println!("  {}", report.lighting.detail);
    print!("{}", render_ascii_chart(args.chronotype, Some(time.hour())));
    Ok(())
}
