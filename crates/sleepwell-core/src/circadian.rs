//! Chronotype-based circadian advisor.
//!
//! Static tables for the four chronotypes plus the rules that turn the
//! current time of day into advice, a lighting suggestion and a 24-hour
//! energy curve.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clock::TimeOfDay;
use crate::error::ValidationError;

/// Wake-ups this late are treated as spilling over midnight.
const LATE_WAKE_MINUTES: u32 = 22 * 60;
const MORNING_LIGHT_MINUTES: u32 = 120;
const DAYLIGHT_END_MINUTES: u32 = 360;
const WIND_DOWN_MINUTES: u32 = 120;
const WARM_LIGHT_MINUTES: u32 = 240;

const BASE_ENERGY: [u8; 24] = [
    30, 25, 20, 15, 20, 40, 60, 80, 90, 85, 80, 75, 60, 50, 65, 75, 80, 75, 65, 50, 40, 35, 30, 25,
];
const MIN_ENERGY: u8 = 10;
const MAX_ENERGY: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chronotype {
    Lion,
    Bear,
    Wolf,
    Dolphin,
}

/// Static description of a chronotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChronotypeProfile {
    pub chronotype: Chronotype,
    pub name: &'static str,
    pub description: &'static str,
    pub bedtime: TimeOfDay,
    pub wakeup: TimeOfDay,
    pub peak_hours: &'static [u8],
    pub low_hours: &'static [u8],
}

const fn at(hour: u8, minute: u8) -> TimeOfDay {
    TimeOfDay::new_unchecked(hour, minute)
}

const PROFILES: [ChronotypeProfile; 4] = [
    ChronotypeProfile {
        chronotype: Chronotype::Lion,
        name: "Lion",
        description: "Early riser, productive in the morning",
        bedtime: at(21, 0),
        wakeup: at(5, 30),
        peak_hours: &[6, 7, 8, 9, 10],
        low_hours: &[14, 20, 21],
    },
    ChronotypeProfile {
        chronotype: Chronotype::Bear,
        name: "Bear",
        description: "Follows the sun, sleeps well at night",
        bedtime: at(22, 0),
        wakeup: at(7, 0),
        peak_hours: &[9, 10, 11, 14],
        low_hours: &[13, 15, 21],
    },
    ChronotypeProfile {
        chronotype: Chronotype::Wolf,
        name: "Wolf",
        description: "Night owl, creative in the evening",
        bedtime: at(0, 0),
        wakeup: at(8, 0),
        peak_hours: &[12, 16, 17, 20, 21],
        low_hours: &[6, 7, 8, 13],
    },
    ChronotypeProfile {
        chronotype: Chronotype::Dolphin,
        name: "Dolphin",
        description: "Light sleeper, erratic energy",
        bedtime: at(23, 30),
        wakeup: at(7, 0),
        peak_hours: &[10, 12, 14, 16],
        low_hours: &[13, 15, 21],
    },
];

impl Chronotype {
    pub const ALL: [Chronotype; 4] = [
        Chronotype::Lion,
        Chronotype::Bear,
        Chronotype::Wolf,
        Chronotype::Dolphin,
    ];

    pub fn profile(self) -> &'static ChronotypeProfile {
        match self {
            Chronotype::Lion => &PROFILES[0],
            Chronotype::Bear => &PROFILES[1],
            Chronotype::Wolf => &PROFILES[2],
            Chronotype::Dolphin => &PROFILES[3],
        }
    }

    /// Hourly energy on a 10..=100 scale.
    pub fn energy_curve(self) -> [u8; 24] {
        let mut curve = BASE_ENERGY;
        for (hour, energy) in curve.iter_mut().enumerate() {
            let hour = hour as u8;
            let delta: i16 = match self {
                Chronotype::Lion if (6..=10).contains(&hour) => 15,
                Chronotype::Lion if hour >= 20 || hour < 6 => -20,
                Chronotype::Bear if [9, 10, 11, 14].contains(&hour) => 10,
                Chronotype::Bear if [13, 15, 21].contains(&hour) => -10,
                Chronotype::Wolf if [16, 17, 20, 21].contains(&hour) => 20,
                Chronotype::Wolf if [6, 7, 8].contains(&hour) => -20,
                Chronotype::Dolphin if [10, 12, 14, 16].contains(&hour) => 10,
                Chronotype::Dolphin if [13, 15, 21].contains(&hour) => -15,
                _ => 0,
            };
            *energy = adjust(*energy, delta);
        }
        curve
    }

    pub fn advice(self, now: TimeOfDay) -> Advice {
        let profile = self.profile();
        let window = SleepWindow::of(profile);
        let now_min = now.minutes_since_midnight();
        let hour = now.hour();

        if window.in_morning_light(now_min) {
            Advice::MorningLight
        } else if profile.peak_hours.contains(&hour) {
            Advice::PeakAlertness
        } else if profile.low_hours.contains(&hour) {
            Advice::EnergyDip
        } else if window.before_bed(now_min, WIND_DOWN_MINUTES, 0) && !window.is_sleep_time(now_min) {
            Advice::WindDown
        } else if window.is_sleep_time(now_min) {
            Advice::SleepTime
        } else {
            Advice::Neutral
        }
    }

    pub fn lighting_suggestion(self, now: TimeOfDay) -> LightingSuggestion {
        let window = SleepWindow::of(self.profile());
        let now_min = now.minutes_since_midnight();
        let wake = window.wake;

        if window.in_morning_light(now_min) {
            LightingSuggestion::BrightMorning
        } else if now_min >= wake + MORNING_LIGHT_MINUTES && now_min < wake + DAYLIGHT_END_MINUTES {
            LightingSuggestion::NaturalDaylight
        } else if window.before_bed(now_min, WARM_LIGHT_MINUTES, WIND_DOWN_MINUTES) {
            LightingSuggestion::WarmAfternoon
        } else if window.before_bed(now_min, WIND_DOWN_MINUTES, 0) {
            LightingSuggestion::DimWarm
        } else if window.is_sleep_time(now_min) {
            LightingSuggestion::MinimalRed
        } else {
            LightingSuggestion::Neutral
        }
    }
}

fn adjust(energy: u8, delta: i16) -> u8 {
    (energy as i16 + delta).clamp(MIN_ENERGY as i16, MAX_ENERGY as i16) as u8
}

impl fmt::Display for Chronotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

impl FromStr for Chronotype {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chronotype::ALL
            .into_iter()
            .find(|c| c.profile().name.eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownId {
                kind: "chronotype".into(),
                id: s.to_string(),
            })
    }
}

/// Bed and wake time in minutes since midnight.
#[derive(Debug, Clone, Copy)]
struct SleepWindow {
    bed: u32,
    wake: u32,
}

impl SleepWindow {
    fn of(profile: &ChronotypeProfile) -> Self {
        Self {
            bed: profile.bedtime.minutes_since_midnight(),
            wake: profile.wakeup.minutes_since_midnight(),
        }
    }

    /// Handles windows that wrap past midnight.
    fn is_sleep_time(&self, now: u32) -> bool {
        if self.bed < self.wake {
            now >= self.bed && now < self.wake
        } else {
            now >= self.bed || now < self.wake
        }
    }

    fn in_morning_light(&self, now: u32) -> bool {
        (now >= self.wake && now < self.wake + MORNING_LIGHT_MINUTES)
            || (self.wake > LATE_WAKE_MINUTES && now < MORNING_LIGHT_MINUTES)
    }

    /// `now` is in `[bed - from, bed - until)` on the same evening.
    /// Does not wrap: a midnight bedtime yields an empty range.
    fn before_bed(&self, now: u32, from: u32, until: u32) -> bool {
        let start = self.bed as i64 - from as i64;
        let end = self.bed as i64 - until as i64;
        let now = now as i64;
        now >= start && now < end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advice {
    MorningLight,
    PeakAlertness,
    EnergyDip,
    WindDown,
    SleepTime,
    Neutral,
}

impl Advice {
    pub fn title(self) -> &'static str {
        match self {
            Advice::MorningLight => "Morning Light Exposure",
            Advice::PeakAlertness => "Peak Alertness",
            Advice::EnergyDip => "Energy Dip",
            Advice::WindDown => "Wind Down Begins",
            Advice::SleepTime => "Sleep Time",
            Advice::Neutral => "Neutral Zone",
        }
    }

    pub fn detail(self) -> &'static str {
        match self {
            Advice::MorningLight => {
                "Get bright light exposure to kickstart your circadian rhythm. Open curtains or step outside."
            }
            Advice::PeakAlertness => {
                "This is your optimal time for focused work and important decisions. Tackle challenging tasks now."
            }
            Advice::EnergyDip => {
                "Your energy may be low. Consider rest, light activity, or low-stimulus tasks."
            }
            Advice::WindDown => {
                "Start reducing stimulation. Dim lights, avoid heavy meals, and begin relaxing activities."
            }
            Advice::SleepTime => {
                "Your body is producing melatonin. Keep lights dim and prepare for restorative sleep."
            }
            Advice::Neutral => {
                "This time may not be especially productive or low. Do routine tasks or recharge."
            }
        }
    }

    /// Commands worth running right now.
    pub fn quick_actions(self) -> &'static [&'static str] {
        match self {
            Advice::MorningLight => &["sleepwell sounds play birds", "sleepwell lighting --color sunrise-orange"],
            Advice::PeakAlertness => &["sleepwell focus", "sleepwell sounds play white-noise"],
            Advice::EnergyDip => &["sleepwell sounds play forest", "sleepwell focus --session short"],
            Advice::WindDown => &["sleepwell sounds play rain", "sleepwell lighting"],
            Advice::SleepTime => &["sleepwell alarm", "sleepwell sounds play delta"],
            Advice::Neutral => &["sleepwell lighting", "sleepwell focus"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingSuggestion {
    BrightMorning,
    NaturalDaylight,
    WarmAfternoon,
    DimWarm,
    MinimalRed,
    Neutral,
}

impl LightingSuggestion {
    pub fn title(self) -> &'static str {
        match self {
            LightingSuggestion::BrightMorning => "Bright Morning Light",
            LightingSuggestion::NaturalDaylight => "Natural Daylight",
            LightingSuggestion::WarmAfternoon => "Warm Afternoon Light",
            LightingSuggestion::DimWarm => "Dim Warm Light",
            LightingSuggestion::MinimalRed => "Minimal Red Light",
            LightingSuggestion::Neutral => "Neutral Lighting",
        }
    }

    pub fn detail(self) -> &'static str {
        match self {
            LightingSuggestion::BrightMorning => {
                "Expose yourself to bright light (10,000 lux) within 2 hours of waking. Natural sunlight is ideal."
            }
            LightingSuggestion::NaturalDaylight => {
                "Maintain a bright environment. Let sunlight in or work near a window."
            }
            LightingSuggestion::WarmAfternoon => {
                "Begin transitioning to warmer light (3000K-4000K). Avoid harsh overhead lighting."
            }
            LightingSuggestion::DimWarm => {
                "Use warm white lighting (2700K). Reduce screen use and lower overall brightness."
            }
            LightingSuggestion::MinimalRed => {
                "If you need light, use dim red lighting. Ideally, sleep in full darkness."
            }
            LightingSuggestion::Neutral => "Adjust lighting based on comfort and task needs.",
        }
    }
}

/// Horizontal bar chart of an energy curve, one row per hour.
pub fn render_ascii_chart(chronotype: Chronotype, highlight_hour: Option<u8>) -> String {
    let curve = chronotype.energy_curve();
    let profile = chronotype.profile();
    let mut output = format!("\n{} Energy Curve:\n", profile.name);
    output.push_str(&"─".repeat(44));
    output.push('\n');

    for (hour, &energy) in curve.iter().enumerate() {
        let hour = hour as u8;
        let bar_length = energy as usize * 30 / 100;
        let marker = if profile.peak_hours.contains(&hour) {
            "▲"
        } else if profile.low_hours.contains(&hour) {
            "▼"
        } else {
            " "
        };
        let cursor = if highlight_hour == Some(hour) { "◀ now" } else { "" };
        output.push_str(&format!(
            "{:02}:00 {}{} {} {:>3}% {}\n",
            hour,
            "█".repeat(bar_length),
            " ".repeat(30 - bar_length),
            marker,
            energy,
            cursor
        ));
    }

    output.push_str(&"─".repeat(44));
    output.push_str("\n▲ Peak  ▼ Low\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn energy_curve_adjusts_by_chronotype() {
        let lion = Chronotype::Lion.energy_curve();
        assert_eq!(lion[8], 100);
        assert_eq!(lion[3], 10);
        assert_eq!(lion[22], 10);
        assert_eq!(lion[12], 60);

        let wolf = Chronotype::Wolf.energy_curve();
        assert_eq!(wolf[16], 100);
        assert_eq!(wolf[7], 60);

        let dolphin = Chronotype::Dolphin.energy_curve();
        assert_eq!(dolphin[13], 35);
        assert_eq!(dolphin[10], 90);
    }

    #[test]
    fn energy_curve_stays_in_range() {
        for chronotype in Chronotype::ALL {
            for energy in chronotype.energy_curve() {
                assert!((MIN_ENERGY..=MAX_ENERGY).contains(&energy));
            }
        }
    }

    #[test]
    fn morning_light_beats_peak_hours() {
        // 06:00 is a lion peak hour but also within two hours of waking.
        assert_eq!(Chronotype::Lion.advice(t("06:00")), Advice::MorningLight);
        assert_eq!(Chronotype::Lion.advice(t("07:30")), Advice::PeakAlertness);
    }

    #[test]
    fn bear_day() {
        let bear = Chronotype::Bear;
        assert_eq!(bear.advice(t("07:15")), Advice::MorningLight);
        assert_eq!(bear.advice(t("10:00")), Advice::PeakAlertness);
        assert_eq!(bear.advice(t("13:10")), Advice::EnergyDip);
        assert_eq!(bear.advice(t("12:00")), Advice::Neutral);
        assert_eq!(bear.advice(t("20:30")), Advice::WindDown);
        // 21:00 is a low hour, which wins over wind-down.
        assert_eq!(bear.advice(t("21:30")), Advice::EnergyDip);
        assert_eq!(bear.advice(t("23:00")), Advice::SleepTime);
        assert_eq!(bear.advice(t("03:00")), Advice::SleepTime);
    }

    #[test]
    fn wolf_sleeps_past_midnight() {
        let wolf = Chronotype::Wolf;
        assert_eq!(wolf.advice(t("02:00")), Advice::SleepTime);
        assert_eq!(wolf.advice(t("23:00")), Advice::Neutral);
        assert_eq!(wolf.lighting_suggestion(t("00:30")), LightingSuggestion::MinimalRed);
    }

    #[test]
    fn lighting_through_the_day() {
        let bear = Chronotype::Bear;
        assert_eq!(bear.lighting_suggestion(t("08:00")), LightingSuggestion::BrightMorning);
        assert_eq!(bear.lighting_suggestion(t("10:00")), LightingSuggestion::NaturalDaylight);
        assert_eq!(bear.lighting_suggestion(t("13:30")), LightingSuggestion::Neutral);
        assert_eq!(bear.lighting_suggestion(t("18:00")), LightingSuggestion::WarmAfternoon);
        assert_eq!(bear.lighting_suggestion(t("21:00")), LightingSuggestion::DimWarm);
        assert_eq!(bear.lighting_suggestion(t("22:00")), LightingSuggestion::MinimalRed);
    }

    #[test]
    fn parses_chronotype_names() {
        assert_eq!("DOLPHIN".parse::<Chronotype>().unwrap(), Chronotype::Dolphin);
        assert!("owl".parse::<Chronotype>().is_err());
    }

    #[test]
    fn chart_marks_current_hour() {
        let chart = render_ascii_chart(Chronotype::Bear, Some(9));
        assert!(chart.contains("Bear Energy Curve"));
        let row = chart.lines().find(|l| l.starts_with("09:00")).unwrap();
        assert!(row.contains("◀ now"));
        assert!(row.contains('▲'));
        assert_eq!(chart.lines().filter(|l| l.contains(":00 ")).count(), 24);
    }
}
