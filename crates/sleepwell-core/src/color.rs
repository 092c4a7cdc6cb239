//! Overlay colors and the preset palettes offered for each feature.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An sRGB color, written as `"#RRGGBB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Color dimmed to `brightness` (clamped to 0..=1).
    pub fn scaled(&self, brightness: f64) -> Rgb {
        let k = brightness.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f64 * k).round() as u8;
        Rgb::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Perceived luminance in 0..=255.
    pub fn luminance(&self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }

    /// Readable text color on top of this background.
    pub fn contrast_text(&self) -> Rgb {
        if self.luminance() > 186.0 {
            Rgb::new(0x11, 0x11, 0x11)
        } else {
            Rgb::new(0xff, 0xff, 0xff)
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_string()
    }
}

/// A named color choice.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ColorPreset {
    pub name: &'static str,
    pub color: Rgb,
    pub description: &'static str,
}

const fn preset(name: &'static str, hex: u32, description: &'static str) -> ColorPreset {
    ColorPreset {
        name,
        color: Rgb::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8),
        description,
    }
}

/// Warm colors for winding down before sleep.
pub const SLEEP_COLORS: &[ColorPreset] = &[
    preset("Deep Red", 0xCC0000, "Preserves night vision and melatonin production"),
    preset("Warm Amber", 0xFF8000, "Blocks blue light while providing warm illumination"),
    preset("Sunset Orange", 0xFF4500, "Mimics natural sunset to trigger sleepiness"),
    preset("Candlelight", 0xFF9500, "Soft warm glow like candlelight"),
    preset("Fire Red", 0xB22222, "Deep red used by astronomers to preserve night vision"),
    preset("Ember Glow", 0xDC143C, "Warm red ember-like glow"),
    preset("Soft Coral", 0xFF6B6B, "Gentle coral for sensitive eyes"),
    preset("Dim Orange", 0xFF7F00, "Low-intensity orange for gradual wind-down"),
];

pub const WAKE_COLORS: &[ColorPreset] = &[
    preset("Sunrise Orange", 0xFF6B35, "Natural sunrise simulation"),
    preset("Warm Yellow", 0xFFD700, "Gentle morning light"),
    preset("Soft White", 0xF5F5DC, "Daylight simulation"),
    preset("Sky Blue", 0x87CEEB, "Clear morning sky"),
    preset("Energizing Blue", 0x4169E1, "Alertness boost"),
];

pub const FOCUS_COLORS: &[ColorPreset] = &[
    preset("Deep Focus", 0x1E3A8A, "Deep blue for concentration"),
    preset("Forest Green", 0x166534, "Calming green for sustained focus"),
    preset("Warm Orange", 0xEA580C, "Energizing orange for creativity"),
    preset("Purple Flow", 0x7C3AED, "Purple for deep work sessions"),
    preset("Charcoal", 0x374151, "Neutral gray for minimal distraction"),
    preset("Sunset Red", 0xDC2626, "Warm red for intense focus"),
];

/// Resolve either a `#RRGGBB` value or a preset name (case-insensitive,
/// spaces or dashes) against every palette.
pub fn resolve(value: &str) -> Result<Rgb, ValidationError> {
    if value.trim_start().starts_with('#') {
        return value.parse();
    }
    let wanted = value.trim().replace('-', " ").to_lowercase();
    SLEEP_COLORS
        .iter()
        .chain(WAKE_COLORS)
        .chain(FOCUS_COLORS)
        .find(|p| p.name.to_lowercase() == wanted)
        .map(|p| p.color)
        .ok_or_else(|| ValidationError::InvalidColor(value.to_string()))
}
