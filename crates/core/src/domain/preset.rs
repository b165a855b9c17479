//! Built-in sound presets
//!
//! A preset is a named color/bass/treble triple. Volume and power are never
//! part of a preset.

use serde::Serialize;

/// Name reported when the settings were tuned by hand
pub const CUSTOM_PRESET: &str = "Custom";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub color: f64,
    pub bass: f64,
    pub treble: f64,
}

impl Preset {
    const fn new(name: &'static str, color: f64, bass: f64, treble: f64) -> Self {
        Self {
            name,
            color,
            bass,
            treble,
        }
    }
}

pub const PRESETS: [Preset; 11] = [
    Preset::new("Womb Sounds", 5.0, 80.0, -60.0),
    Preset::new("Deep Sleep", 12.0, 50.0, -40.0),
    Preset::new("Shushing", 30.0, -20.0, 30.0),
    Preset::new("Fan Noise", 45.0, 40.0, -10.0),
    Preset::new("Gentle Rain", 25.0, 10.0, -20.0),
    Preset::new("Light Sleep", 35.0, 0.0, -30.0),
    Preset::new("Calming Wash", 20.0, 30.0, -50.0),
    Preset::new("Bright Comfort", 55.0, -10.0, 20.0),
    Preset::new("Brown Noise", 0.0, 0.0, 0.0),
    Preset::new("Pink Noise", 25.0, 0.0, 0.0),
    Preset::new("White Noise", 50.0, 0.0, 0.0),
];

/// Look up a preset by exact name
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

/// Every selectable name, ending with [`CUSTOM_PRESET`]
pub fn preset_names() -> Vec<&'static str> {
    PRESETS
        .iter()
        .map(|p| p.name)
        .chain(std::iter::once(CUSTOM_PRESET))
        .collect()
}
