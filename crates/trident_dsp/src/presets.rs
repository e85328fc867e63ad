//! Built-in EQ Presets

use crate::settings::{ChainSettings, Slope};

/// Named parameter snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub settings: ChainSettings,
}

const FLAT: ChainSettings = ChainSettings {
    peak_freq: 750.0,
    peak_gain_db: 0.0,
    peak_quality: 1.0,
    low_cut_freq: 20.0,
    high_cut_freq: 20000.0,
    low_cut_slope: Slope::Db12,
    high_cut_slope: Slope::Db12,
};

/// List of built-in presets
pub const PRESETS: &[Preset] = &[
    Preset {
        name: "Flat",
        settings: FLAT,
    },
    Preset {
        name: "Rumble Cut",
        settings: ChainSettings {
            low_cut_freq: 80.0,
            low_cut_slope: Slope::Db24,
            ..FLAT
        },
    },
    Preset {
        name: "Telephone",
        settings: ChainSettings {
            peak_freq: 1500.0,
            peak_gain_db: 4.0,
            peak_quality: 0.7,
            low_cut_freq: 300.0,
            high_cut_freq: 3400.0,
            low_cut_slope: Slope::Db48,
            high_cut_slope: Slope::Db48,
        },
    },
    Preset {
        name: "Presence",
        settings: ChainSettings {
            peak_freq: 3000.0,
            peak_gain_db: 4.0,
            peak_quality: 0.8,
            low_cut_freq: 40.0,
            ..FLAT
        },
    },
    Preset {
        name: "De-Mud",
        settings: ChainSettings {
            peak_freq: 300.0,
            peak_gain_db: -4.5,
            peak_quality: 1.2,
            low_cut_freq: 60.0,
            low_cut_slope: Slope::Db24,
            ..FLAT
        },
    },
    Preset {
        name: "Air",
        settings: ChainSettings {
            peak_freq: 12000.0,
            peak_gain_db: 3.0,
            peak_quality: 0.5,
            low_cut_freq: 30.0,
            ..FLAT
        },
    },
];

/// Look up a preset by name, ignoring ASCII case
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
