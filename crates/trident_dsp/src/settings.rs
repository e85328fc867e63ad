//! Parameter Layout and Chain Settings
//!
//! The seven values that fully describe the filter chain, together with the
//! ranges, step sizes and defaults the control layer exposes for them.

use serde::{Deserialize, Serialize};

/// Lowest frequency any stage can be tuned to (Hz)
pub const MIN_FREQUENCY: f32 = 20.0;
/// Highest frequency any stage can be tuned to (Hz)
pub const MAX_FREQUENCY: f32 = 20000.0;
/// Peak gain range (dB)
pub const MIN_GAIN_DB: f32 = -24.0;
pub const MAX_GAIN_DB: f32 = 24.0;
/// Peak Q range
pub const MIN_QUALITY: f32 = 0.1;
pub const MAX_QUALITY: f32 = 10.0;

/// Range, step and default of one continuous parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub id: &'static str,
    pub min: f32,
    pub max: f32,
    /// Step size the control layer snaps values to
    pub interval: f32,
    /// Exponent of the normalized mapping; below 1 gives the low end more travel
    pub skew: f32,
    pub default: f32,
    pub unit: &'static str,
}

impl ParameterSpec {
    /// Clamp a raw value into range. NaN maps to the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }

    /// Clamp, then round to the nearest step above `min`
    pub fn snap(&self, value: f32) -> f32 {
        let value = self.clamp(value);
        let steps = ((value - self.min) / self.interval).round();
        (self.min + steps * self.interval).clamp(self.min, self.max)
    }

    /// Map a value to a control position in `[0, 1]`
    pub fn to_normalized(&self, value: f32) -> f32 {
        let proportion = (self.clamp(value) - self.min) / (self.max - self.min);
        if self.skew == 1.0 {
            proportion
        } else {
            proportion.powf(self.skew)
        }
    }

    /// Map a control position in `[0, 1]` back to a value
    pub fn from_normalized(&self, position: f32) -> f32 {
        let position = if position.is_nan() { 0.0 } else { position.clamp(0.0, 1.0) };
        let proportion = if self.skew == 1.0 {
            position
        } else {
            position.powf(self.skew.recip())
        };
        self.min + (self.max - self.min) * proportion
    }
}

pub const LOW_CUT_FREQ: ParameterSpec = ParameterSpec {
    id: "LowCut Freq",
    min: MIN_FREQUENCY,
    max: MAX_FREQUENCY,
    interval: 1.0,
    skew: 0.25,
    default: MIN_FREQUENCY,
    unit: "Hz",
};

pub const HIGH_CUT_FREQ: ParameterSpec = ParameterSpec {
    id: "HighCut Freq",
    min: MIN_FREQUENCY,
    max: MAX_FREQUENCY,
    interval: 1.0,
    skew: 0.25,
    default: MAX_FREQUENCY,
    unit: "Hz",
};

pub const PEAK_FREQ: ParameterSpec = ParameterSpec {
    id: "Peak Freq",
    min: MIN_FREQUENCY,
    max: MAX_FREQUENCY,
    interval: 1.0,
    skew: 0.25,
    default: 750.0,
    unit: "Hz",
};

pub const PEAK_GAIN: ParameterSpec = ParameterSpec {
    id: "Peak Gain",
    min: MIN_GAIN_DB,
    max: MAX_GAIN_DB,
    interval: 0.5,
    skew: 1.0,
    default: 0.0,
    unit: "dB",
};

pub const PEAK_QUALITY: ParameterSpec = ParameterSpec {
    id: "Peak Quality",
    min: MIN_QUALITY,
    max: MAX_QUALITY,
    interval: 0.05,
    skew: 1.0,
    default: 1.0,
    unit: "",
};

/// All continuous parameters, in layout order
pub const PARAMETERS: [ParameterSpec; 5] =
    [LOW_CUT_FREQ, HIGH_CUT_FREQ, PEAK_FREQ, PEAK_GAIN, PEAK_QUALITY];

/// Roll-off steepness of a cut filter
///
/// Each step adds one second-order section (12 dB/octave) to the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Slope {
    #[default]
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Map a choice index (0-3) to a slope; larger indices saturate at 48 dB/oct
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Slope::Db12,
            1 => Slope::Db24,
            2 => Slope::Db36,
            _ => Slope::Db48,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Number of active biquad sections in the cascade (1-4)
    pub fn stages(self) -> usize {
        self as usize + 1
    }

    /// Butterworth filter order realised by this slope (2, 4, 6 or 8)
    pub fn butterworth_order(self) -> usize {
        2 * self.stages()
    }

    pub fn db_per_octave(self) -> u32 {
        12 * self.stages() as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            Slope::Db12 => "12 db/Oct",
            Slope::Db24 => "24 db/Oct",
            Slope::Db36 => "36 db/Oct",
            Slope::Db48 => "48 db/Oct",
        }
    }
}

/// One immutable snapshot of every filter parameter
///
/// Read once per processed block and compared against the last applied
/// snapshot to decide whether coefficients need recomputing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainSettings {
    pub peak_freq: f32,
    pub peak_gain_db: f32,
    pub peak_quality: f32,
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            peak_freq: PEAK_FREQ.default,
            peak_gain_db: PEAK_GAIN.default,
            peak_quality: PEAK_QUALITY.default,
            low_cut_freq: LOW_CUT_FREQ.default,
            high_cut_freq: HIGH_CUT_FREQ.default,
            low_cut_slope: Slope::default(),
            high_cut_slope: Slope::default(),
        }
    }
}

impl ChainSettings {
    /// Bring every field into its declared range
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            peak_freq: PEAK_FREQ.clamp(self.peak_freq),
            peak_gain_db: PEAK_GAIN.clamp(self.peak_gain_db),
            peak_quality: PEAK_QUALITY.clamp(self.peak_quality),
            low_cut_freq: LOW_CUT_FREQ.clamp(self.low_cut_freq),
            high_cut_freq: HIGH_CUT_FREQ.clamp(self.high_cut_freq),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_layout() {
        let settings = ChainSettings::default();
        assert_eq!(settings.low_cut_freq, 20.0);
        assert_eq!(settings.high_cut_freq, 20000.0);
        assert_eq!(settings.peak_freq, 750.0);
        assert_eq!(settings.peak_gain_db, 0.0);
        assert_eq!(settings.peak_quality, 1.0);
        assert_eq!(settings.low_cut_slope, Slope::Db12);
        assert_eq!(settings.high_cut_slope, Slope::Db12);
    }

    #[test]
    fn test_clamped_brings_values_into_range() {
        let settings = ChainSettings {
            peak_freq: 5.0,
            peak_gain_db: 48.0,
            peak_quality: 0.0,
            low_cut_freq: 30000.0,
            high_cut_freq: f32::NAN,
            ..Default::default()
        }
        .clamped();

        assert_eq!(settings.peak_freq, 20.0);
        assert_eq!(settings.peak_gain_db, 24.0);
        assert_eq!(settings.peak_quality, 0.1);
        assert_eq!(settings.low_cut_freq, 20000.0);
        // NaN falls back to the default rather than poisoning the snapshot
        assert_eq!(settings.high_cut_freq, 20000.0);
    }

    #[test]
    fn test_snap_to_interval() {
        assert_eq!(PEAK_GAIN.snap(3.3), 3.5);
        assert_eq!(PEAK_GAIN.snap(-30.0), -24.0);
        assert_eq!(PEAK_FREQ.snap(999.6), 1000.0);
        assert!((PEAK_QUALITY.snap(1.02) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_normalized_mapping() {
        // Frequencies are skewed toward the low end
        assert_eq!(PEAK_FREQ.to_normalized(20.0), 0.0);
        assert_eq!(PEAK_FREQ.to_normalized(20000.0), 1.0);
        assert!((PEAK_FREQ.from_normalized(0.5) - 1268.75).abs() < 0.01);
        assert!(PEAK_FREQ.to_normalized(1000.0) > 0.45);

        for hz in [20.0, 100.0, 1000.0, 12345.0] {
            let back = LOW_CUT_FREQ.from_normalized(LOW_CUT_FREQ.to_normalized(hz));
            assert!((back - hz).abs() < 0.05, "{} -> {}", hz, back);
        }

        // Gain and Q stay linear
        assert_eq!(PEAK_GAIN.to_normalized(0.0), 0.5);
        assert_eq!(PEAK_GAIN.from_normalized(0.75), 12.0);
        assert!((PEAK_QUALITY.from_normalized(2.0) - 10.0).abs() < 1e-5);
        assert_eq!(PEAK_QUALITY.from_normalized(f32::NAN), 0.1);
    }

    #[test]
    fn test_slope_mapping() {
        let stages: Vec<usize> = Slope::ALL.iter().map(|s| s.stages()).collect();
        assert_eq!(stages, vec![1, 2, 3, 4]);

        let orders: Vec<usize> = Slope::ALL.iter().map(|s| s.butterworth_order()).collect();
        assert_eq!(orders, vec![2, 4, 6, 8]);

        assert_eq!(Slope::Db36.db_per_octave(), 36);
        assert_eq!(Slope::Db24.label(), "24 db/Oct");
    }

    #[test]
    fn test_slope_from_index_saturates() {
        for slope in Slope::ALL {
            assert_eq!(Slope::from_index(slope.index()), slope);
        }
        assert_eq!(Slope::from_index(200), Slope::Db48);
    }

    #[test]
    fn test_settings_serialization() {
        let settings = ChainSettings {
            low_cut_slope: Slope::Db48,
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"low_cut_slope\":\"Db48\""));

        let restored: ChainSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, settings);
    }
}
