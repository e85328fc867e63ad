//! Trident DSP - Three-Stage Parametric EQ
//!
//! This crate provides the audio processing core for Trident:
//! - Low-cut (high-pass) cascade, 12-48 dB/oct Butterworth
//! - Peak/bell filter with gain and Q
//! - High-cut (low-pass) cascade, 12-48 dB/oct Butterworth
//! - Click-free coefficient updates driven by parameter snapshots
//! - Zero-allocation processing path
//!
//! # Architecture
//!
//! Coefficients are designed by pure functions ([`make_peak_coefficients`],
//! [`make_butterworth_cascade`]) and copied by value into each channel's
//! [`ChannelChain`]. The [`EqualizerEngine`] compares each block's snapshot
//! against the last applied one and only redesigns on change. Filter history
//! is never cleared by a coefficient change, only by `prepare`.

mod cascade;
mod chain;
mod coefficients;
mod equalizer;
mod error;
mod presets;
mod processor;
mod settings;
mod stage;

#[cfg(test)]
mod test_signal;

pub use cascade::CascadeFilter;
pub use chain::{ChainCoefficients, ChainPosition, ChannelChain};
pub use coefficients::{
    cascade_magnitude_at, db_to_gain, gain_to_db, make_butterworth_cascade,
    make_peak_coefficients, CoefficientSet, FilterKind, SectionSet, MAX_ORDER, MAX_SECTIONS,
};
pub use equalizer::{EqualizerEngine, CHANNELS};
pub use error::DspError;
pub use presets::{find_preset, Preset, PRESETS};
pub use processor::FilterStage;
pub use settings::{
    ChainSettings, ParameterSpec, Slope, HIGH_CUT_FREQ, LOW_CUT_FREQ, MAX_FREQUENCY, MAX_GAIN_DB,
    MAX_QUALITY, MIN_FREQUENCY, MIN_GAIN_DB, MIN_QUALITY, PARAMETERS, PEAK_FREQ, PEAK_GAIN,
    PEAK_QUALITY,
};
pub use stage::BiquadStage;
