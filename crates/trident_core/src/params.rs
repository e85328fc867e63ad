//! Lock-free Parameter Store
//!
//! Written by the control thread, read by the audio callback once per
//! buffer. Every field is its own atomic, so a snapshot taken while the
//! control thread is mid-update may mix old and new fields; the next
//! callback picks up the rest.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use trident_dsp::{
    ChainSettings, Slope, HIGH_CUT_FREQ, LOW_CUT_FREQ, PEAK_FREQ, PEAK_GAIN, PEAK_QUALITY,
};

/// `f32` stored as its bit pattern
///
/// Rust pattern: AtomicF32 doesn't exist, so we use bit-casting
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Current EQ parameters shared between threads
#[derive(Debug)]
pub struct SharedParameters {
    peak_freq: AtomicF32,
    peak_gain_db: AtomicF32,
    peak_quality: AtomicF32,
    low_cut_freq: AtomicF32,
    high_cut_freq: AtomicF32,
    low_cut_slope: AtomicU8,
    high_cut_slope: AtomicU8,
}

impl Default for SharedParameters {
    fn default() -> Self {
        Self::new(&ChainSettings::default())
    }
}

impl SharedParameters {
    pub fn new(settings: &ChainSettings) -> Self {
        let settings = settings.clamped();
        Self {
            peak_freq: AtomicF32::new(settings.peak_freq),
            peak_gain_db: AtomicF32::new(settings.peak_gain_db),
            peak_quality: AtomicF32::new(settings.peak_quality),
            low_cut_freq: AtomicF32::new(settings.low_cut_freq),
            high_cut_freq: AtomicF32::new(settings.high_cut_freq),
            low_cut_slope: AtomicU8::new(settings.low_cut_slope.index()),
            high_cut_slope: AtomicU8::new(settings.high_cut_slope.index()),
        }
    }

    /// Read every field once
    ///
    /// # Real-time Safety
    /// Relaxed loads only; safe to call from the audio callback.
    #[inline]
    pub fn snapshot(&self) -> ChainSettings {
        ChainSettings {
            peak_freq: self.peak_freq.load(),
            peak_gain_db: self.peak_gain_db.load(),
            peak_quality: self.peak_quality.load(),
            low_cut_freq: self.low_cut_freq.load(),
            high_cut_freq: self.high_cut_freq.load(),
            low_cut_slope: Slope::from_index(self.low_cut_slope.load(Ordering::Relaxed)),
            high_cut_slope: Slope::from_index(self.high_cut_slope.load(Ordering::Relaxed)),
        }
    }

    /// Replace every field, clamping into range
    pub fn store(&self, settings: &ChainSettings) {
        self.set_peak_freq(settings.peak_freq);
        self.set_peak_gain_db(settings.peak_gain_db);
        self.set_peak_quality(settings.peak_quality);
        self.set_low_cut_freq(settings.low_cut_freq);
        self.set_high_cut_freq(settings.high_cut_freq);
        self.set_low_cut_slope(settings.low_cut_slope);
        self.set_high_cut_slope(settings.high_cut_slope);
    }

    pub fn set_peak_freq(&self, hz: f32) {
        self.peak_freq.store(PEAK_FREQ.clamp(hz));
    }

    pub fn set_peak_gain_db(&self, db: f32) {
        self.peak_gain_db.store(PEAK_GAIN.clamp(db));
    }

    pub fn set_peak_quality(&self, q: f32) {
        self.peak_quality.store(PEAK_QUALITY.clamp(q));
    }

    pub fn set_low_cut_freq(&self, hz: f32) {
        self.low_cut_freq.store(LOW_CUT_FREQ.clamp(hz));
    }

    pub fn set_high_cut_freq(&self, hz: f32) {
        self.high_cut_freq.store(HIGH_CUT_FREQ.clamp(hz));
    }

    pub fn set_low_cut_slope(&self, slope: Slope) {
        self.low_cut_slope.store(slope.index(), Ordering::Relaxed);
    }

    pub fn set_high_cut_slope(&self, slope: Slope) {
        self.high_cut_slope.store(slope.index(), Ordering::Relaxed);
    }
}
