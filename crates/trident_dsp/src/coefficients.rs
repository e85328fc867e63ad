//! Filter Coefficient Design
//!
//! Pure functions that turn frequency/gain/Q/order parameters into
//! normalized second-order section coefficients. Nothing here allocates or
//! holds state, so designs can be computed on either the control thread or
//! inline on the audio thread.
//!
//! The peak filter is the `biquad` crate's cookbook peaking EQ. Cut filters
//! are Butterworth responses factored into cascaded biquads, each section
//! designed by the same crate with its own pole Q.

use std::f64::consts::PI;

use biquad::{Coefficients, ToHertz, Type};

use crate::settings::{
    MAX_FREQUENCY, MAX_GAIN_DB, MAX_QUALITY, MIN_FREQUENCY, MIN_GAIN_DB, MIN_QUALITY,
};

/// Maximum number of second-order sections a cut filter can use
pub const MAX_SECTIONS: usize = 4;

/// Highest Butterworth order supported (four sections)
pub const MAX_ORDER: usize = 2 * MAX_SECTIONS;

/// Convert decibels to a linear amplitude ratio: `10^(dB/20)`
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear amplitude ratio to decibels
#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.max(1e-12).log10()
}

/// Normalized coefficients of one second-order section (`a0 == 1`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientSet {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for CoefficientSet {
    fn default() -> Self {
        Self::UNITY
    }
}

impl From<Coefficients<f32>> for CoefficientSet {
    fn from(c: Coefficients<f32>) -> Self {
        Self {
            b0: c.b0,
            b1: c.b1,
            b2: c.b2,
            a1: c.a1,
            a2: c.a2,
        }
    }
}

impl CoefficientSet {
    /// Pass-through section
    pub const UNITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    pub fn new(b0: f32, b1: f32, b2: f32, a1: f32, a2: f32) -> Self {
        Self { b0, b1, b2, a1, a2 }
    }

    pub fn is_finite(&self) -> bool {
        self.b0.is_finite()
            && self.b1.is_finite()
            && self.b2.is_finite()
            && self.a1.is_finite()
            && self.a2.is_finite()
    }

    /// Both poles strictly inside the unit circle (stability triangle)
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Linear magnitude response at `freq`
    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f64 {
        let w = 2.0 * PI * f64::from(freq) / f64::from(sample_rate);
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();

        let (b0, b1, b2) = (f64::from(self.b0), f64::from(self.b1), f64::from(self.b2));
        let (a1, a2) = (f64::from(self.a1), f64::from(self.a2));

        let num_re = b0 + b1 * c1 + b2 * c2;
        let num_im = -(b1 * s1 + b2 * s2);
        let den_re = 1.0 + a1 * c1 + a2 * c2;
        let den_im = -(a1 * s1 + a2 * s2);

        (num_re.hypot(num_im)) / (den_re.hypot(den_im)).max(1e-300)
    }
}

/// Response shape of a cut filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Removes content below the cutoff (low-cut)
    HighPass,
    /// Removes content above the cutoff (high-cut)
    LowPass,
}

/// Fixed-capacity list of section coefficients for one cut filter
///
/// Backed by an array so designing a cascade never touches the heap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionSet {
    sections: [CoefficientSet; MAX_SECTIONS],
    len: usize,
}

impl Default for SectionSet {
    fn default() -> Self {
        Self {
            sections: [CoefficientSet::UNITY; MAX_SECTIONS],
            len: 0,
        }
    }
}

impl SectionSet {
    /// `len` pass-through sections
    pub fn unity(len: usize) -> Self {
        Self {
            len: len.min(MAX_SECTIONS),
            ..Default::default()
        }
    }

    fn push(&mut self, section: CoefficientSet) {
        if self.len < MAX_SECTIONS {
            self.sections[self.len] = section;
            self.len += 1;
        }
    }

    pub fn as_slice(&self) -> &[CoefficientSet] {
        &self.sections[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoefficientSet> {
        self.as_slice().iter()
    }
}

/// `freq` lies strictly between DC and Nyquist for a usable sample rate
fn is_designable(freq: f32, sample_rate: f32) -> bool {
    sample_rate.is_finite() && sample_rate > 0.0 && freq > 0.0 && freq < sample_rate / 2.0
}

/// Peaking (bell) filter
///
/// Frequencies outside `(0, sample_rate / 2)` yield [`CoefficientSet::UNITY`].
/// Q and gain are clamped to the parameter ranges before design.
pub fn make_peak_coefficients(sample_rate: f32, freq: f32, q: f32, gain_db: f32) -> CoefficientSet {
    if !is_designable(freq, sample_rate) || !q.is_finite() || !gain_db.is_finite() {
        return CoefficientSet::UNITY;
    }

    let freq = freq.clamp(MIN_FREQUENCY, MAX_FREQUENCY);
    let q = q.clamp(MIN_QUALITY, MAX_QUALITY);
    let gain_db = gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB);

    Coefficients::<f32>::from_params(Type::PeakingEQ(gain_db), sample_rate.hz(), freq.hz(), q)
        .map(CoefficientSet::from)
        .unwrap_or(CoefficientSet::UNITY)
}

fn second_order_section(cutoff: f32, sample_rate: f32, q: f64, kind: FilterKind) -> CoefficientSet {
    let filter = match kind {
        FilterKind::HighPass => Type::HighPass,
        FilterKind::LowPass => Type::LowPass,
    };

    Coefficients::<f32>::from_params(filter, sample_rate.hz(), cutoff.hz(), q as f32)
        .map(CoefficientSet::from)
        .unwrap_or(CoefficientSet::UNITY)
}

/// Butterworth high-pass or low-pass of `order`, factored into biquads
///
/// Returns `ceil(order / 2)` sections. Orders 2, 4, 6 and 8 are the
/// 12/24/36/48 dB/oct slopes; an odd order is rounded up to the next even
/// one. Section `i` of order `N` uses `Q = 1 / (2 cos((2i + 1) π / 2N))`.
///
/// The order is clamped to `1..=8`. A cutoff outside `(0, sample_rate / 2)`
/// produces unity sections, so the cascade degrades to a pass-through.
pub fn make_butterworth_cascade(
    cutoff: f32,
    sample_rate: f32,
    order: usize,
    kind: FilterKind,
) -> SectionSet {
    let section_count = order.clamp(1, MAX_ORDER).div_ceil(2);

    if !is_designable(cutoff, sample_rate) {
        return SectionSet::unity(section_count);
    }
    let cutoff = cutoff.clamp(MIN_FREQUENCY, MAX_FREQUENCY);

    let mut sections = SectionSet::default();
    let n = 2.0 * section_count as f64;
    for i in 0..section_count {
        let q = 1.0 / (2.0 * ((2.0 * i as f64 + 1.0) * PI / (2.0 * n)).cos());
        sections.push(second_order_section(cutoff, sample_rate, q, kind));
    }

    sections
}

/// Magnitude of a whole cascade, product of its sections
pub fn cascade_magnitude_at(sections: &[CoefficientSet], freq: f32, sample_rate: f32) -> f64 {
    sections
        .iter()
        .map(|s| s.magnitude_at(freq, sample_rate))
        .product()
}
