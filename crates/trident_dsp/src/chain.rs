//! Per-Channel Filter Chain
//!
//! LowCut → Peak → HighCut in fixed order. One chain per audio channel; the
//! engine designs coefficients once and copies them into every chain.

use crate::cascade::CascadeFilter;
use crate::coefficients::{
    make_butterworth_cascade, make_peak_coefficients, CoefficientSet, FilterKind, SectionSet,
};
use crate::error::DspError;
use crate::processor::FilterStage;
use crate::settings::ChainSettings;
use crate::stage::BiquadStage;

/// Position of a stage inside a [`ChannelChain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    LowCut,
    Peak,
    HighCut,
}

impl ChainPosition {
    pub const ALL: [ChainPosition; 3] = [
        ChainPosition::LowCut,
        ChainPosition::Peak,
        ChainPosition::HighCut,
    ];
}

/// Every coefficient a chain needs for one parameter snapshot
///
/// Plain values: designing never allocates and installing copies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainCoefficients {
    pub low_cut: SectionSet,
    pub peak: CoefficientSet,
    pub high_cut: SectionSet,
}

impl ChainCoefficients {
    /// Run the factory for all three positions
    pub fn design(settings: &ChainSettings, sample_rate: f32) -> Self {
        Self {
            low_cut: make_butterworth_cascade(
                settings.low_cut_freq,
                sample_rate,
                settings.low_cut_slope.butterworth_order(),
                FilterKind::HighPass,
            ),
            peak: make_peak_coefficients(
                sample_rate,
                settings.peak_freq,
                settings.peak_quality,
                settings.peak_gain_db,
            ),
            high_cut: make_butterworth_cascade(
                settings.high_cut_freq,
                sample_rate,
                settings.high_cut_slope.butterworth_order(),
                FilterKind::LowPass,
            ),
        }
    }
}

/// One channel's LowCut → Peak → HighCut path
#[derive(Debug, Clone, Default)]
pub struct ChannelChain {
    low_cut: CascadeFilter,
    peak: BiquadStage,
    high_cut: CascadeFilter,
}

impl ChannelChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Design and install coefficients for `settings`
    pub fn configure(&mut self, settings: &ChainSettings, sample_rate: f32) -> Result<(), DspError> {
        self.apply(&ChainCoefficients::design(settings, sample_rate))
    }

    /// Install a precomputed design into all three positions
    ///
    /// Every position is updated even if an earlier one rejects its
    /// coefficients; the first error is returned.
    pub fn apply(&mut self, design: &ChainCoefficients) -> Result<(), DspError> {
        let low = FilterStage::configure(&mut self.low_cut, &design.low_cut);
        let peak = self.peak.set_coefficients(design.peak);
        let high = FilterStage::configure(&mut self.high_cut, &design.high_cut);
        low.and(peak).and(high)
    }

    #[inline]
    pub fn process_sample(&mut self, x: f32) -> f32 {
        let y = self.low_cut.process_sample(x);
        let y = self.peak.process_sample(y);
        self.high_cut.process_sample(y)
    }

    /// Filter a block in place, then flush subnormal state
    pub fn process(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
        self.snap_to_zero();
    }

    pub fn set_bypassed(&mut self, position: ChainPosition, bypassed: bool) {
        match position {
            ChainPosition::LowCut => self.low_cut.set_bypassed(bypassed),
            ChainPosition::Peak => self.peak.set_bypassed(bypassed),
            ChainPosition::HighCut => self.high_cut.set_bypassed(bypassed),
        }
    }

    pub fn is_bypassed(&self, position: ChainPosition) -> bool {
        match position {
            ChainPosition::LowCut => self.low_cut.is_bypassed(),
            ChainPosition::Peak => self.peak.is_bypassed(),
            ChainPosition::HighCut => self.high_cut.is_bypassed(),
        }
    }

    pub fn low_cut(&self) -> &CascadeFilter {
        &self.low_cut
    }

    pub fn peak(&self) -> &BiquadStage {
        &self.peak
    }

    pub fn high_cut(&self) -> &CascadeFilter {
        &self.high_cut
    }

    pub fn reset(&mut self) {
        self.low_cut.reset();
        self.peak.reset();
        self.high_cut.reset();
    }

    pub fn snap_to_zero(&mut self) {
        self.low_cut.snap_to_zero();
        self.peak.snap_to_zero();
        self.high_cut.snap_to_zero();
    }

    /// Linear magnitude of the whole chain at `freq`
    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f64 {
        self.low_cut.magnitude_at(freq, sample_rate)
            * self.peak.magnitude_at(freq, sample_rate)
            * self.high_cut.magnitude_at(freq, sample_rate)
    }
}
