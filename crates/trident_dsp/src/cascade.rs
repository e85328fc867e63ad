//! Cascaded Cut Filter
//!
//! Four biquad sections in series. The slope setting decides how many of
//! them run: a contiguous prefix starting at section 0 is active and the
//! remainder is bypassed. Bypassed sections keep both their coefficients and
//! their history, so raising the slope later continues smoothly.

use crate::coefficients::{CoefficientSet, SectionSet, MAX_SECTIONS};
use crate::error::DspError;
use crate::processor::FilterStage;
use crate::stage::BiquadStage;

/// Up to four cascaded sections modelling one 12-48 dB/oct slope
#[derive(Debug, Clone)]
pub struct CascadeFilter {
    stages: [BiquadStage; MAX_SECTIONS],
    bypassed: bool,
}

impl Default for CascadeFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl CascadeFilter {
    /// All sections bypassed until the first `configure`
    pub fn new() -> Self {
        let mut stages = [BiquadStage::default(); MAX_SECTIONS];
        for stage in stages.iter_mut() {
            stage.set_bypassed(true);
        }
        Self {
            stages,
            bypassed: false,
        }
    }

    /// Activate sections `0..order` with `sections[0..order]`, bypass the rest
    ///
    /// `order` must be 1-4 and `sections` must hold at least `order` sets;
    /// otherwise nothing changes. A non-finite set is rejected for its
    /// section only: that section stays active on its previous coefficients,
    /// the others are still updated, and the error is returned afterwards.
    pub fn configure(&mut self, sections: &[CoefficientSet], order: usize) -> Result<(), DspError> {
        if !(1..=MAX_SECTIONS).contains(&order) {
            return Err(DspError::InvalidOrder(order));
        }
        if sections.len() < order {
            return Err(DspError::MissingSections {
                order,
                available: sections.len(),
            });
        }

        let mut result = Ok(());
        for (index, stage) in self.stages.iter_mut().enumerate() {
            if index < order {
                if let Err(err) = stage.set_coefficients(sections[index]) {
                    result = Err(err);
                }
                stage.set_bypassed(false);
            } else {
                stage.set_bypassed(true);
            }
        }
        result
    }

    #[inline]
    pub fn process_sample(&mut self, x: f32) -> f32 {
        if self.bypassed {
            return x;
        }
        self.stages
            .iter_mut()
            .fold(x, |acc, stage| stage.process_sample(acc))
    }

    /// Number of sections currently filtering
    pub fn active_stages(&self) -> usize {
        self.stages.iter().filter(|s| !s.is_bypassed()).count()
    }

    pub fn is_stage_active(&self, index: usize) -> bool {
        self.stages.get(index).is_some_and(|s| !s.is_bypassed())
    }

    pub fn stage(&self, index: usize) -> Option<&BiquadStage> {
        self.stages.get(index)
    }

    /// Bypass or re-enable the cascade as a whole; per-section flags are kept
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }

    pub fn snap_to_zero(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.snap_to_zero();
        }
    }

    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f64 {
        if self.bypassed {
            return 1.0;
        }
        self.stages
            .iter()
            .map(|s| s.magnitude_at(freq, sample_rate))
            .product()
    }
}

impl FilterStage for CascadeFilter {
    type Design = SectionSet;

    fn configure(&mut self, design: &SectionSet) -> Result<(), DspError> {
        CascadeFilter::configure(self, design.as_slice(), design.len())
    }

    fn process_sample(&mut self, x: f32) -> f32 {
        CascadeFilter::process_sample(self, x)
    }

    fn set_bypassed(&mut self, bypassed: bool) {
        CascadeFilter::set_bypassed(self, bypassed);
    }

    fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    fn reset(&mut self) {
        CascadeFilter::reset(self);
    }

    fn snap_to_zero(&mut self) {
        CascadeFilter::snap_to_zero(self);
    }

    fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f64 {
        CascadeFilter::magnitude_at(self, freq, sample_rate)
    }
}
