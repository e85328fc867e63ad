//! Single Biquad Section
//!
//! Direct Form I second-order IIR filter with its own delay line.
//! Coefficients can be swapped while audio is running without touching the
//! delay line, which keeps the output continuous across parameter changes.

use crate::coefficients::CoefficientSet;
use crate::error::DspError;
use crate::processor::FilterStage;

/// One second-order section
///
/// Two states: active (filters) and bypassed (identity). A bypassed stage
/// does not advance its delay line, so re-activating it later resumes from
/// the history it had.
#[derive(Debug, Clone, Copy)]
pub struct BiquadStage {
    coefficients: CoefficientSet,
    bypassed: bool,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Default for BiquadStage {
    fn default() -> Self {
        Self::new(CoefficientSet::UNITY)
    }
}

impl BiquadStage {
    pub fn new(coefficients: CoefficientSet) -> Self {
        Self {
            coefficients,
            bypassed: false,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Install a new coefficient set, keeping the delay line
    ///
    /// Non-finite sets are rejected and the previous set stays in place.
    #[inline]
    pub fn set_coefficients(&mut self, coefficients: CoefficientSet) -> Result<(), DspError> {
        if !coefficients.is_finite() {
            return Err(DspError::NonFiniteCoefficients);
        }
        self.coefficients = coefficients;
        Ok(())
    }

    pub fn coefficients(&self) -> &CoefficientSet {
        &self.coefficients
    }

    #[inline]
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// `y = b0*x + b1*x1 + b2*x2 - a1*y1 - a2*y2`
    ///
    /// # Real-time Safety
    /// No allocations, no branches beyond the bypass check.
    #[inline]
    pub fn process_sample(&mut self, x: f32) -> f32 {
        if self.bypassed {
            return x;
        }

        let c = &self.coefficients;
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y
    }

    /// Clear the delay line (stream start / sample-rate change only)
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Flush subnormal delay-line values to zero
    ///
    /// Called once per block. A decaying tail otherwise lingers in the
    /// subnormal range where every multiply is dramatically slower.
    #[inline]
    pub fn snap_to_zero(&mut self) {
        for v in [&mut self.x1, &mut self.x2, &mut self.y1, &mut self.y2] {
            if !v.is_normal() {
                *v = 0.0;
            }
        }
    }

    /// Current delay line as `[x1, x2, y1, y2]`
    pub fn state(&self) -> [f32; 4] {
        [self.x1, self.x2, self.y1, self.y2]
    }

    /// Linear magnitude at `freq`; unity while bypassed
    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f64 {
        if self.bypassed {
            1.0
        } else {
            self.coefficients.magnitude_at(freq, sample_rate)
        }
    }
}

impl FilterStage for BiquadStage {
    type Design = CoefficientSet;

    fn configure(&mut self, design: &CoefficientSet) -> Result<(), DspError> {
        self.set_coefficients(*design)
    }

    fn process_sample(&mut self, x: f32) -> f32 {
        BiquadStage::process_sample(self, x)
    }

    fn set_bypassed(&mut self, bypassed: bool) {
        BiquadStage::set_bypassed(self, bypassed);
    }

    fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    fn reset(&mut self) {
        BiquadStage::reset(self);
    }

    fn snap_to_zero(&mut self) {
        BiquadStage::snap_to_zero(self);
    }

    fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f64 {
        BiquadStage::magnitude_at(self, freq, sample_rate)
    }
}
