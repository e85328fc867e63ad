//! Filter Stage Trait
//!
//! Common interface for the building blocks of a channel chain. Stages are
//! composed by value (no boxing), so a chain is a plain struct that the
//! compiler can inline end to end.

use crate::error::DspError;

/// A per-sample filter element that can be reconfigured and bypassed
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `configure`, `process_sample`
/// and `snap_to_zero`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no locks, no logging)
/// - NO unbounded loops
///
/// `configure` must never clear the delay line; only `reset` does that.
pub trait FilterStage: Send {
    /// Coefficient data this stage is configured from
    type Design: ?Sized;

    /// Install a new design. Coefficients that fail validation are rejected
    /// and the stage keeps its previous ones.
    fn configure(&mut self, design: &Self::Design) -> Result<(), DspError>;

    fn process_sample(&mut self, x: f32) -> f32;

    fn set_bypassed(&mut self, bypassed: bool);

    fn is_bypassed(&self) -> bool;

    /// Clear internal history (stream start only)
    fn reset(&mut self);

    /// Flush subnormal history values to zero (once per block)
    fn snap_to_zero(&mut self);

    /// Linear magnitude response at `freq`
    fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f64;

    /// Process a buffer in place, then flush subnormals
    #[inline]
    fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
        self.snap_to_zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test stage that scales audio by a configurable factor
    struct ScaleStage {
        factor: f32,
        bypassed: bool,
    }

    impl FilterStage for ScaleStage {
        type Design = f32;

        fn configure(&mut self, design: &f32) -> Result<(), DspError> {
            if !design.is_finite() {
                return Err(DspError::NonFiniteCoefficients);
            }
            self.factor = *design;
            Ok(())
        }

        fn process_sample(&mut self, x: f32) -> f32 {
            if self.bypassed {
                x
            } else {
                x * self.factor
            }
        }

        fn set_bypassed(&mut self, bypassed: bool) {
            self.bypassed = bypassed;
        }

        fn is_bypassed(&self) -> bool {
            self.bypassed
        }

        fn reset(&mut self) {}

        fn snap_to_zero(&mut self) {}

        fn magnitude_at(&self, _freq: f32, _sample_rate: f32) -> f64 {
            f64::from(self.factor.abs())
        }
    }

    #[test]
    fn test_default_process_block() {
        let mut stage = ScaleStage {
            factor: -2.0,
            bypassed: false,
        };
        let mut buffer = vec![0.5, -0.25, 1.0];
        stage.process_block(&mut buffer);
        assert_eq!(buffer, vec![-1.0, 0.5, -2.0]);
    }

    #[test]
    fn test_bypassed_block_untouched() {
        let mut stage = ScaleStage {
            factor: 3.0,
            bypassed: false,
        };
        stage.set_bypassed(true);
        let mut buffer = vec![0.5, -0.5];
        stage.process_block(&mut buffer);
        assert_eq!(buffer, vec![0.5, -0.5]);
    }

    #[test]
    fn test_configure_rejects_invalid() {
        let mut stage = ScaleStage {
            factor: 1.5,
            bypassed: false,
        };
        assert!(stage.configure(&f32::NAN).is_err());
        assert_eq!(stage.factor, 1.5);
        assert!(stage.configure(&0.5).is_ok());
        assert_eq!(stage.magnitude_at(1000.0, 48000.0), 0.5);
    }
}
