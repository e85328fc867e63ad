//! DSP Error Types

use thiserror::Error;

/// Errors that can occur during DSP operations
///
/// Every variant carries only `Copy` data so that returning one from the
/// audio thread never allocates.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DspError {
    #[error("Sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    #[error("Maximum block size must be at least one sample, got {0}")]
    InvalidBlockSize(usize),

    #[error("Invalid cascade order: {0} (must be 1-4)")]
    InvalidOrder(usize),

    #[error("Cascade order {order} needs {order} coefficient sets, got {available}")]
    MissingSections { order: usize, available: usize },

    #[error("Rejected non-finite filter coefficients (stage kept its previous set)")]
    NonFiniteCoefficients,
}
