//! Message Types for Thread Communication
//!
//! Commands flow from the caller -> control thread
//! Events flow from the control thread -> caller

use serde::{Deserialize, Serialize};

use trident_dsp::ChainSettings;

/// Commands sent to the control thread
#[derive(Debug, Clone)]
pub enum Command {
    /// Open the configured devices and start processing
    Start,

    /// Stop processing and release the devices
    Stop,

    /// Replace every EQ parameter at once
    SetParameters(ChainSettings),

    /// Load a built-in preset by name
    ApplyPreset(String),

    /// Bypass all processing
    SetBypass(bool),

    /// Request current state (triggers StateUpdate event)
    RequestState,

    /// Shutdown the engine
    Shutdown,
}

/// Events sent back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Stream started successfully
    Started,

    /// Stream stopped
    Stopped,

    /// Error occurred
    Error { message: String },

    /// Audio level update (for meters)
    /// Contains peak levels: (left, right) in range 0.0 - 1.0
    LevelUpdate { left: f32, right: f32 },

    /// Current state snapshot
    StateUpdate {
        is_running: bool,
        is_bypassed: bool,
        settings: ChainSettings,
        input_device: Option<String>,
        output_device: Option<String>,
    },

    /// Output buffers padded with silence since the last report
    BufferUnderrun { count: u64 },

    /// Captured buffers dropped because the ring was full
    BufferOverrun { count: u64 },

    /// The equalizer rejected non-finite coefficients since the last report
    CoefficientsRejected { count: u64 },
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }
}
