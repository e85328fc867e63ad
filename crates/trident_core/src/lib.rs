//! Trident Core - Standalone Audio Host
//!
//! This crate runs the Trident equalizer on live audio:
//! - Audio device lookup and stream management (via CPAL)
//! - Lock-free parameter store shared with the audio callback
//! - Control thread driven by commands, reporting through events
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Caller Thread                         │
//! │   setters ──▶ SharedParameters     Command ──▶ ◀── Event    │
//! └─────────────────────────────────────────────────────────────┘
//!                  │ atomics              │ crossbeam-channel
//!                  ▼                      ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Callbacks                        │
//! │   Capture ──rtrb──▶ EqualizerEngine ──▶ Output              │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod device;
mod engine;
mod error;
mod message;
mod params;
mod stream;

pub use config::{EngineConfig, StreamConfig};
pub use device::{find_device, AudioDevice, DeviceType};
pub use engine::AudioEngine;
pub use error::{EngineError, EngineResult};
pub use message::{Command, Event};
pub use params::SharedParameters;
pub use stream::{peak_levels, AudioStream, OutputProcessor, StreamState, StreamStatus};

// Re-export DSP types for convenience
pub use trident_dsp::{find_preset, ChainSettings, EqualizerEngine, Preset, Slope, PRESETS};
