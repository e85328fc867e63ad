//! Engine Error Types

use thiserror::Error;

/// Errors that can occur in the audio host
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No audio devices found")]
    NoDevicesFound,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    #[error("Failed to play audio stream: {0}")]
    StreamPlayError(String),

    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to spawn control thread: {0}")]
    ThreadSpawnError(String),

    #[error("Engine already running")]
    AlreadyRunning,

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("DSP error: {0}")]
    DspError(#[from] trident_dsp::DspError),

    #[error("Channel send error - receiver dropped")]
    ChannelSendError,
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
