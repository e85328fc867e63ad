//! Engine and Stream Configuration

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Audio stream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of interleaved channels; the EQ filters the first two
    pub channels: u16,

    /// Buffer size in frames (lower = less latency, higher = more stability)
    pub buffer_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            buffer_size: 512,
        }
    }
}

impl StreamConfig {
    /// Calculate latency in milliseconds for this configuration
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Samples in one callback buffer (frames × channels)
    pub fn samples_per_buffer(&self) -> usize {
        self.buffer_size as usize * self.channels as usize
    }

    /// Validate configuration
    pub fn validate(&self) -> EngineResult<()> {
        if self.sample_rate < 8000 || self.sample_rate > 192000 {
            return Err(EngineError::ConfigError(format!(
                "Invalid sample rate: {}",
                self.sample_rate
            )));
        }
        if self.channels == 0 || self.channels > 8 {
            return Err(EngineError::ConfigError(format!(
                "Invalid channel count: {}",
                self.channels
            )));
        }
        if self.buffer_size < 32 || self.buffer_size > 8192 {
            return Err(EngineError::ConfigError(format!(
                "Invalid buffer size: {}",
                self.buffer_size
            )));
        }
        Ok(())
    }
}

/// Overall engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Stream configuration
    pub stream: StreamConfig,

    /// Ring buffer capacity in frames (should be multiple of buffer_size)
    pub ring_buffer_frames: usize,

    /// Start the stream as soon as the engine is created
    pub auto_start: bool,

    /// Capture device name; `None` uses the host default
    #[serde(default)]
    pub input_device: Option<String>,

    /// Playback device name; `None` uses the host default
    #[serde(default)]
    pub output_device: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            // 4 buffers worth of ring buffer capacity
            ring_buffer_frames: 512 * 4,
            auto_start: false,
            input_device: None,
            output_device: None,
        }
    }
}

impl EngineConfig {
    /// Create config optimized for low latency
    pub fn low_latency() -> Self {
        Self {
            stream: StreamConfig {
                sample_rate: 48000,
                channels: 2,
                buffer_size: 128, // ~2.6ms latency
            },
            ring_buffer_frames: 128 * 8,
            ..Default::default()
        }
    }

    /// Create config optimized for stability
    pub fn stable() -> Self {
        Self {
            stream: StreamConfig {
                sample_rate: 48000,
                channels: 2,
                buffer_size: 1024, // ~21ms latency
            },
            ring_buffer_frames: 1024 * 4,
            ..Default::default()
        }
    }

    /// Validate the stream and check the ring holds at least two buffers
    pub fn validate(&self) -> EngineResult<()> {
        self.stream.validate()?;
        if self.ring_buffer_frames < 2 * self.stream.buffer_size as usize {
            return Err(EngineError::ConfigError(format!(
                "Ring buffer of {} frames cannot hold two {}-frame buffers",
                self.ring_buffer_frames, self.stream.buffer_size
            )));
        }
        Ok(())
    }

    /// Ring buffer capacity in samples
    pub fn ring_buffer_samples(&self) -> usize {
        self.ring_buffer_frames * self.stream.channels as usize
    }
}
