//! Audio Stream Management
//!
//! Handles the low-level CPAL stream setup and real-time audio callbacks.
//!
//! ```text
//!   Input device ──capture cb──▶ rtrb ring ──output cb──▶ EQ ──▶ Output device
//! ```
//!
//! The output callback reads the shared parameter store once per buffer and
//! hands the snapshot to the equalizer, which redesigns coefficients only
//! when something changed. Neither callback sends events: ring overruns,
//! underruns and meter peaks land in atomics that the control thread polls.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig as CpalStreamConfig};
use crossbeam_channel::Sender;
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::info;

use crate::config::{EngineConfig, StreamConfig};
use crate::error::{EngineError, EngineResult};
use crate::message::Event;
use crate::params::SharedParameters;
use trident_dsp::EqualizerEngine;

/// Shared state between the output callback and the control thread
#[derive(Debug)]
pub struct StreamState {
    /// Whether processing is bypassed
    pub bypassed: AtomicBool,

    /// Peak level left channel (f32 bits, for meters)
    peak_left_bits: AtomicU32,

    /// Peak level right channel
    peak_right_bits: AtomicU32,

    /// Output buffers that found the ring short of samples
    underruns: AtomicU64,

    /// Capture buffers that found the ring full
    overruns: AtomicU64,
}

/// Cumulative counters of a running stream, read by the control thread
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StreamStatus {
    pub peaks: (f32, f32),
    pub rejected: u64,
    pub underruns: u64,
    pub overruns: u64,
}

impl StreamState {
    pub fn new() -> Self {
        Self {
            bypassed: AtomicBool::new(false),
            peak_left_bits: AtomicU32::new(0.0_f32.to_bits()),
            peak_right_bits: AtomicU32::new(0.0_f32.to_bits()),
            underruns: AtomicU64::new(0),
            overruns: AtomicU64::new(0),
        }
    }

    pub fn set_peaks(&self, left: f32, right: f32) {
        self.peak_left_bits.store(left.to_bits(), Ordering::Relaxed);
        self.peak_right_bits.store(right.to_bits(), Ordering::Relaxed);
    }

    pub fn peaks(&self) -> (f32, f32) {
        (
            f32::from_bits(self.peak_left_bits.load(Ordering::Relaxed)),
            f32::from_bits(self.peak_right_bits.load(Ordering::Relaxed)),
        )
    }

    pub fn record_underrun(&self) {
        self.underruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }
}

impl Default for StreamState {
    fn default() -> Self {
        Self::new()
    }
}

/// Peak absolute value of the first two channels of an interleaved buffer
///
/// Mono buffers report the same level on both sides.
pub fn peak_levels(data: &[f32], channels: usize) -> (f32, f32) {
    if channels == 0 {
        return (0.0, 0.0);
    }
    data.chunks_exact(channels)
        .fold((0.0_f32, 0.0_f32), |(l, r), frame| {
            let left = frame[0].abs();
            let right = frame.get(1).map_or(left, |s| s.abs());
            (l.max(left), r.max(right))
        })
}

/// Capture callback body: queue one input buffer for playback
///
/// Samples that do not fit are dropped and the buffer counts as an overrun.
fn push_capture(producer: &mut Producer<f32>, data: &[f32], state: &StreamState) {
    let written = producer
        .write_chunk_uninit(data.len())
        .map_or(0, |chunk| chunk.fill_from_iter(data.iter().copied()));
    if written < data.len() {
        state.record_overrun();
    }
}

/// Output callback body: fill `data` from the ring
///
/// A short ring pads with silence and counts as an underrun.
fn pull_playback(consumer: &mut Consumer<f32>, data: &mut [f32], state: &StreamState) {
    let to_read = data.len().min(consumer.slots());
    if to_read < data.len() {
        data.fill(0.0);
        state.record_underrun();
    }

    if let Ok(chunk) = consumer.read_chunk(to_read) {
        let (first, second) = chunk.as_slices();
        data[..first.len()].copy_from_slice(first);
        data[first.len()..first.len() + second.len()].copy_from_slice(second);
        chunk.commit_all();
    }
}

/// DSP half of the output callback
///
/// Owns the equalizer for the lifetime of the stream. Kept separate from the
/// CPAL closure so it can be driven without audio hardware.
///
/// # Real-time Safety
/// `process` performs NO allocations and NO syscalls.
pub struct OutputProcessor {
    engine: EqualizerEngine,
    params: Arc<SharedParameters>,
    state: Arc<StreamState>,
    channels: usize,
}

impl OutputProcessor {
    pub fn new(
        config: &StreamConfig,
        params: Arc<SharedParameters>,
        state: Arc<StreamState>,
    ) -> EngineResult<Self> {
        let mut engine = EqualizerEngine::new();
        engine.prepare(config.sample_rate as f32, config.buffer_size as usize)?;

        Ok(Self {
            engine,
            params,
            state,
            channels: config.channels as usize,
        })
    }

    /// Handle to the equalizer's rejected-coefficient count
    pub fn rejection_counter(&self) -> Arc<AtomicU64> {
        self.engine.rejection_counter()
    }

    /// Filter one interleaved callback buffer in place and publish its peaks
    #[inline]
    pub fn process(&mut self, data: &mut [f32]) {
        if !self.state.bypassed.load(Ordering::Relaxed) {
            let settings = self.params.snapshot();
            self.engine
                .process_interleaved(data, self.channels, &settings);
        }

        let (left, right) = peak_levels(data, self.channels);
        self.state.set_peaks(left, right);
    }
}

/// Manages an active capture → EQ → playback stream pair
pub struct AudioStream {
    /// The underlying CPAL streams (kept alive to maintain audio flow)
    #[allow(dead_code)]
    capture_stream: Stream,

    #[allow(dead_code)]
    output_stream: Stream,

    /// Shared state for atomic updates from control thread
    pub state: Arc<StreamState>,

    /// Coefficient sets the equalizer rejected since the stream started
    rejected: Arc<AtomicU64>,

    /// Current stream configuration
    pub config: StreamConfig,
}

impl AudioStream {
    /// Build and start both streams
    ///
    /// # Arguments
    ///
    /// * `config` - Engine configuration (stream format and ring size)
    /// * `capture_device` - The device to capture audio FROM
    /// * `output_device` - The device to output processed audio TO
    /// * `params` - Parameter store the output callback snapshots every buffer
    /// * `event_sender` - Channel for stream errors reported by CPAL
    pub fn new(
        config: &EngineConfig,
        capture_device: &Device,
        output_device: &Device,
        params: Arc<SharedParameters>,
        event_sender: Sender<Event>,
    ) -> EngineResult<Self> {
        config.validate()?;

        let state = Arc::new(StreamState::new());
        let processor = OutputProcessor::new(&config.stream, params, Arc::clone(&state))?;
        let rejected = processor.rejection_counter();

        // Ring buffer for passing audio between capture and output callbacks
        let (producer, consumer) = RingBuffer::<f32>::new(config.ring_buffer_samples());

        let cpal_config = CpalStreamConfig {
            channels: config.stream.channels,
            sample_rate: cpal::SampleRate(config.stream.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.stream.buffer_size),
        };

        let capture_stream = Self::build_capture_stream(
            capture_device,
            &cpal_config,
            producer,
            Arc::clone(&state),
            event_sender.clone(),
        )?;
        let output_stream = Self::build_output_stream(
            output_device,
            &cpal_config,
            consumer,
            processor,
            event_sender,
        )?;

        // Start both streams
        capture_stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;
        output_stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;

        info!(
            "Streams running: {} Hz, {} ch, {} frames ({:.1} ms)",
            config.stream.sample_rate,
            config.stream.channels,
            config.stream.buffer_size,
            config.stream.latency_ms()
        );

        Ok(Self {
            capture_stream,
            output_stream,
            state,
            rejected,
            config: config.stream.clone(),
        })
    }

    fn build_capture_stream(
        device: &Device,
        config: &CpalStreamConfig,
        mut producer: Producer<f32>,
        state: Arc<StreamState>,
        error_sender: Sender<Event>,
    ) -> EngineResult<Stream> {
        device
            .build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Real-time audio callback - NO allocations allowed here
                    push_capture(&mut producer, data, &state);
                },
                move |err| {
                    let _ = error_sender.try_send(Event::error(err));
                },
                None, // No timeout
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))
    }

    fn build_output_stream(
        device: &Device,
        config: &CpalStreamConfig,
        mut consumer: Consumer<f32>,
        mut processor: OutputProcessor,
        error_sender: Sender<Event>,
    ) -> EngineResult<Stream> {
        let state = Arc::clone(&processor.state);

        device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // Real-time audio callback - NO allocations allowed here
                    pull_playback(&mut consumer, data, &state);
                    processor.process(data);
                },
                move |err| {
                    let _ = error_sender.try_send(Event::error(err));
                },
                None,
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))
    }

    /// Get current peak levels (for meters)
    pub fn peaks(&self) -> (f32, f32) {
        self.state.peaks()
    }

    /// Set bypass state
    pub fn set_bypass(&self, bypassed: bool) {
        self.state.bypassed.store(bypassed, Ordering::Relaxed);
    }

    pub fn is_bypassed(&self) -> bool {
        self.state.bypassed.load(Ordering::Relaxed)
    }

    /// Total coefficient sets rejected since the stream started
    pub fn rejected_updates(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Meter peaks plus the cumulative rejection and xrun counts
    pub fn status(&self) -> StreamStatus {
        StreamStatus {
            peaks: self.state.peaks(),
            rejected: self.rejected_updates(),
            underruns: self.state.underruns(),
            overruns: self.state.overruns(),
        }
    }
}
