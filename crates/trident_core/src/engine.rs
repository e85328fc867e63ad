//! Audio Engine - Main Entry Point
//!
//! The AudioEngine manages the lifecycle of the audio streams and
//! coordinates communication between the caller and the control thread.
//!
//! # Architecture
//!
//! ```text
//!   caller ──Command──▶ control thread ──owns──▶ AudioStream
//!     ▲                      │                       │
//!     └────────Event─────────┴───────────────────────┘
//!
//!   caller ──per-field setters──▶ SharedParameters ◀──snapshot── output callback
//! ```
//!
//! Whole-snapshot changes (`set_parameters`, `apply_preset`) are ordered
//! with the other commands. Single-knob setters skip the thread entirely and
//! write the lock-free store, so the next audio buffer sees them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::DeviceTrait;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::device::{find_device, AudioDevice, DeviceType};
use crate::error::{EngineError, EngineResult};
use crate::message::{Command, Event};
use crate::params::SharedParameters;
use crate::stream::{AudioStream, StreamStatus};
use trident_dsp::{find_preset, ChainSettings, Slope};

/// Poll interval of the control loop (~60 meter updates per second)
const TICK: Duration = Duration::from_millis(16);

/// Meter levels below this are not reported
const LEVEL_FLOOR: f32 = 0.001;

/// Events queued for the caller before new ones are dropped
const EVENT_CAPACITY: usize = 256;

/// The main audio engine controller
///
/// Lives on the caller's thread and talks to the control thread via
/// channels.
pub struct AudioEngine {
    /// Channel for sending commands to the control thread
    command_sender: Sender<Command>,

    /// Channel for receiving events from the control thread and callbacks
    event_receiver: Receiver<Event>,

    /// Handle to the control thread
    control_thread: Option<JoinHandle<()>>,

    /// Flag to signal shutdown
    shutdown_flag: Arc<AtomicBool>,

    /// Current configuration
    config: EngineConfig,

    /// Whether a stream is currently running
    is_running: Arc<AtomicBool>,

    /// EQ parameters read by the output callback
    params: Arc<SharedParameters>,
}

impl AudioEngine {
    /// Create a new audio engine with default configuration
    pub fn new() -> EngineResult<Self> {
        Self::with_config(EngineConfig::default())
    }

    /// Create a new audio engine with custom configuration
    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        let (command_sender, command_receiver) = bounded::<Command>(32);
        let (event_sender, event_receiver) = bounded::<Event>(EVENT_CAPACITY);

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        let is_running = Arc::new(AtomicBool::new(false));
        let params = Arc::new(SharedParameters::default());

        let control = ControlLoop {
            command_receiver,
            event_sender,
            shutdown_flag: Arc::clone(&shutdown_flag),
            is_running: Arc::clone(&is_running),
            params: Arc::clone(&params),
            config: config.clone(),
        };

        let control_thread = thread::Builder::new()
            .name("trident-audio".into())
            .spawn(move || control.run())
            .map_err(|e| EngineError::ThreadSpawnError(e.to_string()))?;

        let engine = Self {
            command_sender,
            event_receiver,
            control_thread: Some(control_thread),
            shutdown_flag,
            config,
            is_running,
            params,
        };

        if engine.config.auto_start {
            engine.start()?;
        }
        Ok(engine)
    }

    /// Start audio processing
    pub fn start(&self) -> EngineResult<()> {
        self.send_command(Command::Start)
    }

    /// Stop audio processing
    pub fn stop(&self) -> EngineResult<()> {
        self.send_command(Command::Stop)
    }

    /// Replace every EQ parameter (ordered with other commands)
    pub fn set_parameters(&self, settings: ChainSettings) -> EngineResult<()> {
        self.send_command(Command::SetParameters(settings))
    }

    /// Load a built-in preset; unknown names are reported as an `Error` event
    pub fn apply_preset(&self, name: &str) -> EngineResult<()> {
        self.send_command(Command::ApplyPreset(name.to_string()))
    }

    /// Set global bypass state
    pub fn set_bypass(&self, bypassed: bool) -> EngineResult<()> {
        self.send_command(Command::SetBypass(bypassed))
    }

    /// Request state update
    pub fn request_state(&self) -> EngineResult<()> {
        self.send_command(Command::RequestState)
    }

    pub fn set_peak_freq(&self, hz: f32) {
        self.params.set_peak_freq(hz);
    }

    pub fn set_peak_gain_db(&self, db: f32) {
        self.params.set_peak_gain_db(db);
    }

    pub fn set_peak_quality(&self, q: f32) {
        self.params.set_peak_quality(q);
    }

    pub fn set_low_cut_freq(&self, hz: f32) {
        self.params.set_low_cut_freq(hz);
    }

    pub fn set_high_cut_freq(&self, hz: f32) {
        self.params.set_high_cut_freq(hz);
    }

    pub fn set_low_cut_slope(&self, slope: Slope) {
        self.params.set_low_cut_slope(slope);
    }

    pub fn set_high_cut_slope(&self, slope: Slope) {
        self.params.set_high_cut_slope(slope);
    }

    /// Current EQ parameters as the audio callback will see them
    pub fn parameters(&self) -> ChainSettings {
        self.params.snapshot()
    }

    /// Check if engine is currently running
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Get next event (non-blocking)
    pub fn poll_event(&self) -> Option<Event> {
        self.event_receiver.try_recv().ok()
    }

    /// Get next event (blocking)
    pub fn wait_event(&self) -> Option<Event> {
        self.event_receiver.recv().ok()
    }

    /// Get next event, giving up after `timeout`
    pub fn wait_event_timeout(&self, timeout: Duration) -> Option<Event> {
        self.event_receiver.recv_timeout(timeout).ok()
    }

    /// Get all available devices
    pub fn list_devices(&self) -> EngineResult<Vec<AudioDevice>> {
        AudioDevice::enumerate_all()
    }

    /// Get current configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Send command to the control thread
    fn send_command(&self, command: Command) -> EngineResult<()> {
        self.command_sender
            .send(command)
            .map_err(|_| EngineError::ChannelSendError)
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        // Signal shutdown
        self.shutdown_flag.store(true, Ordering::SeqCst);

        // Send shutdown command
        let _ = self.command_sender.send(Command::Shutdown);

        // Wait for the control thread to finish
        if let Some(handle) = self.control_thread.take() {
            let _ = handle.join();
        }
    }
}

/// An open stream and the device names it was opened on
struct ActiveStream {
    stream: AudioStream,
    input_name: Option<String>,
    output_name: Option<String>,
    reporter: StatusReporter,
}

/// Turns cumulative stream counters into per-tick events
#[derive(Debug, Default)]
struct StatusReporter {
    rejected: u64,
    underruns: u64,
    overruns: u64,
}

impl StatusReporter {
    fn report(&mut self, status: &StreamStatus, mut emit: impl FnMut(Event)) {
        let (left, right) = status.peaks;
        // Only send if there's actual audio
        if left > LEVEL_FLOOR || right > LEVEL_FLOOR {
            emit(Event::LevelUpdate { left, right });
        }

        if let Some(count) = take_new(status.rejected, &mut self.rejected) {
            warn!("Equalizer rejected {} non-finite coefficient updates", count);
            emit(Event::CoefficientsRejected { count });
        }
        if let Some(count) = take_new(status.underruns, &mut self.underruns) {
            debug!("{} output underruns", count);
            emit(Event::BufferUnderrun { count });
        }
        if let Some(count) = take_new(status.overruns, &mut self.overruns) {
            debug!("{} capture overruns", count);
            emit(Event::BufferOverrun { count });
        }
    }
}

/// Increase of a cumulative counter since it was last seen
fn take_new(total: u64, seen: &mut u64) -> Option<u64> {
    let new = total.checked_sub(*seen).filter(|n| *n > 0)?;
    *seen = total;
    Some(new)
}

/// State owned by the control thread
struct ControlLoop {
    command_receiver: Receiver<Command>,
    event_sender: Sender<Event>,
    shutdown_flag: Arc<AtomicBool>,
    is_running: Arc<AtomicBool>,
    params: Arc<SharedParameters>,
    config: EngineConfig,
}

impl ControlLoop {
    fn run(self) {
        info!("Control thread started");

        let mut active: Option<ActiveStream> = None;
        let mut bypassed = false;

        while !self.shutdown_flag.load(Ordering::SeqCst) {
            // Timeout doubles as the meter/rejection polling tick
            match self.command_receiver.recv_timeout(TICK) {
                Ok(Command::Start) => {
                    if active.is_some() {
                        warn!("Engine already running");
                        self.emit(Event::error(EngineError::AlreadyRunning));
                        continue;
                    }

                    info!("Starting audio engine");
                    match self.open_stream() {
                        Ok(opened) => {
                            opened.stream.set_bypass(bypassed);
                            active = Some(opened);
                            self.is_running.store(true, Ordering::SeqCst);
                            self.emit(Event::Started);
                        }
                        Err(e) => {
                            error!("Failed to start stream: {}", e);
                            self.emit(Event::error(e));
                        }
                    }
                }

                Ok(Command::Stop) => {
                    if active.take().is_none() {
                        debug!("Engine not running");
                        continue;
                    }
                    info!("Stopping audio stream");
                    self.is_running.store(false, Ordering::SeqCst);
                    self.emit(Event::Stopped);
                }

                Ok(Command::SetParameters(settings)) => {
                    self.params.store(&settings);
                    debug!(?settings, "Parameters updated");
                }

                Ok(Command::ApplyPreset(name)) => match find_preset(&name) {
                    Some(preset) => {
                        self.params.store(&preset.settings);
                        info!("Applied preset '{}'", preset.name);
                    }
                    None => {
                        warn!("Unknown preset '{}'", name);
                        self.emit(Event::error(EngineError::UnknownPreset(name)));
                    }
                },

                Ok(Command::SetBypass(bypass)) => {
                    bypassed = bypass;
                    if let Some(ref opened) = active {
                        opened.stream.set_bypass(bypassed);
                    }
                    debug!("Bypass set to {}", bypassed);
                }

                Ok(Command::RequestState) => {
                    let state = Event::StateUpdate {
                        is_running: active.is_some(),
                        is_bypassed: bypassed,
                        settings: self.params.snapshot(),
                        input_device: active.as_ref().and_then(|a| a.input_name.clone()),
                        output_device: active.as_ref().and_then(|a| a.output_name.clone()),
                    };
                    self.emit(state);
                }

                Ok(Command::Shutdown) => {
                    info!("Shutdown command received");
                    self.shutdown_flag.store(true, Ordering::SeqCst);
                }

                Err(RecvTimeoutError::Timeout) => {
                    if let Some(ref mut opened) = active {
                        self.report_stream_status(opened);
                    }
                }

                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Command channel disconnected");
                    break;
                }
            }
        }

        // Cleanup
        drop(active);
        self.is_running.store(false, Ordering::SeqCst);
        info!("Control thread shutting down");
    }

    fn open_stream(&self) -> EngineResult<ActiveStream> {
        let input = find_device(DeviceType::Input, self.config.input_device.as_deref())?;
        let output = find_device(DeviceType::Output, self.config.output_device.as_deref())?;

        let input_name = input.name().ok();
        let output_name = output.name().ok();
        info!(
            "Opening streams: {} -> {}",
            input_name.as_deref().unwrap_or("<unnamed>"),
            output_name.as_deref().unwrap_or("<unnamed>")
        );

        let stream = AudioStream::new(
            &self.config,
            &input,
            &output,
            Arc::clone(&self.params),
            self.event_sender.clone(),
        )?;

        Ok(ActiveStream {
            stream,
            input_name,
            output_name,
            reporter: StatusReporter::default(),
        })
    }

    /// Forward meter levels plus new rejections and xruns
    fn report_stream_status(&self, opened: &mut ActiveStream) {
        let status = opened.stream.status();
        opened.reporter.report(&status, |event| self.emit(event));
    }

    /// Queue an event without blocking; a full queue drops it
    fn emit(&self, event: Event) {
        if let Err(TrySendError::Full(event)) = self.event_sender.try_send(event) {
            debug!("Event queue full, dropping {:?}", event);
        }
    }
}
