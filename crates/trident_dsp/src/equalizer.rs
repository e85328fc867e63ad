//! Equalizer Engine
//!
//! Owns the left and right channel chains and the last-applied parameter
//! snapshot. Each block entry point reads the snapshot once, redesigns the
//! coefficients only when it differs from the previous one, and installs the
//! same design into both chains before filtering in place.
//!
//! # Real-time Safety
//!
//! `process_block`, `process_stereo` and `process_interleaved` never
//! allocate, lock or log. Rejected coefficient sets are counted in an atomic
//! that a control thread can poll through [`EqualizerEngine::rejection_counter`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::chain::{ChainCoefficients, ChannelChain};
use crate::coefficients::gain_to_db;
use crate::error::DspError;
use crate::settings::ChainSettings;

/// Number of channel chains (stereo)
pub const CHANNELS: usize = 2;

/// Two-channel LowCut → Peak → HighCut equalizer
#[derive(Debug)]
pub struct EqualizerEngine {
    chains: [ChannelChain; CHANNELS],
    sample_rate: f32,
    max_block_size: usize,
    last_applied: Option<ChainSettings>,
    rejected: Arc<AtomicU64>,
}

impl Default for EqualizerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EqualizerEngine {
    /// Unprepared engine; audio passes through untouched until `prepare`
    pub fn new() -> Self {
        Self {
            chains: [ChannelChain::new(), ChannelChain::new()],
            sample_rate: 0.0,
            max_block_size: 0,
            last_applied: None,
            rejected: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Set up for a stream at `sample_rate` with blocks of up to `max_block_size`
    ///
    /// Clears all filter history and forces a coefficient redesign on the
    /// next block. Can be called again whenever the stream restarts.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<(), DspError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        if max_block_size == 0 {
            return Err(DspError::InvalidBlockSize(max_block_size));
        }

        for chain in self.chains.iter_mut() {
            chain.reset();
        }
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.last_applied = None;

        info!(sample_rate, max_block_size, "Equalizer prepared");
        Ok(())
    }

    /// Drop back to the unprepared state (stream stopped)
    pub fn release(&mut self) {
        for chain in self.chains.iter_mut() {
            chain.reset();
        }
        self.sample_rate = 0.0;
        self.max_block_size = 0;
        self.last_applied = None;
        debug!("Equalizer released");
    }

    pub fn is_prepared(&self) -> bool {
        self.sample_rate > 0.0
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Snapshot the current coefficients were designed from
    pub fn last_applied(&self) -> Option<&ChainSettings> {
        self.last_applied.as_ref()
    }

    pub fn chain(&self, channel: usize) -> Option<&ChannelChain> {
        self.chains.get(channel)
    }

    /// Total coefficient sets rejected as non-finite since creation
    pub fn rejected_updates(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Shared handle to the rejection count, for polling from another thread
    pub fn rejection_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.rejected)
    }

    /// Redesign and install coefficients if `settings` changed
    #[inline]
    fn update(&mut self, settings: &ChainSettings) {
        if self.last_applied.as_ref() == Some(settings) {
            return;
        }

        let design = ChainCoefficients::design(settings, self.sample_rate);
        for chain in self.chains.iter_mut() {
            if chain.apply(&design).is_err() {
                self.rejected.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.last_applied = Some(*settings);
    }

    /// Filter planar channel buffers in place
    ///
    /// The first two channels go through the left and right chains; a single
    /// channel uses the left chain. Further channels pass through unmodified.
    /// Blocks longer than `max_block_size` are still processed in full.
    pub fn process_block(&mut self, channels: &mut [&mut [f32]], settings: &ChainSettings) {
        if !self.is_prepared() {
            return;
        }
        self.update(settings);

        for (chain, buffer) in self.chains.iter_mut().zip(channels.iter_mut()) {
            chain.process(buffer);
        }
    }

    /// Filter a left/right buffer pair in place
    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32], settings: &ChainSettings) {
        self.process_block(&mut [left, right], settings);
    }

    /// Filter an interleaved buffer in place
    ///
    /// Format: `[c0, c1, .., c0, c1, ..]` with `channels` samples per frame.
    /// Channels past the second and a trailing partial frame are untouched.
    pub fn process_interleaved(&mut self, buffer: &mut [f32], channels: usize, settings: &ChainSettings) {
        if !self.is_prepared() || channels == 0 {
            return;
        }
        self.update(settings);

        for frame in buffer.chunks_exact_mut(channels) {
            for (chain, sample) in self.chains.iter_mut().zip(frame.iter_mut()) {
                *sample = chain.process_sample(*sample);
            }
        }
        for chain in self.chains.iter_mut() {
            chain.snap_to_zero();
        }
    }

    /// Response of the current design at `freq`, in dB
    ///
    /// Both chains share one design, so the left chain is representative.
    /// An unprepared engine reports a flat 0 dB.
    pub fn magnitude_db_at(&self, freq: f32) -> f64 {
        if !self.is_prepared() {
            return 0.0;
        }
        gain_to_db(self.chains[0].magnitude_at(freq, self.sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coefficients::CoefficientSet;
    use crate::presets::PRESETS;
    use crate::settings::Slope;
    use crate::test_signal::{measure_gain_db, sine};

    fn prepared(sample_rate: f32) -> EqualizerEngine {
        let mut engine = EqualizerEngine::new();
        engine.prepare(sample_rate, 512).unwrap();
        engine
    }

    fn bits(c: &CoefficientSet) -> [u32; 5] {
        [c.b0, c.b1, c.b2, c.a1, c.a2].map(f32::to_bits)
    }

    /// Every coefficient and delay-line value of a chain, as raw bits
    fn chain_fingerprint(chain: &ChannelChain) -> Vec<u32> {
        let mut out = Vec::new();
        for cascade in [chain.low_cut(), chain.high_cut()] {
            for i in 0..4 {
                let stage = cascade.stage(i).unwrap();
                out.extend(bits(stage.coefficients()));
                out.extend(stage.state().map(f32::to_bits));
                out.push(u32::from(stage.is_bypassed()));
            }
        }
        out.extend(bits(chain.peak().coefficients()));
        out.extend(chain.peak().state().map(f32::to_bits));
        out
    }

    #[test]
    fn test_prepare_rejects_invalid_setup() {
        let mut engine = EqualizerEngine::new();
        assert_eq!(engine.prepare(0.0, 512), Err(DspError::InvalidSampleRate(0.0)));
        assert_eq!(
            engine.prepare(-44100.0, 512),
            Err(DspError::InvalidSampleRate(-44100.0))
        );
        assert!(engine.prepare(f32::NAN, 512).is_err());
        assert!(engine.prepare(f32::INFINITY, 512).is_err());
        assert_eq!(engine.prepare(48000.0, 0), Err(DspError::InvalidBlockSize(0)));
        assert!(!engine.is_prepared());

        engine.prepare(48000.0, 256).unwrap();
        assert!(engine.is_prepared());
        assert_eq!(engine.sample_rate(), 48000.0);
        assert_eq!(engine.max_block_size(), 256);
    }

    #[test]
    fn test_unprepared_engine_passes_through() {
        let mut engine = EqualizerEngine::new();
        let settings = ChainSettings {
            peak_gain_db: 12.0,
            ..Default::default()
        };
        let mut left = vec![0.5, -0.25, 0.125];
        let mut right = left.clone();
        engine.process_stereo(&mut left, &mut right, &settings);

        assert_eq!(left, vec![0.5, -0.25, 0.125]);
        assert_eq!(right, left);
        assert!(engine.last_applied().is_none());
        assert_eq!(engine.magnitude_db_at(1000.0), 0.0);
    }

    #[test]
    fn test_zero_in_zero_out() {
        let mut snapshots: Vec<ChainSettings> = PRESETS.iter().map(|p| p.settings).collect();
        snapshots.push(ChainSettings {
            peak_freq: 20000.0,
            peak_gain_db: 24.0,
            peak_quality: 10.0,
            low_cut_freq: 20000.0,
            high_cut_freq: 20.0,
            low_cut_slope: Slope::Db48,
            high_cut_slope: Slope::Db48,
        });

        for settings in snapshots {
            let mut engine = prepared(48000.0);
            let mut left = vec![0.0_f32; 1024];
            let mut right = vec![0.0_f32; 1024];
            for _ in 0..4 {
                engine.process_stereo(&mut left, &mut right, &settings);
            }
            assert!(
                left.iter().chain(right.iter()).all(|&s| s == 0.0),
                "non-zero output for {:?}",
                settings
            );
        }
    }

    #[test]
    fn test_gain_change_is_click_free() {
        let fs = 48000.0;
        let mut engine = prepared(fs);
        let mut signal = sine(1000.0, fs, 0.5, 9600);

        let quiet = ChainSettings {
            peak_freq: 1000.0,
            ..Default::default()
        };
        let loud = ChainSettings {
            peak_gain_db: 6.0,
            ..quiet
        };

        for (index, block) in signal.chunks_mut(64).enumerate() {
            let settings = if index < 75 { &quiet } else { &loud };
            engine.process_block(&mut [block], settings);
        }

        // Steepest slope of the boosted sine is 2π·f/fs·A ≈ 0.13
        let max_step = signal
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0_f32, f32::max);
        assert!(max_step < 0.2, "discontinuity of {}", max_step);

        let settled_peak = signal[8000..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!((settled_peak - 1.0).abs() < 0.05, "boosted peak {}", settled_peak);
    }

    #[test]
    fn test_same_snapshot_is_idempotent() {
        let settings = ChainSettings {
            peak_gain_db: 4.5,
            low_cut_freq: 80.0,
            low_cut_slope: Slope::Db36,
            ..Default::default()
        };

        let mut engine = prepared(48000.0);
        let mut buffer = sine(440.0, 48000.0, 0.8, 512);
        engine.process_block(&mut [&mut buffer[..]], &settings);

        let before = chain_fingerprint(engine.chain(0).unwrap());
        let mut empty: [f32; 0] = [];
        engine.process_block(&mut [&mut empty[..]], &settings);
        assert_eq!(chain_fingerprint(engine.chain(0).unwrap()), before);

        // Reconfiguring a chain directly with the same snapshot changes nothing either
        let mut chain = engine.chain(0).unwrap().clone();
        chain.configure(&settings, 48000.0).unwrap();
        assert_eq!(chain_fingerprint(&chain), before);
    }

    #[test]
    fn test_both_channels_get_identical_designs() {
        let settings = ChainSettings {
            peak_freq: 2500.0,
            peak_gain_db: -9.0,
            high_cut_freq: 9000.0,
            high_cut_slope: Slope::Db48,
            ..Default::default()
        };
        let mut engine = prepared(48000.0);
        let mut left = sine(300.0, 48000.0, 0.5, 256);
        let mut right = left.clone();
        engine.process_stereo(&mut left, &mut right, &settings);

        assert_eq!(left, right);
        let l = engine.chain(0).unwrap();
        let r = engine.chain(1).unwrap();
        assert_eq!(bits(l.peak().coefficients()), bits(r.peak().coefficients()));
        assert_eq!(l.high_cut().active_stages(), 4);
        assert_eq!(r.high_cut().active_stages(), 4);
    }

    #[test]
    fn test_mono_and_extra_channels() {
        let settings = ChainSettings {
            peak_freq: 1000.0,
            peak_gain_db: 12.0,
            ..Default::default()
        };

        let mut engine = prepared(48000.0);
        let mut mono = sine(1000.0, 48000.0, 0.5, 256);
        let dry = mono.clone();
        engine.process_block(&mut [&mut mono[..]], &settings);
        assert_ne!(mono, dry);
        assert!(engine.chain(1).unwrap().peak().state() == [0.0; 4]);

        let mut engine = prepared(48000.0);
        let mut a = dry.clone();
        let mut b = dry.clone();
        let mut c = dry.clone();
        engine.process_block(&mut [&mut a[..], &mut b[..], &mut c[..]], &settings);
        assert_eq!(a, b);
        assert_eq!(c, dry);
    }

    #[test]
    fn test_interleaved_matches_planar() {
        let settings = ChainSettings {
            peak_gain_db: 3.0,
            low_cut_freq: 150.0,
            low_cut_slope: Slope::Db24,
            ..Default::default()
        };
        let left = sine(200.0, 48000.0, 0.7, 480);
        let right = sine(3000.0, 48000.0, 0.3, 480);

        let mut planar = prepared(48000.0);
        let mut l = left.clone();
        let mut r = right.clone();
        planar.process_stereo(&mut l, &mut r, &settings);

        let mut interleaved = prepared(48000.0);
        let mut buffer: Vec<f32> = left
            .iter()
            .zip(right.iter())
            .flat_map(|(&a, &b)| [a, b])
            .collect();
        interleaved.process_interleaved(&mut buffer, 2, &settings);

        for (i, frame) in buffer.chunks_exact(2).enumerate() {
            assert_eq!(frame[0], l[i]);
            assert_eq!(frame[1], r[i]);
        }
    }

    #[test]
    fn test_interleaved_zero_channels_is_noop() {
        let mut engine = prepared(48000.0);
        let mut buffer = vec![0.5; 8];
        engine.process_interleaved(&mut buffer, 0, &ChainSettings::default());
        assert_eq!(buffer, vec![0.5; 8]);
        assert!(engine.last_applied().is_none());
    }

    #[test]
    fn test_oversized_block_processed_in_full() {
        let settings = ChainSettings {
            peak_freq: 1000.0,
            peak_gain_db: -12.0,
            ..Default::default()
        };
        let mut engine = EqualizerEngine::new();
        engine.prepare(48000.0, 64).unwrap();

        let mut buffer = sine(1000.0, 48000.0, 0.5, 4096);
        engine.process_block(&mut [&mut buffer[..]], &settings);
        let tail_peak = buffer[3000..].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(tail_peak < 0.2, "tail not filtered: {}", tail_peak);
    }

    #[test]
    fn test_prepare_resets_history_and_forces_redesign() {
        let settings = ChainSettings::default();
        let mut engine = prepared(48000.0);
        let mut buffer = sine(100.0, 48000.0, 0.9, 256);
        engine.process_block(&mut [&mut buffer[..]], &settings);
        assert!(engine.last_applied().is_some());
        assert_ne!(engine.chain(0).unwrap().peak().state(), [0.0; 4]);

        engine.prepare(44100.0, 256).unwrap();
        assert!(engine.last_applied().is_none());
        assert_eq!(engine.chain(0).unwrap().peak().state(), [0.0; 4]);

        engine.release();
        assert!(!engine.is_prepared());
    }

    #[test]
    fn test_default_settings_flat_at_44k1() {
        let settings = ChainSettings {
            low_cut_freq: 20.0,
            high_cut_freq: 20000.0,
            peak_freq: 750.0,
            peak_gain_db: 0.0,
            peak_quality: 1.0,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
        };
        let mut engine = prepared(44100.0);
        // 4410 samples hold exactly 100 periods of 1 kHz
        let db = measure_gain_db(&mut engine, &settings, 1000.0, 22050, 4410);
        assert!(db.abs() < 0.1, "1kHz at {}dB", db);
    }

    #[test]
    fn test_peak_boost_measured() {
        let settings = ChainSettings {
            peak_freq: 1000.0,
            peak_gain_db: 12.0,
            peak_quality: 1.0,
            ..Default::default()
        };

        let mut engine = prepared(48000.0);
        let center = measure_gain_db(&mut engine, &settings, 1000.0, 24000, 4800);
        assert!((center - 12.0).abs() < 0.5, "1kHz at {}dB", center);

        for freq in [100.0, 10000.0] {
            let mut engine = prepared(48000.0);
            let db = measure_gain_db(&mut engine, &settings, freq, 24000, 4800);
            assert!(db.abs() < 1.0, "{}Hz at {}dB", freq, db);
        }

        let predicted = engine.magnitude_db_at(1000.0);
        assert!((predicted - 12.0).abs() < 0.01);
    }

    #[test]
    fn test_steep_low_cut_attenuation() {
        let settings = ChainSettings {
            low_cut_freq: 1000.0,
            low_cut_slope: Slope::Db48,
            ..Default::default()
        };
        let mut engine = prepared(48000.0);
        // 4800 samples hold exactly 25 periods of 250 Hz
        let db = measure_gain_db(&mut engine, &settings, 250.0, 12000, 4800);
        assert!(db <= -90.0, "250Hz only attenuated to {}dB", db);
        assert!(engine.magnitude_db_at(250.0) <= -90.0);
    }

    #[test]
    fn test_nyquist_cutoff_degrades_to_passthrough() {
        let settings = ChainSettings {
            peak_freq: 20000.0,
            peak_gain_db: 12.0,
            high_cut_freq: 20000.0,
            high_cut_slope: Slope::Db48,
            ..Default::default()
        };
        // At 32 kHz every 20 kHz design lies above Nyquist
        let mut engine = prepared(32000.0);
        let mut buffer = sine(1000.0, 32000.0, 0.5, 64);
        engine.process_block(&mut [&mut buffer[..]], &settings);

        let chain = engine.chain(0).unwrap();
        assert_eq!(*chain.peak().coefficients(), CoefficientSet::UNITY);
        assert_eq!(chain.high_cut().active_stages(), 4);
        for i in 0..4 {
            assert_eq!(
                *chain.high_cut().stage(i).unwrap().coefficients(),
                CoefficientSet::UNITY
            );
        }
        assert_eq!(engine.rejected_updates(), 0);
    }

    #[test]
    fn test_rejection_counter_shared() {
        let engine = prepared(48000.0);
        let counter = engine.rejection_counter();
        counter.fetch_add(2, Ordering::Relaxed);
        assert_eq!(engine.rejected_updates(), 2);
    }
}
