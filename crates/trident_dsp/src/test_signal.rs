//! Signal helpers shared by unit tests

use std::f64::consts::PI;

use crate::equalizer::EqualizerEngine;
use crate::settings::ChainSettings;

/// `len` samples of a sine starting at phase zero
pub fn sine(freq: f32, sample_rate: f32, amplitude: f32, len: usize) -> Vec<f32> {
    let w = 2.0 * PI * f64::from(freq) / f64::from(sample_rate);
    (0..len)
        .map(|n| (f64::from(amplitude) * (w * n as f64).sin()) as f32)
        .collect()
}

/// Amplitude of the `freq` component (single-bin DFT)
///
/// Exact when `signal` spans a whole number of periods.
pub fn bin_amplitude(signal: &[f32], freq: f32, sample_rate: f32) -> f64 {
    let w = 2.0 * PI * f64::from(freq) / f64::from(sample_rate);
    let (re, im) = signal
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(re, im), (n, &x)| {
            let (s, c) = (w * n as f64).sin_cos();
            (re + f64::from(x) * c, im + f64::from(x) * s)
        });
    2.0 * re.hypot(im) / signal.len() as f64
}

/// Steady-state gain of the engine's left chain at `freq`, in dB
///
/// Streams a unit sine through `process_block` in 256-sample blocks,
/// discards `settle` samples of transient, then compares the output bin
/// against the input bin over `window` samples.
pub fn measure_gain_db(
    engine: &mut EqualizerEngine,
    settings: &ChainSettings,
    freq: f32,
    settle: usize,
    window: usize,
) -> f64 {
    let input = sine(freq, engine.sample_rate(), 1.0, settle + window);
    let mut output = input.clone();

    for block in output.chunks_mut(256) {
        engine.process_block(&mut [block], settings);
    }

    let dry = bin_amplitude(&input[settle..], freq, engine.sample_rate());
    let wet = bin_amplitude(&output[settle..], freq, engine.sample_rate());
    20.0 * (wet / dry).log10()
}
