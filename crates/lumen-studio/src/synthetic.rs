//! Stand-in for an audio analysis pipeline.

use std::f32::consts::TAU;

use lumen_engine::spectrum::SpectrumSource;

/// Source of uniform noise in `[0, 1)`.
pub trait NoiseSource {
    fn next(&mut self) -> f32;
}

/// xorshift64 generator. Deterministic for a given seed.
#[derive(Debug, Clone)]
pub struct XorShiftNoise {
    state: u64,
}

impl XorShiftNoise {
    pub fn new(seed: u64) -> Self {
        // Zero is a fixed point of xorshift.
        let state = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        Self { state }
    }
}

impl NoiseSource for XorShiftNoise {
    fn next(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        // Top 24 bits fit an f32 mantissa exactly.
        (x >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Spectrum made of a few travelling sines per band plus injected noise.
///
/// Low bands are louder than high ones, roughly like music.
pub struct SyntheticSpectrum {
    bands: Vec<f32>,
    noise: Box<dyn NoiseSource>,
    noise_amount: f32,
    smoothing: f32,
}

impl SyntheticSpectrum {
    pub fn new(bands: usize, noise: Box<dyn NoiseSource>) -> Self {
        Self {
            bands: vec![0.0; bands],
            noise,
            noise_amount: 0.25,
            smoothing: 0.6,
        }
    }

    pub fn with_noise_amount(mut self, amount: f32) -> Self {
        self.noise_amount = amount.max(0.0);
        self
    }

    /// Fraction of the previous value kept each update, in `[0, 1)`.
    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = smoothing.clamp(0.0, 0.99);
        self
    }

    /// Advances every band to time `t` (seconds).
    pub fn update(&mut self, t: f32) {
        let n = self.bands.len().max(1) as f32;
        for (i, band) in self.bands.iter_mut().enumerate() {
            let x = i as f32 / n;
            let tilt = 1.0 - 0.6 * x;
            let wave = 0.5
                + 0.25 * (t * 2.1 + x * 9.0).sin()
                + 0.15 * (t * 3.7 - x * 17.0).sin()
                + 0.10 * (t * 0.7 + x * 3.0).sin();
            let jitter = self.noise_amount * (self.noise.next() - 0.5);
            let target = (wave * tilt + jitter).clamp(0.0, 1.0);
            *band += (target - *band) * (1.0 - self.smoothing);
        }
    }

    /// Mean of the lowest quarter of the bands.
    pub fn bass(&self) -> f32 {
        let n = (self.bands.len() / 4).max(1).min(self.bands.len());
        if n == 0 {
            return 0.0;
        }
        self.bands[..n].iter().sum::<f32>() / n as f32
    }

    /// `samples` waveform values in `[-1, 1]` for time `t`.
    pub fn waveform(&self, t: f32, samples: usize) -> Vec<f32> {
        let level = 0.4 + 0.5 * self.bass();
        (0..samples)
            .map(|i| {
                let x = i as f32 / samples.max(1) as f32;
                let carrier = (TAU * (x * 3.0 + t * 0.5)).sin();
                let envelope = 0.5 + 0.5 * (t + x * TAU).sin();
                (level * carrier * envelope).clamp(-1.0, 1.0)
            })
            .collect()
    }
}

impl SpectrumSource for SyntheticSpectrum {
    fn magnitudes(&self) -> &[f32] {
        &self.bands
    }
}
