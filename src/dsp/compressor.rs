//! Compressor
//!
//! Feed-forward hard-knee compressor with a per-channel peak envelope
//! follower. The gain computer works in the linear domain:
//! `gain = (env / threshold)^(1/ratio - 1)` above threshold, 1 below.

use super::effect::{Effect, ProcessSpec};
use crate::engine::buffer::{db_to_linear, linear_to_db};
use crate::engine::AudioBuffer;
use crate::error::Result;
use crate::params::CompressorSettings;

/// Envelope values below this are flushed to zero at the end of a block
const ENVELOPE_FLOOR: f32 = 1e-20;

/// Compressor dynamics processor
///
/// Settings are clamped on the way in; a ratio below 1 acts as 1 and the
/// compressor then leaves the signal untouched.
#[derive(Debug, Clone)]
pub struct Compressor {
    /// Clamped settings currently in effect
    settings: CompressorSettings,
    /// Sample rate in Hz
    sample_rate: f64,
    /// Threshold as linear amplitude
    threshold: f32,
    /// `1/ratio - 1`, the exponent of the gain computer
    gain_exponent: f32,
    /// Attack coefficient for envelope smoothing
    attack_coeff: f32,
    /// Release coefficient for envelope smoothing
    release_coeff: f32,
    /// Current envelope level per channel (linear)
    envelope: Vec<f32>,
    /// Most recent applied gain per channel (linear)
    gain: Vec<f32>,
}

impl Compressor {
    /// Create a compressor with default settings
    pub fn new() -> Self {
        Self::with_settings(CompressorSettings::default())
    }

    /// Create a compressor with custom settings
    pub fn with_settings(settings: CompressorSettings) -> Self {
        let mut comp = Self {
            settings: settings.clamped(),
            sample_rate: 44100.0,
            threshold: 1.0,
            gain_exponent: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            envelope: Vec::new(),
            gain: Vec::new(),
        };
        comp.update_coefficients();
        comp
    }

    /// Settings currently in effect (after clamping)
    pub fn settings(&self) -> &CompressorSettings {
        &self.settings
    }

    /// Apply new settings; takes effect from the next processed sample
    ///
    /// Called once per block. Repeating a call with the same values is a
    /// no-op.
    pub fn update_settings(&mut self, settings: &CompressorSettings) {
        let clamped = settings.clamped();
        if clamped != self.settings {
            self.settings = clamped;
            self.update_coefficients();
        }
    }

    /// Current envelope level of a channel (linear)
    pub fn envelope(&self, channel: usize) -> f32 {
        self.envelope.get(channel).copied().unwrap_or(0.0)
    }

    /// Get the current gain reduction in dB for metering
    ///
    /// Averages the most recent gain across channels. Zero means no
    /// reduction; values are negative while compressing.
    pub fn gain_reduction_db(&self) -> f32 {
        if self.gain.is_empty() {
            return 0.0;
        }
        let avg_linear: f32 = self.gain.iter().sum::<f32>() / self.gain.len() as f32;
        linear_to_db(avg_linear)
    }

    /// Static gain reduction in dB for a given input level in dB
    ///
    /// Hard knee: zero at or below threshold, `(in - thr) * (1/ratio - 1)`
    /// above.
    pub fn compute_gain_reduction_db(&self, input_db: f32) -> f32 {
        let threshold = self.settings.threshold_db;
        if input_db <= threshold {
            0.0
        } else {
            // output = threshold + (input - threshold) / ratio
            (threshold + (input_db - threshold) / self.settings.ratio) - input_db
        }
    }

    /// Run the envelope follower without touching the audio
    ///
    /// Keeps detection history current while gain reduction is bypassed.
    pub fn track(&mut self, buffer: &AudioBuffer) {
        let channels = buffer.num_channels().min(self.envelope.len());
        for ch in 0..channels {
            let mut env = self.envelope[ch];
            for &sample in buffer.channel(ch) {
                env = self.follow(env, sample.abs());
            }
            self.envelope[ch] = settle(env);
            self.gain[ch] = 1.0;
        }
    }

    fn update_coefficients(&mut self) {
        // coeff = exp(-1 / time_in_samples)
        let fs_ms = self.sample_rate / 1000.0;
        self.attack_coeff = (-1.0 / (self.settings.attack_ms as f64 * fs_ms)).exp() as f32;
        self.release_coeff = (-1.0 / (self.settings.release_ms as f64 * fs_ms)).exp() as f32;

        self.threshold = db_to_linear(self.settings.threshold_db);
        self.gain_exponent = 1.0 / self.settings.ratio - 1.0;
    }

    #[inline]
    fn follow(&self, env: f32, level: f32) -> f32 {
        let coeff = if level > env {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        level + coeff * (env - level)
    }

    #[inline]
    fn compute_gain(&self, env: f32) -> f32 {
        if env > self.threshold {
            (env / self.threshold).powf(self.gain_exponent)
        } else {
            1.0
        }
    }
}

/// Zero an envelope that has decayed to nothing or been poisoned by a
/// non-finite input
#[inline]
fn settle(env: f32) -> f32 {
    if env.is_finite() && env >= ENVELOPE_FLOOR {
        env
    } else {
        0.0
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Compressor {
    fn prepare(&mut self, spec: &ProcessSpec) -> Result<()> {
        spec.validate()?;

        self.sample_rate = spec.sample_rate;
        self.envelope = vec![0.0; spec.num_channels];
        self.gain = vec![1.0; spec.num_channels];
        self.update_coefficients();

        tracing::debug!(
            sample_rate = spec.sample_rate,
            channels = spec.num_channels,
            attack_ms = self.settings.attack_ms,
            release_ms = self.settings.release_ms,
            "compressor prepared"
        );
        Ok(())
    }

    fn reset(&mut self) {
        self.envelope.fill(0.0);
        self.gain.fill(1.0);
    }

    fn process(&mut self, buffer: &mut AudioBuffer) {
        let channels = buffer.num_channels().min(self.envelope.len());
        for ch in 0..channels {
            let mut env = self.envelope[ch];
            let mut gain = self.gain[ch];
            for sample in buffer.channel_mut(ch).iter_mut() {
                env = self.follow(env, sample.abs());
                gain = self.compute_gain(env);
                *sample *= gain;
            }
            self.envelope[ch] = settle(env);
            self.gain[ch] = if gain.is_finite() { gain } else { 1.0 };
        }
    }
}
