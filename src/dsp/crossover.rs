//! Linkwitz-Riley crossover filters
//!
//! Fourth-order Linkwitz-Riley sections built from two cascaded
//! second-order Butterworth state-variable filters (TPT form). The lowpass
//! and highpass outputs at one cutoff sum to a second-order all-pass, which
//! the `AllPass` type reproduces on its own for phase compensation.

use std::f64::consts::{PI, SQRT_2};

use super::effect::{Effect, ProcessSpec};
use crate::engine::AudioBuffer;
use crate::error::Result;

/// Lowest cutoff the filters accept, in Hz
pub const MIN_CUTOFF_HZ: f32 = 1.0;

/// Highest cutoff as a fraction of Nyquist
const MAX_CUTOFF_RATIO: f64 = 0.98;

/// Magnitudes below this are flushed to zero so silent tails never reach
/// subnormal range
const DENORMAL_FLOOR: f64 = 1e-30;

/// Damping of each Butterworth section (2 * zeta)
const R2: f64 = SQRT_2;

/// Response of a Linkwitz-Riley filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// 24 dB/oct lowpass
    LowPass,
    /// 24 dB/oct highpass
    HighPass,
    /// Second-order all-pass equal to LowPass + HighPass at the same cutoff
    AllPass,
}

/// Integrator state for one channel
#[derive(Debug, Clone, Copy, Default)]
struct SvfState {
    s1: f64,
    s2: f64,
    s3: f64,
    s4: f64,
}

impl SvfState {
    /// End-of-block cleanup: zero tiny integrator values and drop history
    /// that a NaN or infinite input has poisoned
    fn settle(&mut self) {
        let values = [self.s1, self.s2, self.s3, self.s4];
        if values.iter().any(|v| !v.is_finite()) {
            *self = Self::default();
            return;
        }
        self.s1 = flush_denormal(self.s1);
        self.s2 = flush_denormal(self.s2);
        self.s3 = flush_denormal(self.s3);
        self.s4 = flush_denormal(self.s4);
    }
}

#[inline]
fn flush_denormal(value: f64) -> f64 {
    if value.abs() < DENORMAL_FLOOR {
        0.0
    } else {
        value
    }
}

/// A single Linkwitz-Riley filter with per-channel history
#[derive(Debug, Clone)]
pub struct LinkwitzRiley {
    filter_type: FilterType,
    cutoff_hz: f32,
    sample_rate: f64,
    max_cutoff_hz: f64,
    g: f64,
    h: f64,
    states: Vec<SvfState>,
}

impl LinkwitzRiley {
    pub fn new(filter_type: FilterType, cutoff_hz: f32) -> Self {
        let mut filter = Self {
            filter_type,
            cutoff_hz: 0.0,
            sample_rate: 44100.0,
            max_cutoff_hz: 22050.0 * MAX_CUTOFF_RATIO,
            g: 0.0,
            h: 0.0,
            states: Vec::new(),
        };
        filter.set_cutoff(cutoff_hz);
        filter
    }

    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::LowPass, cutoff_hz)
    }

    pub fn highpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::HighPass, cutoff_hz)
    }

    pub fn allpass(cutoff_hz: f32) -> Self {
        Self::new(FilterType::AllPass, cutoff_hz)
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Cutoff in Hz after clamping
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    /// Set the cutoff frequency
    ///
    /// Safe to call every block. The value is clamped into
    /// `[MIN_CUTOFF_HZ, 0.98 * nyquist]` and coefficients are only
    /// recomputed when it changes.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        let max = self.max_cutoff_hz as f32;
        let clamped = if cutoff_hz.is_nan() {
            MIN_CUTOFF_HZ
        } else {
            cutoff_hz.clamp(MIN_CUTOFF_HZ, max)
        };

        if clamped != self.cutoff_hz {
            self.cutoff_hz = clamped;
            self.update_coefficients();
        }
    }

    fn update_coefficients(&mut self) {
        self.g = (PI * self.cutoff_hz as f64 / self.sample_rate).tan();
        self.h = 1.0 / (1.0 + R2 * self.g + self.g * self.g);
    }

    /// Filter one sample of one channel
    ///
    /// Outputs below `1e-30` are returned as exactly zero.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: f32) -> f32 {
        let (g, h) = (self.g, self.h);
        let s = &mut self.states[channel];
        let x = input as f64;

        let y_h = (x - (R2 + g) * s.s1 - s.s2) * h;
        let y_b = g * y_h + s.s1;
        s.s1 = g * y_h + y_b;
        let y_l = g * y_b + s.s2;
        s.s2 = g * y_b + y_l;

        if self.filter_type == FilterType::AllPass {
            return flush_denormal(y_l - R2 * y_b + y_h) as f32;
        }

        let stage_in = if self.filter_type == FilterType::LowPass {
            y_l
        } else {
            y_h
        };

        let y_h2 = (stage_in - (R2 + g) * s.s3 - s.s4) * h;
        let y_b2 = g * y_h2 + s.s3;
        s.s3 = g * y_h2 + y_b2;
        let y_l2 = g * y_b2 + s.s4;
        s.s4 = g * y_b2 + y_l2;

        let output = match self.filter_type {
            FilterType::LowPass => y_l2,
            _ => y_h2,
        };
        flush_denormal(output) as f32
    }
}

impl Effect for LinkwitzRiley {
    fn prepare(&mut self, spec: &ProcessSpec) -> Result<()> {
        spec.validate()?;

        self.sample_rate = spec.sample_rate;
        self.max_cutoff_hz = spec.nyquist() * MAX_CUTOFF_RATIO;
        self.states = vec![SvfState::default(); spec.num_channels];

        // Re-clamp against the new Nyquist and force a coefficient update
        let requested = self.cutoff_hz;
        self.cutoff_hz = 0.0;
        self.set_cutoff(requested);
        Ok(())
    }

    fn reset(&mut self) {
        self.states.fill(SvfState::default());
    }

    fn process(&mut self, buffer: &mut AudioBuffer) {
        let channels = buffer.num_channels().min(self.states.len());
        for ch in 0..channels {
            for sample in buffer.channel_mut(ch).iter_mut() {
                *sample = self.process_sample(ch, *sample);
            }
            self.states[ch].settle();
        }
    }
}

/// Matched lowpass/highpass pair at one cutoff
///
/// The two outputs are phase coherent: their sum is an all-pass response of
/// the input with flat magnitude.
#[derive(Debug, Clone)]
pub struct CrossoverPair {
    lowpass: LinkwitzRiley,
    highpass: LinkwitzRiley,
}

impl CrossoverPair {
    pub fn new(cutoff_hz: f32) -> Self {
        Self {
            lowpass: LinkwitzRiley::lowpass(cutoff_hz),
            highpass: LinkwitzRiley::highpass(cutoff_hz),
        }
    }

    /// Set the cutoff on both filters
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        self.lowpass.set_cutoff(cutoff_hz);
        self.highpass.set_cutoff(cutoff_hz);
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.lowpass.cutoff_hz()
    }

    pub fn prepare(&mut self, spec: &ProcessSpec) -> Result<()> {
        self.lowpass.prepare(spec)?;
        self.highpass.prepare(spec)
    }

    pub fn reset(&mut self) {
        self.lowpass.reset();
        self.highpass.reset();
    }

    /// Latency of the slower of the two outputs
    pub fn latency_samples(&self) -> usize {
        self.lowpass
            .latency_samples()
            .max(self.highpass.latency_samples())
    }

    /// Split in place: `low` and `high` must both hold a copy of the input
    pub fn split(&mut self, low: &mut AudioBuffer, high: &mut AudioBuffer) {
        self.lowpass.process(low);
        self.highpass.process(high);
    }
}
