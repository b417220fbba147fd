//! Three-band splitter
//!
//! Two cascaded crossover pairs divide the input into low, mid and high
//! bands. The low band passes through an all-pass at the upper cutoff so
//! that it carries the same phase shift as the mid and high bands, which
//! makes `low + mid + high` an all-pass of the input.
//!
//! ```text
//!            ┌─ LP(f1) ───────── AP(f2) ─→ low
//! input ─────┤
//!            └─ HP(f1) ─┬─ LP(f2) ───────→ mid
//!                       └─ HP(f2) ───────→ high
//! ```

use super::crossover::{CrossoverPair, LinkwitzRiley};
use super::effect::{Effect, ProcessSpec};
use crate::engine::AudioBuffer;
use crate::error::Result;
use crate::params::{CrossoverSpec, NUM_BANDS};

/// One buffer per band, indexed by `Band::index()`
pub type BandBuffers = [AudioBuffer; NUM_BANDS];

/// Splits one buffer into three frequency bands
///
/// Cutoff ordering is not validated here: with `low_mid_hz >= mid_high_hz`
/// the bands overlap or invert, but the sum stays an all-pass of the input.
#[derive(Debug, Clone)]
pub struct ThreeBandSplitter {
    low_mid: CrossoverPair,
    mid_high: CrossoverPair,
    low_allpass: LinkwitzRiley,
}

impl ThreeBandSplitter {
    pub fn new(crossover: &CrossoverSpec) -> Self {
        Self {
            low_mid: CrossoverPair::new(crossover.low_mid_hz),
            mid_high: CrossoverPair::new(crossover.mid_high_hz),
            low_allpass: LinkwitzRiley::allpass(crossover.mid_high_hz),
        }
    }

    /// Apply crossover frequencies; called once per block before `split`
    pub fn set_crossover(&mut self, crossover: &CrossoverSpec) {
        self.low_mid.set_cutoff(crossover.low_mid_hz);
        self.mid_high.set_cutoff(crossover.mid_high_hz);
        self.low_allpass.set_cutoff(crossover.mid_high_hz);
    }

    /// Effective (clamped) cutoffs as `(low_mid, mid_high)`
    pub fn cutoffs(&self) -> (f32, f32) {
        (self.low_mid.cutoff_hz(), self.mid_high.cutoff_hz())
    }

    pub fn prepare(&mut self, spec: &ProcessSpec) -> Result<()> {
        self.low_mid.prepare(spec)?;
        self.mid_high.prepare(spec)?;
        self.low_allpass.prepare(spec)
    }

    pub fn reset(&mut self) {
        self.low_mid.reset();
        self.mid_high.reset();
        self.low_allpass.reset();
    }

    /// Latency of the longest path through the splitter in samples
    pub fn latency_samples(&self) -> usize {
        let low = self.low_mid.latency_samples() + self.low_allpass.latency_samples();
        let upper = self.low_mid.latency_samples() + self.mid_high.latency_samples();
        low.max(upper)
    }

    /// Split `input` into `bands`
    ///
    /// Every band buffer ends up with the input's shape. Band buffers must
    /// have the input's channel count and at least its length as capacity.
    pub fn split(&mut self, input: &AudioBuffer, bands: &mut BandBuffers) -> Result<()> {
        let [low, mid, high] = bands;

        low.copy_from(input)?;
        mid.copy_from(input)?;
        self.low_mid.split(low, mid);

        high.copy_from(mid)?;
        self.mid_high.split(mid, high);

        self.low_allpass.process(low);
        Ok(())
    }
}

impl Default for ThreeBandSplitter {
    fn default() -> Self {
        Self::new(&CrossoverSpec::default())
    }
}
