//! Effect trait definition
//!
//! Base trait for every stage of the multiband signal path.

use crate::engine::AudioBuffer;
use crate::error::{MbcError, Result};

/// Processing context fixed at prepare time
///
/// All buffer allocations derive from these values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Largest block `process` will ever be called with
    pub max_block_size: usize,
    /// Number of independently processed channels
    pub num_channels: usize,
}

impl ProcessSpec {
    pub fn new(sample_rate: f64, max_block_size: usize, num_channels: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            num_channels,
        }
    }

    /// Reject specs no processor can be prepared for
    pub fn validate(&self) -> Result<()> {
        if self.num_channels == 0 {
            return Err(MbcError::InvalidSpec {
                reason: "channel count must be at least 1".to_string(),
            });
        }
        if self.max_block_size == 0 {
            return Err(MbcError::InvalidSpec {
                reason: "maximum block size must be at least 1".to_string(),
            });
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(MbcError::InvalidSpec {
                reason: format!("sample rate must be positive, got {}", self.sample_rate),
            });
        }
        Ok(())
    }

    /// Nyquist frequency in Hz
    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }
}

/// Base trait for all DSP stages
///
/// Stages process audio buffers in-place. `process` must not allocate or
/// block; everything it needs is sized in `prepare`.
pub trait Effect: Send {
    /// Size internal state for the given context and clear history
    ///
    /// Called when sample rate, block size or channel count changes.
    fn prepare(&mut self, spec: &ProcessSpec) -> Result<()>;

    /// Reset effect state
    ///
    /// Clears filter history and envelope state without reallocating.
    fn reset(&mut self);

    /// Process audio buffer in-place
    fn process(&mut self, buffer: &mut AudioBuffer);

    /// Latency introduced by this stage, in samples
    fn latency_samples(&self) -> usize {
        0
    }
}
