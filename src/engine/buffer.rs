//! Audio Buffer Management
//!
//! Block buffers used by the processing pipeline. Storage is allocated once
//! for a fixed channel count and capacity; the active sample count can then
//! change per block without touching the allocator.

use crate::error::{MbcError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Calculate the RMS level of one channel over a sample range
///
/// # Returns
/// Linear RMS amplitude. Returns 0.0 for an empty range.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Calculate the peak level of a buffer in dB across all channels
pub fn calculate_peak_db(buffer: &AudioBuffer) -> f32 {
    let peak = (0..buffer.num_channels())
        .flat_map(|ch| buffer.channel(ch).iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max);

    linear_to_db(peak)
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Non-interleaved block buffer of 32-bit float samples
///
/// Each channel owns `capacity` samples of storage. Only the first
/// `num_samples` of them belong to the current block.
///
/// # Example
/// ```
/// use mbcomp::engine::AudioBuffer;
///
/// let mut buffer = AudioBuffer::new(2, 512);
/// assert_eq!(buffer.num_channels(), 2);
/// assert_eq!(buffer.num_samples(), 512);
///
/// buffer.set_num_samples(128).unwrap();
/// assert_eq!(buffer.channel(0).len(), 128);
/// assert_eq!(buffer.capacity(), 512);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is sized to capacity
    samples: Vec<Vec<f32>>,
    /// Active samples per channel
    num_samples: usize,
}

impl AudioBuffer {
    /// Create a silent buffer whose active length equals its capacity
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
            num_samples,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// All channels must have the same length.
    pub fn from_channels(channels: Vec<Vec<f32>>) -> Result<Self> {
        let num_samples = channels.first().map(|ch| ch.len()).unwrap_or(0);
        if let Some(bad) = channels.iter().find(|ch| ch.len() != num_samples) {
            return Err(MbcError::InvalidAudio {
                reason: format!(
                    "channel lengths differ ({} vs {})",
                    num_samples,
                    bad.len()
                ),
            });
        }

        Ok(Self {
            samples: channels,
            num_samples,
        })
    }

    /// Create a buffer from interleaved sample data
    pub fn from_interleaved(interleaved: &[f32], num_channels: usize) -> Result<Self> {
        if num_channels == 0 || interleaved.len() % num_channels != 0 {
            return Err(MbcError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            num_samples,
        })
    }

    /// Convert the active region to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.num_channels() * self.num_samples);

        for index in 0..self.num_samples {
            for channel in &self.samples {
                interleaved.push(channel[index]);
            }
        }

        interleaved
    }

    /// Number of channels
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of active samples per channel
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Allocated samples per channel
    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer has no active samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_samples == 0
    }

    /// Change the active sample count without reallocating
    pub fn set_num_samples(&mut self, num_samples: usize) -> Result<()> {
        if num_samples > self.capacity() {
            return Err(MbcError::BlockTooLarge {
                max: self.capacity(),
                actual: num_samples,
            });
        }
        self.num_samples = num_samples;
        Ok(())
    }

    /// Active samples of one channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index][..self.num_samples]
    }

    /// Mutable active samples of one channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index][..self.num_samples]
    }

    /// Get a sample at the specified channel and index
    #[inline]
    pub fn get_sample(&self, channel: usize, index: usize) -> Option<f32> {
        if index >= self.num_samples {
            return None;
        }
        self.samples.get(channel).map(|ch| ch[index])
    }

    /// Set a sample at the specified channel and index
    ///
    /// Returns false if the indices are out of bounds.
    #[inline]
    pub fn set_sample(&mut self, channel: usize, index: usize, value: f32) -> bool {
        if index >= self.num_samples {
            return false;
        }
        match self.samples.get_mut(channel) {
            Some(ch) => {
                ch[index] = value;
                true
            }
            None => false,
        }
    }

    /// Overwrite the active region with silence
    pub fn clear(&mut self) {
        let len = self.num_samples;
        for channel in &mut self.samples {
            channel[..len].fill(0.0);
        }
    }

    /// Copy the active region of `source` into this buffer
    ///
    /// Adopts the source's active length. Never reallocates.
    pub fn copy_from(&mut self, source: &AudioBuffer) -> Result<()> {
        self.check_channels(source)?;
        self.set_num_samples(source.num_samples)?;

        let len = self.num_samples;
        for (dest, src) in self.samples.iter_mut().zip(&source.samples) {
            dest[..len].copy_from_slice(&src[..len]);
        }
        Ok(())
    }

    /// Add the active region of `source` into this buffer, sample for sample
    pub fn add_from(&mut self, source: &AudioBuffer) -> Result<()> {
        self.check_channels(source)?;
        if source.num_samples != self.num_samples {
            return Err(MbcError::BlockTooLarge {
                max: self.num_samples,
                actual: source.num_samples,
            });
        }

        let len = self.num_samples;
        for (dest, src) in self.samples.iter_mut().zip(&source.samples) {
            for (d, s) in dest[..len].iter_mut().zip(&src[..len]) {
                *d += *s;
            }
        }
        Ok(())
    }

    /// Copy `len` samples of `source` starting at `start` into this buffer
    ///
    /// Used to cut a long recording into processing blocks.
    pub fn copy_from_range(
        &mut self,
        source: &AudioBuffer,
        start: usize,
        len: usize,
    ) -> Result<()> {
        self.check_channels(source)?;
        let start = start.min(source.num_samples);
        let end = start.saturating_add(len).min(source.num_samples);
        let len = end - start;
        self.set_num_samples(len)?;

        for (dest, src) in self.samples.iter_mut().zip(&source.samples) {
            dest[..len].copy_from_slice(&src[start..end]);
        }
        Ok(())
    }

    /// Write the active region into `dest` starting at `start`
    pub fn copy_into_range(&self, dest: &mut AudioBuffer, start: usize) -> Result<()> {
        self.check_channels(dest)?;
        let end = start + self.num_samples;
        if end > dest.num_samples {
            return Err(MbcError::BlockTooLarge {
                max: dest.num_samples.saturating_sub(start),
                actual: self.num_samples,
            });
        }

        for (src, out) in self.samples.iter().zip(dest.samples.iter_mut()) {
            out[start..end].copy_from_slice(&src[..self.num_samples]);
        }
        Ok(())
    }

    /// Check if all active samples are finite (not NaN or Infinity)
    pub fn is_finite(&self) -> bool {
        (0..self.num_channels()).all(|ch| self.channel(ch).iter().all(|s| s.is_finite()))
    }

    /// RMS level of one channel in dB
    pub fn rms_db(&self, channel: usize) -> f32 {
        if channel >= self.num_channels() {
            return f32::NEG_INFINITY;
        }
        linear_to_db(calculate_rms(self.channel(channel)))
    }

    fn check_channels(&self, other: &AudioBuffer) -> Result<()> {
        if self.num_channels() != other.num_channels() {
            return Err(MbcError::ChannelMismatch {
                expected: self.num_channels(),
                actual: other.num_channels(),
            });
        }
        Ok(())
    }
}

impl Default for AudioBuffer {
    fn default() -> Self {
        Self::new(2, 0)
    }
}

// ============================================================================
// Tests
// ============================================================================
