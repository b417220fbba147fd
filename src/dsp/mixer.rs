//! Band mixer
//!
//! Sums processed band buffers into the output. Precedence:
//! 1. A muted band never contributes.
//! 2. When any band is soloed, only soloed bands contribute.
//! 3. Otherwise every band contributes.
//!
//! Global bypass is handled by `sum_all`, which ignores every flag.

use super::splitter::BandBuffers;
use crate::engine::AudioBuffer;
use crate::error::Result;
use crate::params::{BandState, NUM_BANDS};

/// True when at least one band is soloed
pub fn any_solo(states: &[BandState; NUM_BANDS]) -> bool {
    states.iter().any(|s| s.solo)
}

/// Whether a band reaches the output under the solo/mute policy
#[inline]
pub fn band_included(state: &BandState, any_solo: bool) -> bool {
    !state.mute && (!any_solo || state.solo)
}

/// Recombines band buffers into one output buffer
#[derive(Debug, Clone, Copy, Default)]
pub struct BandMixer;

impl BandMixer {
    pub fn new() -> Self {
        Self
    }

    /// Clear `output` and add every band included by the routing flags
    ///
    /// Returns the number of bands that were summed.
    pub fn mix(
        &self,
        bands: &BandBuffers,
        states: &[BandState; NUM_BANDS],
        output: &mut AudioBuffer,
    ) -> Result<usize> {
        let solo = any_solo(states);
        self.sum_where(bands, output, |i| band_included(&states[i], solo))
    }

    /// Clear `output` and add all bands, ignoring mute and solo
    pub fn sum_all(&self, bands: &BandBuffers, output: &mut AudioBuffer) -> Result<usize> {
        self.sum_where(bands, output, |_| true)
    }

    fn sum_where(
        &self,
        bands: &BandBuffers,
        output: &mut AudioBuffer,
        include: impl Fn(usize) -> bool,
    ) -> Result<usize> {
        output.set_num_samples(bands[0].num_samples())?;
        output.clear();

        let mut summed = 0;
        for (i, band) in bands.iter().enumerate() {
            if include(i) {
                output.add_from(band)?;
                summed += 1;
            }
        }
        Ok(summed)
    }
}
