//! Band compressor
//!
//! One compressor plus the routing flags of its band.
//!
//! Flag handling:
//! - `mute`: the buffer is cleared and the compressor does not run, so its
//!   envelope holds its last value.
//! - `bypass`: no gain is applied but the envelope keeps following the band,
//!   so releasing bypass mid-stream starts from current signal history.
//! - `solo`: ignored here; resolved by the mixer.
//!
//! Global bypass sits above these flags: the pipeline calls `track` on every
//! band instead of `process`, so all envelopes stay current whatever the
//! band's own flags say.

use super::compressor::Compressor;
use super::effect::{Effect, ProcessSpec};
use crate::engine::AudioBuffer;
use crate::error::Result;
use crate::params::{BandSettings, BandState, CompressorSettings};

/// Dynamics unit for one frequency band
#[derive(Debug, Clone, Default)]
pub struct BandCompressor {
    compressor: Compressor,
    state: BandState,
}

impl BandCompressor {
    pub fn new(settings: &BandSettings) -> Self {
        Self {
            compressor: Compressor::with_settings(settings.compressor),
            state: settings.state,
        }
    }

    /// Refresh compressor settings; called once per block before `process`
    pub fn update_settings(&mut self, settings: &CompressorSettings) {
        self.compressor.update_settings(settings);
    }

    pub fn set_state(&mut self, state: BandState) {
        self.state = state;
    }

    /// Refresh both compressor settings and routing flags
    pub fn apply(&mut self, settings: &BandSettings) {
        self.update_settings(&settings.compressor);
        self.set_state(settings.state);
    }

    pub fn state(&self) -> BandState {
        self.state
    }

    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Follow the band's level without touching the audio
    pub fn track(&mut self, buffer: &AudioBuffer) {
        self.compressor.track(buffer);
    }

    /// Current gain reduction in dB (0 while muted or bypassed)
    pub fn gain_reduction_db(&self) -> f32 {
        if self.state.mute || self.state.bypass {
            0.0
        } else {
            self.compressor.gain_reduction_db()
        }
    }
}

impl Effect for BandCompressor {
    fn prepare(&mut self, spec: &ProcessSpec) -> Result<()> {
        self.compressor.prepare(spec)
    }

    fn reset(&mut self) {
        self.compressor.reset();
    }

    fn process(&mut self, buffer: &mut AudioBuffer) {
        if self.state.mute {
            buffer.clear();
            return;
        }

        if self.state.bypass {
            self.compressor.track(buffer);
        } else {
            self.compressor.process(buffer);
        }
    }
}
