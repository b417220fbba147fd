//! Multiband processing pipeline
//!
//! Owns the splitter, the three band compressors, the mixer and the band
//! buffers. `prepare` moves the processor from unprepared to prepared and
//! sizes every buffer; `process` then runs one block:
//!
//! 1. pull a settings snapshot and apply it to filters and compressors
//! 2. split the block into low, mid and high
//! 3. run each band compressor in place; under global bypass the
//!    compressors only track their band's level
//! 4. mix the bands back into the caller's buffer
//!
//! `process` never allocates and never logs. Shape or lifecycle violations
//! return an error before the caller's buffer is touched, so a rejected
//! block passes through unchanged.

use crate::dsp::{BandBuffers, BandCompressor, BandMixer, Effect, ProcessSpec, ThreeBandSplitter};
use crate::engine::AudioBuffer;
use crate::error::{MbcError, Result};
use crate::params::{Band, MultibandSettings, SharedParams, NUM_BANDS};

/// Three-band compressor
pub struct MultibandProcessor {
    params: SharedParams,
    /// `None` until `prepare` succeeds
    spec: Option<ProcessSpec>,
    /// Snapshot applied to the most recent block
    settings: MultibandSettings,
    splitter: ThreeBandSplitter,
    bands: [BandCompressor; NUM_BANDS],
    mixer: BandMixer,
    band_buffers: BandBuffers,
}

impl MultibandProcessor {
    /// Create an unprepared processor reading from a fresh parameter store
    pub fn new() -> Self {
        Self::with_params(SharedParams::default())
    }

    /// Create an unprepared processor reading from `params`
    pub fn with_params(params: SharedParams) -> Self {
        let settings = params.snapshot();
        Self {
            splitter: ThreeBandSplitter::new(&settings.crossover),
            bands: Band::ALL.map(|band| BandCompressor::new(settings.band(band))),
            mixer: BandMixer::new(),
            band_buffers: std::array::from_fn(|_| AudioBuffer::new(0, 0)),
            spec: None,
            settings,
            params,
        }
    }

    /// Handle to the parameter store; clone it for the control thread
    pub fn params(&self) -> &SharedParams {
        &self.params
    }

    /// Settings applied to the most recent block
    pub fn settings(&self) -> &MultibandSettings {
        &self.settings
    }

    /// Context given to the last successful `prepare`
    pub fn spec(&self) -> Option<&ProcessSpec> {
        self.spec.as_ref()
    }

    pub fn is_prepared(&self) -> bool {
        self.spec.is_some()
    }

    /// Size all internal state and clear filter and envelope history
    ///
    /// May be called again at any time to change sample rate, block size or
    /// channel count. On error the processor is left unprepared.
    pub fn prepare(&mut self, spec: &ProcessSpec) -> Result<()> {
        self.spec = None;
        spec.validate()?;

        let settings = self.params.snapshot();
        self.apply_settings(&settings);
        self.splitter.prepare(spec)?;
        for compressor in &mut self.bands {
            compressor.prepare(spec)?;
        }
        self.band_buffers =
            std::array::from_fn(|_| AudioBuffer::new(spec.num_channels, spec.max_block_size));

        self.spec = Some(*spec);
        tracing::debug!(
            sample_rate = spec.sample_rate,
            max_block_size = spec.max_block_size,
            channels = spec.num_channels,
            latency = self.latency_samples(),
            "multiband processor prepared"
        );
        Ok(())
    }

    /// Clear filter and envelope history without reallocating
    pub fn reset(&mut self) {
        self.splitter.reset();
        for band in &mut self.bands {
            band.reset();
        }
        tracing::trace!("multiband processor reset");
    }

    /// Process one block in place using the current shared parameters
    pub fn process(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        let settings = self.params.snapshot();
        self.process_with(buffer, &settings)
    }

    /// Process one block in place using an explicit settings snapshot
    ///
    /// # Errors
    /// * `NotPrepared` - If `prepare` has not succeeded
    /// * `ChannelMismatch` - If the buffer's channel count differs from the prepared one
    /// * `BlockTooLarge` - If the block is longer than the prepared maximum
    pub fn process_with(
        &mut self,
        buffer: &mut AudioBuffer,
        settings: &MultibandSettings,
    ) -> Result<()> {
        let spec = self.spec.ok_or(MbcError::NotPrepared)?;
        if buffer.num_channels() != spec.num_channels {
            return Err(MbcError::ChannelMismatch {
                expected: spec.num_channels,
                actual: buffer.num_channels(),
            });
        }
        if buffer.num_samples() > spec.max_block_size {
            return Err(MbcError::BlockTooLarge {
                max: spec.max_block_size,
                actual: buffer.num_samples(),
            });
        }

        self.apply_settings(settings);
        self.splitter.split(buffer, &mut self.band_buffers)?;

        if settings.global_bypass {
            for (compressor, band_buffer) in self.bands.iter_mut().zip(self.band_buffers.iter()) {
                compressor.track(band_buffer);
            }
            self.mixer.sum_all(&self.band_buffers, buffer)?;
            return Ok(());
        }

        for (compressor, band_buffer) in self.bands.iter_mut().zip(self.band_buffers.iter_mut()) {
            compressor.process(band_buffer);
        }
        self.mixer
            .mix(&self.band_buffers, &settings.band_states(), buffer)?;
        Ok(())
    }

    /// Latency of the signal path in samples
    pub fn latency_samples(&self) -> usize {
        let bands = self
            .bands
            .iter()
            .map(|band| band.latency_samples())
            .max()
            .unwrap_or(0);
        self.splitter.latency_samples() + bands
    }

    /// Current gain reduction of one band in dB, for metering
    pub fn gain_reduction_db(&self, band: Band) -> f32 {
        if self.settings.global_bypass {
            return 0.0;
        }
        self.bands[band.index()].gain_reduction_db()
    }

    fn apply_settings(&mut self, settings: &MultibandSettings) {
        self.settings = *settings;
        self.splitter.set_crossover(&settings.crossover.clamped());
        for band in Band::ALL {
            self.bands[band.index()].apply(settings.band(band));
        }
    }
}

impl Default for MultibandProcessor {
    fn default() -> Self {
        Self::new()
    }
}
