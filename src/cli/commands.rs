//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::{info, warn};

use crate::dsp::ProcessSpec;
use crate::engine::{calculate_peak_db, export_audio, import_audio, AudioBuffer, MultibandProcessor};
use crate::error::Result;
use crate::params::{MultibandSettings, SharedParams};

/// What `render` did, for reporting
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub num_samples: usize,
    pub num_channels: usize,
    pub sample_rate: u32,
    pub blocks: usize,
    pub input_peak_db: f32,
    pub output_peak_db: f32,
}

/// Load settings from `config`, or defaults when no file is given
pub fn load_settings(config: Option<&Path>) -> Result<MultibandSettings> {
    match config {
        Some(path) => {
            info!("Loading settings: {}", path.display());
            MultibandSettings::from_json_file(path)
        }
        None => Ok(MultibandSettings::default()),
    }
}

/// Render a WAV file through the multiband compressor.
///
/// The file is processed block by block at its own sample rate and written
/// back in the same sample format.
pub fn render(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    block_size: usize,
) -> Result<RenderSummary> {
    let settings = load_settings(config)?;

    info!("Reading: {}", input.display());
    let file = import_audio(input)?;
    let channels = file.buffer.num_channels();
    let total = file.buffer.num_samples();
    info!(
        "{} channel(s), {} Hz, {:.2}s",
        channels,
        file.sample_rate,
        file.duration_secs()
    );

    if let Err(e) = settings.crossover.validate_for_sample_rate(file.sample_rate as f64) {
        warn!("Crossover settings out of range, filters will clamp: {}", e);
    }
    if let Err(e) = settings.validate() {
        warn!("Settings out of range, values will be clamped: {}", e);
    }

    let mut processor = MultibandProcessor::with_params(SharedParams::new(&settings));
    processor.prepare(&ProcessSpec::new(
        file.sample_rate as f64,
        block_size,
        channels,
    ))?;

    let mut block = AudioBuffer::new(channels, block_size);
    let mut rendered = AudioBuffer::new(channels, total);
    let mut blocks = 0;
    for start in (0..total).step_by(block_size) {
        block.copy_from_range(&file.buffer, start, block_size)?;
        processor.process(&mut block)?;
        block.copy_into_range(&mut rendered, start)?;
        blocks += 1;
    }

    export_audio(&rendered, file.sample_rate, output, file.format)?;
    info!("Wrote: {}", output.display());

    Ok(RenderSummary {
        num_samples: total,
        num_channels: channels,
        sample_rate: file.sample_rate,
        blocks,
        input_peak_db: calculate_peak_db(&file.buffer),
        output_peak_db: calculate_peak_db(&rendered),
    })
}

/// Print the default settings as pretty JSON.
pub fn print_defaults() -> Result<()> {
    println!("{}", MultibandSettings::default().to_json_pretty()?);
    Ok(())
}

/// Load and validate a settings file.
pub fn check_config(path: &Path) -> Result<MultibandSettings> {
    info!("Checking settings: {}", path.display());
    let settings = MultibandSettings::from_json_file(path)?;
    settings.validate()?;
    Ok(settings)
}
