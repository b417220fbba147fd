//! Audio file I/O for mbcomp
//!
//! WAV import/export for offline rendering. Audio is kept at the file's own
//! sample rate; the processor is prepared for whatever rate the file uses.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::AudioBuffer;
use crate::error::{MbcError, Result};

/// Sample encoding of a WAV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    /// Bit depth: 16, 24, or 32
    pub bit_depth: u16,
    /// Whether samples are IEEE float (only valid with 32 bits)
    pub float: bool,
}

impl Default for WavFormat {
    fn default() -> Self {
        WavFormat {
            bit_depth: 32,
            float: true,
        }
    }
}

impl WavFormat {
    /// 16-bit integer PCM
    pub fn pcm16() -> Self {
        WavFormat {
            bit_depth: 16,
            float: false,
        }
    }

    /// 24-bit integer PCM
    pub fn pcm24() -> Self {
        WavFormat {
            bit_depth: 24,
            float: false,
        }
    }
}

/// A decoded audio file
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub buffer: AudioBuffer,
    pub sample_rate: u32,
    pub format: WavFormat,
}

impl AudioFile {
    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.buffer.num_samples() as f64 / self.sample_rate as f64
    }
}

/// Import a WAV file as 32-bit float samples
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `Wav` - If the file is not a readable WAV file
/// * `UnsupportedFormat` - If the integer bit depth is not 8/16/24/32
/// * `InvalidAudio` - If the file contains no samples
pub fn import_audio(path: &Path) -> Result<AudioFile> {
    if !path.exists() {
        return Err(MbcError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    if interleaved.is_empty() {
        return Err(MbcError::InvalidAudio {
            reason: "file contains no samples".to_string(),
        });
    }

    let buffer = AudioBuffer::from_interleaved(&interleaved, channels)?;

    let format = match spec.sample_format {
        SampleFormat::Float => WavFormat::default(),
        SampleFormat::Int => WavFormat {
            // 8-bit sources are written back as 16-bit
            bit_depth: spec.bits_per_sample.max(16),
            float: false,
        },
    };

    Ok(AudioFile {
        buffer,
        sample_rate: spec.sample_rate,
        format,
    })
}

/// Export an AudioBuffer to a WAV file
pub fn export_audio(
    buffer: &AudioBuffer,
    sample_rate: u32,
    path: &Path,
    format: WavFormat,
) -> Result<()> {
    let sample_format = match (format.bit_depth, format.float) {
        (32, true) => SampleFormat::Float,
        (16 | 24 | 32, false) => SampleFormat::Int,
        _ => {
            return Err(MbcError::UnsupportedFormat {
                format: format!(
                    "{}-bit {} audio",
                    format.bit_depth,
                    if format.float { "float" } else { "integer" }
                ),
            });
        }
    };

    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate,
        bits_per_sample: format.bit_depth,
        sample_format,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let interleaved = buffer.to_interleaved();

    match (format.bit_depth, format.float) {
        (32, true) => {
            for sample in interleaved {
                writer.write_sample(sample)?;
            }
        }
        (16, _) => {
            for sample in interleaved {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled)?;
            }
        }
        (24, _) => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled)?;
            }
        }
        _ => {
            for sample in interleaved {
                let scaled = (sample as f64 * 2147483647.0)
                    .clamp(-2147483648.0, 2147483647.0) as i32;
                writer.write_sample(scaled)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Generate a sine tone with the same content in every channel
pub fn generate_sine(
    frequency: f32,
    amplitude: f32,
    num_channels: usize,
    num_samples: usize,
    sample_rate: f64,
) -> AudioBuffer {
    let mut buffer = AudioBuffer::new(num_channels, num_samples);
    let angular_freq = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate;

    for ch in 0..num_channels {
        for (i, sample) in buffer.channel_mut(ch).iter_mut().enumerate() {
            *sample = amplitude * (angular_freq * i as f64).sin() as f32;
        }
    }

    buffer
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let samples: Vec<f32> = match sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = match bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                _ => {
                    return Err(MbcError::UnsupportedFormat {
                        format: format!("{}-bit integer audio", bits_per_sample),
                    });
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v as f64 / scale) as f32))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    Ok(samples)
}

// ============================================================================
// Tests
// ============================================================================
