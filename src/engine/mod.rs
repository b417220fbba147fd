//! Audio Engine Module
//!
//! Core audio processing engine including:
//! - Audio buffer management
//! - WAV file I/O
//! - The multiband processing pipeline

pub mod buffer;
pub mod io;
pub mod pipeline;

pub use buffer::{calculate_peak_db, calculate_rms, db_to_linear, linear_to_db, AudioBuffer};
pub use io::{export_audio, generate_sine, import_audio, AudioFile, WavFormat};
pub use pipeline::MultibandProcessor;
