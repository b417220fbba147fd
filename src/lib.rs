//! mbcomp - Three-Band Multiband Compressor
//!
//! Splits audio into low, mid and high bands with Linkwitz-Riley crossovers,
//! compresses each band independently and sums the bands back together.
//!
//! # Architecture
//!
//! - `params`: settings snapshots and the lock-free store written by the
//!   control thread
//! - `dsp`: crossover filters, splitter, compressors and mixer
//! - `engine`: audio buffers, WAV I/O and the `MultibandProcessor` pipeline
//! - `cli`: offline rendering commands
//!
//! ```no_run
//! use mbcomp::dsp::ProcessSpec;
//! use mbcomp::engine::{AudioBuffer, MultibandProcessor};
//! use mbcomp::params::Band;
//!
//! let mut processor = MultibandProcessor::new();
//! processor.prepare(&ProcessSpec::new(48000.0, 512, 2)).unwrap();
//!
//! // Control thread
//! let control = processor.params().clone();
//! control.set_threshold_db(Band::Low, -24.0);
//!
//! // Audio thread
//! let mut block = AudioBuffer::new(2, 512);
//! processor.process(&mut block).unwrap();
//! ```

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod params;

pub use error::{MbcError, Result};
