//! DSP building blocks
//!
//! Crossover filters, the three-band splitter, per-band dynamics and the
//! band mixer. Stages that run in place on a buffer implement the `Effect`
//! trait.

mod band;
mod compressor;
mod crossover;
mod effect;
mod mixer;
mod splitter;

pub use band::BandCompressor;
pub use compressor::Compressor;
pub use crossover::{CrossoverPair, FilterType, LinkwitzRiley, MIN_CUTOFF_HZ};
pub use effect::{Effect, ProcessSpec};
pub use mixer::{any_solo, band_included, BandMixer};
pub use splitter::{BandBuffers, ThreeBandSplitter};
