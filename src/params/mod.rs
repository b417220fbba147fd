//! Control parameters
//!
//! Settings snapshots, their ranges and defaults, and the lock-free store the
//! control thread writes into.

mod settings;
mod shared;

pub use settings::{
    ratio_choice_label, ratio_from_choice, Band, BandSettings, BandState, CompressorSettings,
    CrossoverSpec, MultibandSettings, CROSSOVER_RANGE_HZ, DEFAULT_RATIO_CHOICE, NUM_BANDS,
    RATIO_CHOICES, THRESHOLD_RANGE_DB, TIME_RANGE_MS,
};
pub use shared::SharedParams;
