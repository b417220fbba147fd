//! CLI Module
//!
//! Command-line interface for offline rendering with the multiband
//! compressor.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Block size used by `render` when none is given
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// mbcomp - three-band compressor for WAV files
#[derive(Parser, Debug)]
#[command(name = "mbcomp-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a WAV file through the multiband compressor
    #[command(name = "render")]
    Render {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,

        /// JSON settings file (defaults are used for missing fields)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Samples per processing block
        #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
        block_size: usize,
    },

    /// Print the default settings as JSON
    #[command(name = "defaults")]
    Defaults,

    /// Validate a JSON settings file
    #[command(name = "check-config")]
    CheckConfig {
        /// Path to the settings file
        path: PathBuf,
    },
}
