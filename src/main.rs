//! mbcomp CLI - Multiband Compressor
//!
//! Command-line interface for offline rendering.

use anyhow::Context;
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use mbcomp::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides the default level
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!("mbcomp v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("mbcomp v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Render {
            input,
            output,
            config,
            block_size,
        } => {
            let summary = commands::render(&input, &output, config.as_deref(), block_size)
                .with_context(|| format!("failed to render {}", input.display()))?;
            println!(
                "Rendered {} samples x {} channel(s) at {} Hz in {} blocks",
                summary.num_samples, summary.num_channels, summary.sample_rate, summary.blocks
            );
            println!(
                "Peak: {:.1} dBFS in, {:.1} dBFS out",
                summary.input_peak_db, summary.output_peak_db
            );
            Ok(())
        }
        Commands::Defaults => Ok(commands::print_defaults()?),
        Commands::CheckConfig { path } => {
            commands::check_config(&path)
                .with_context(|| format!("invalid config {}", path.display()))?;
            println!("Config OK: {}", path.display());
            Ok(())
        }
    }
}
