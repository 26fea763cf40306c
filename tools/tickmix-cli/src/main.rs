//! Tickmix CLI - drive the deterministic audio core from the command line
//!
//! # Commands
//!
//! - `tickmix render` - Play a WAV through the mixer tick by tick and write the result
//! - `tickmix config` - Show or write the audio configuration
//!
//! # Usage
//!
//! ```bash
//! # Ten seconds at 60 ticks per second, looping the input
//! tickmix render --input music.wav --output out.wav --frames 600 --loop
//!
//! # Write the default config.toml to the platform config directory
//! tickmix config --write
//! ```

mod config;
mod render;
mod wav;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Tickmix CLI - deterministic audio rendering
#[derive(Parser)]
#[command(name = "tickmix")]
#[command(about = "Deterministic tick-driven audio mixing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a WAV through the mixer tick by tick and write the result
    Render(render::RenderArgs),

    /// Show or write the audio configuration
    Config(config::ConfigArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => render::execute(args),
        Commands::Config(args) => config::execute(args),
    }
}
