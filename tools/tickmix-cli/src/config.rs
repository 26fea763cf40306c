//! Config command - inspect or write `config.toml`

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use tickmix_shared::{SharedConfig, config};

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Config file to use instead of the platform default
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Write the effective configuration back to disk
    #[arg(long)]
    pub write: bool,
}

/// Execute the config command
pub fn execute(args: ConfigArgs) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => match config::config_dir() {
            Some(dir) => dir.join("config.toml"),
            None => bail!("Cannot determine the config directory; pass --path"),
        },
    };

    let effective = if path.exists() {
        config::load_from(&path)?
    } else {
        SharedConfig::default()
    };

    print!(
        "{}",
        toml::to_string_pretty(&effective).context("Failed to serialize config")?
    );

    if args.write {
        config::save_to(&path, &effective)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
