use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::OutputConfig;
use crate::config::{Config, CONFIG_FILE};

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite existing configuration
    #[arg(long)]
    force: bool,
}

#[derive(Serialize)]
struct InitOutput {
    status: String,
    config: String,
}

/// Write the default configuration to `path`, or `./tgdoc.toml`.
pub fn run(args: InitArgs, path: Option<&Path>, output: OutputConfig) -> Result<()> {
    let config_path = path.map_or_else(|| PathBuf::from(CONFIG_FILE), Path::to_path_buf);

    if config_path.exists() && !args.force {
        if output.json {
            let json_output = InitOutput {
                status: "already_initialized".to_string(),
                config: config_path.display().to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&json_output)?);
            return Ok(());
        }
        bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    Config::default().save(&config_path)?;

    if output.json {
        let json_output = InitOutput {
            status: "initialized".to_string(),
            config: config_path.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&json_output)?);
    } else if !output.quiet {
        println!("{} Wrote {}", "✓".green(), config_path.display());
        println!("\nNext steps:");
        println!("  Point [telegram] gateway_url at your session gateway");
        println!(
            "  {} to look for documents",
            "tgdoc search <query> -k <keywords>".cyan()
        );
    }

    Ok(())
}
