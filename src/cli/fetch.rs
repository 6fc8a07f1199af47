use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::{open_session, OutputConfig};
use crate::config::Config;
use crate::flood::FloodControl;
use crate::search::{format_size, retrieve_file, safe_filename, Retrieval};

#[derive(Args)]
pub struct FetchArgs {
    /// Channel or chat id, as printed by `tgdoc search`
    #[arg(allow_negative_numbers = true)]
    channel_id: i64,

    /// Message id within the channel
    message_id: i32,

    /// Directory to save the file in
    #[arg(long = "output", short = 'o', default_value = ".")]
    dir: PathBuf,
}

#[derive(Serialize)]
struct FetchOutput {
    filename: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    size_bytes: u64,
}

pub async fn run(args: FetchArgs, config: Config, output: OutputConfig) -> Result<()> {
    let scratch = tempfile::Builder::new()
        .prefix("tgdoc-")
        .tempdir()
        .context("Failed to create scratch directory")?;
    let flood = FloodControl::from_secs(config.search.flood_margin_secs);

    let session = open_session(&config)?;
    let result = {
        let client = session.acquire().await?;
        retrieve_file(
            &*client,
            args.channel_id,
            args.message_id,
            scratch.path(),
            &flood,
        )
        .await
    };
    session.close().await;

    let file = match result? {
        Retrieval::Found(file) => file,
        Retrieval::NotFound(reason) => bail!(
            "File not found for message {} in {}: {}",
            args.message_id,
            args.channel_id,
            reason
        ),
    };

    std::fs::create_dir_all(&args.dir)
        .with_context(|| format!("Failed to create directory: {}", args.dir.display()))?;
    let dest = args.dir.join(safe_filename(&file.filename));
    tokio::fs::copy(&file.path, &dest)
        .await
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    if output.json {
        let json_output = FetchOutput {
            filename: file.filename,
            path: dest.display().to_string(),
            mime_type: file.mime_type,
            size_bytes: file.size_bytes,
        };
        println!("{}", serde_json::to_string_pretty(&json_output)?);
    } else if !output.quiet {
        println!(
            "{} Saved {} ({})",
            "✓".green(),
            file.filename.blue(),
            format_size(Some(file.size_bytes))
        );
        println!("  Path: {}", dest.display());
        if output.verbose {
            if let Some(mime) = &file.mime_type {
                println!("  Type: {}", mime);
            }
        }
    }

    Ok(())
}
