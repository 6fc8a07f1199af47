mod completions;
mod fetch;
mod init;
mod search;
mod serve;
mod status;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::session::Session;
use crate::telegram::GatewayClient;

#[derive(Parser)]
#[command(name = "tgdoc")]
#[command(about = "Find documents shared in public Telegram channels and fetch them")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./tgdoc.toml, then the user config directory)
    #[arg(long, global = true, env = "TGDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Session gateway URL, overriding the config file
    #[arg(long, global = true, env = "TGDOC_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Show detailed progress
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default tgdoc.toml
    Init(init::InitArgs),

    /// Run the HTTP API
    Serve(serve::ServeArgs),

    /// Discover channels by keyword and search them for documents
    Search(search::SearchArgs),

    /// Download the document attached to a message
    Fetch(fetch::FetchArgs),

    /// Check the connection to Telegram
    Status(status::StatusArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

impl Cli {
    /// Log level implied by `--quiet` / `--verbose`.
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::ERROR
        } else {
            tracing::Level::INFO
        }
    }

    pub async fn run(self) -> Result<()> {
        let output = OutputConfig {
            json: self.json,
            quiet: self.quiet,
            verbose: self.verbose,
        };
        let config_path = self.config;
        let gateway_url = self.gateway_url;
        let load = || -> Result<Config> {
            let mut config = Config::load_or_default(config_path.as_deref())?;
            if let Some(url) = &gateway_url {
                config.telegram.gateway_url = url.clone();
            }
            Ok(config)
        };

        match self.command {
            Commands::Init(args) => init::run(args, config_path.as_deref(), output),
            Commands::Serve(args) => serve::run(args, load()?).await,
            Commands::Search(args) => search::run(args, load()?, output).await,
            Commands::Fetch(args) => fetch::run(args, load()?, output).await,
            Commands::Status(args) => status::run(args, load()?, output).await,
            Commands::Completions(args) => {
                completions::run(args);
                Ok(())
            }
        }
    }
}

/// Output configuration passed to all commands
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
}

/// Session over the configured gateway. Does not connect yet.
fn open_session(config: &Config) -> Result<Session<GatewayClient>> {
    let client = GatewayClient::from_config(&config.telegram)
        .context("Failed to create gateway client")?;
    Ok(Session::new(client))
}
