use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod error;
mod flood;
mod http;
mod search;
mod session;
mod telegram;
mod types;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(cli.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    cli.run().await
}
