use anyhow::{Context, Result};
use clap::Args;

use crate::config::Config;

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind (default: [server] host from config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (default: [server] port from config)
    #[arg(long, short)]
    port: Option<u16>,
}

pub async fn run(args: ServeArgs, config: Config) -> Result<()> {
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .with_context(|| format!("Invalid listen address: {host}:{port}"))?
        .next()
        .with_context(|| format!("No address found for {host}:{port}"))?;

    crate::http::run_server(config, addr).await
}
