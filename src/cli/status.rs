use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::{open_session, OutputConfig};
use crate::config::Config;

#[derive(Args)]
pub struct StatusArgs {
    /// Report the state without trying to connect
    #[arg(long)]
    no_connect: bool,
}

#[derive(Serialize)]
struct StatusOutput {
    status: String,
    gateway_url: String,
    connected: bool,
    authorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(args: StatusArgs, config: Config, output: OutputConfig) -> Result<()> {
    let session = open_session(&config)?;

    let error = if args.no_connect {
        None
    } else {
        session.acquire().await.err().map(|e| e.to_string())
    };
    let state = session.status().await;
    session.close().await;

    let status = match (&error, state.authorized) {
        (None, true) => "ready",
        (Some(_), _) => "error",
        (None, false) => "disconnected",
    };

    if output.json {
        let json_output = StatusOutput {
            status: status.to_string(),
            gateway_url: config.telegram.gateway_url,
            connected: state.connected,
            authorized: state.authorized,
            error,
        };
        println!("{}", serde_json::to_string_pretty(&json_output)?);
    } else if !output.quiet {
        let marker = if error.is_none() && state.authorized {
            "✓".green()
        } else {
            "!".yellow()
        };
        println!("{} tgdoc status", marker);
        println!();
        println!("  Gateway:    {}", config.telegram.gateway_url.cyan());
        println!("  Connected:  {}", yes_no(state.connected));
        println!("  Authorized: {}", yes_no(state.authorized));
        if let Some(e) = &error {
            println!("  Error:      {}", e.red());
        }
    }

    Ok(())
}

fn yes_no(value: bool) -> colored::ColoredString {
    if value {
        "yes".green()
    } else {
        "no".yellow()
    }
}
