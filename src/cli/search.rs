use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use super::{open_session, OutputConfig};
use crate::config::Config;
use crate::search::{parse_keywords, DocumentSearch, SearchReport};

#[derive(Args)]
pub struct SearchArgs {
    /// Text to look for in document messages
    query: String,

    /// Comma-separated keywords used to discover channels
    #[arg(long, short = 'k')]
    keywords: Option<String>,
}

pub async fn run(args: SearchArgs, config: Config, output: OutputConfig) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        bail!("Please enter a search query.");
    }
    let keywords = parse_keywords(args.keywords.as_deref(), &config.search.fallback_keywords);
    if keywords.is_empty() {
        bail!("Please enter channel keywords.");
    }

    let session = open_session(&config)?;
    let result = {
        let client = session.acquire().await?;
        DocumentSearch::new(&*client, &config.search)
            .run(&keywords, query)
            .await
    };
    session.close().await;
    let report = result?;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !output.quiet {
        print_report(&report, output.verbose);
    }

    Ok(())
}

fn print_report(report: &SearchReport, verbose: bool) {
    if verbose {
        println!(
            "Keywords: {} ({} channels found, {} searched)",
            report.keywords.join(", ").cyan(),
            report.candidates,
            report.searched
        );
    }

    if let Some(reason) = &report.message {
        println!("{} {}", "!".yellow(), reason);
        return;
    }

    println!(
        "{} Found {} documents for \"{}\"",
        "✓".green(),
        report.matches.len(),
        report.query
    );
    println!();

    for (i, m) in report.matches.iter().enumerate() {
        println!(
            "{}. {} {}",
            (i + 1).to_string().bold(),
            m.filename.blue(),
            format!("({})", m.size_readable).dimmed()
        );
        println!("   {} · {}", m.channel_name.cyan(), m.date);
        println!(
            "   {} {} {}",
            "fetch:".dimmed(),
            m.channel_id,
            m.message_id
        );
        if let Some(link) = &m.link {
            println!("   {}", link.dimmed());
        }
    }
}
