//! Channel discovery, document search and file retrieval.

mod discovery;
mod documents;
mod retrieve;

use serde::Serialize;

use crate::config::SearchConfig;
use crate::error::Result;
use crate::flood::FloodControl;
use crate::telegram::TelegramApi;
use crate::types::DocumentMatch;

pub use documents::format_size;
pub use retrieve::{retrieve_file, safe_filename, Retrieval};

/// Runs discovery and document search against one client.
///
/// Every remote call is awaited before the next one is issued; flood waits
/// pause the whole pipeline.
pub struct DocumentSearch<'a, C> {
    client: &'a C,
    config: &'a SearchConfig,
    flood: FloodControl,
}

/// Outcome of a full search request
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub keywords: Vec<String>,
    /// Unique entities returned by discovery
    pub candidates: usize,
    /// Entities that were eligible for message search
    pub searched: usize,
    pub matches: Vec<DocumentMatch>,
    /// Why `matches` is empty, when it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SearchReport {
    /// Explanation to show instead of an empty result list.
    pub fn empty_reason(&self) -> Option<String> {
        if self.candidates == 0 {
            Some("No relevant public channels/chats found matching criteria.".to_string())
        } else if self.matches.is_empty() {
            Some(format!(
                "No files found for '{}' in the searched channels/chats.",
                self.query
            ))
        } else {
            None
        }
    }
}

impl<'a, C: TelegramApi> DocumentSearch<'a, C> {
    pub fn new(client: &'a C, config: &'a SearchConfig) -> Self {
        Self {
            client,
            config,
            flood: FloodControl::from_secs(config.flood_margin_secs),
        }
    }

    /// Discover candidate channels for `keywords`, then search them for `query`.
    pub async fn run(&self, keywords: &[String], query: &str) -> Result<SearchReport> {
        let candidates = self.discover_candidates(keywords).await?;
        let mut report = SearchReport {
            query: query.to_string(),
            keywords: keywords.to_vec(),
            candidates: candidates.len(),
            searched: candidates.eligible().count(),
            matches: vec![],
            message: None,
        };

        if candidates.is_empty() {
            tracing::info!("No candidate entities found from global search");
        } else {
            report.matches = self.search_documents(candidates.iter(), query).await?;
            if report.matches.is_empty() {
                tracing::info!("No files found for '{}' in the identified entities", query);
            }
        }
        report.message = report.empty_reason();
        Ok(report)
    }
}

/// Split a comma-separated keyword list, falling back to `fallback` when the
/// caller supplied nothing usable.
pub fn parse_keywords(raw: Option<&str>, fallback: &[String]) -> Vec<String> {
    let parsed: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();

    if parsed.is_empty() {
        fallback
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        parsed
    }
}
