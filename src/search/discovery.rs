use std::collections::HashSet;

use super::DocumentSearch;
use crate::error::Result;
use crate::session::ensure_ready;
use crate::telegram::TelegramApi;
use crate::types::RemoteEntity;

/// Entities found by discovery, unique by id, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    seen: HashSet<i64>,
    entities: Vec<RemoteEntity>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `entity` unless its id is already present. Returns whether it was added.
    pub fn insert(&mut self, entity: RemoteEntity) -> bool {
        if !self.seen.insert(entity.id) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.entities.iter()
    }

    /// Candidates that support message search.
    pub fn eligible(&self) -> impl Iterator<Item = &RemoteEntity> {
        self.iter().filter(|e| e.supports_message_search())
    }
}

impl<C: TelegramApi> DocumentSearch<'_, C> {
    /// Run one global search per keyword and merge the results by id.
    ///
    /// A flood wait pauses and moves on to the next keyword; any other
    /// per-keyword failure is logged and skipped. Only the readiness guard can
    /// fail the whole call.
    pub async fn discover_candidates(&self, keywords: &[String]) -> Result<CandidateSet> {
        ensure_ready(self.client).await?;
        let limit = self.config.channel_limit_per_keyword;
        let mut candidates = CandidateSet::new();

        for keyword in keywords {
            tracing::info!("Globally searching for entities related to '{}'", keyword);
            let found = match self.client.global_search(keyword, limit).await {
                Ok(found) => found,
                Err(e) => {
                    let step = format!("global search for '{keyword}'");
                    if !self.flood.absorb(&e, &step).await {
                        tracing::error!("Error during global search for '{}': {}", keyword, e);
                    }
                    continue;
                }
            };

            for entity in found {
                let (id, kind, name) = (entity.id, entity.kind, entity.display_name());
                if candidates.insert(entity) {
                    tracing::info!("  Candidate entity: {} (ID: {}, Type: {})", name, id, kind);
                }
            }
        }

        tracing::info!(
            "Found {} unique candidate entities from global search",
            candidates.len()
        );
        Ok(candidates)
    }
}
