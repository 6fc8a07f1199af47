use chrono::{DateTime, Utc};
use futures::TryStreamExt;

use super::DocumentSearch;
use crate::error::Result;
use crate::session::ensure_ready;
use crate::telegram::{self, HistoryQuery, TelegramApi};
use crate::types::{Document, DocumentAttribute, DocumentMatch, Message, RemoteEntity};

/// Name used when a document carries no file name attribute
pub const UNKNOWN_FILENAME: &str = "Unknown_Filename";

/// Channels and supergroups use ids below this, prefixed with `-100`
const INTERNAL_ID_THRESHOLD: i64 = -100_000_000_000;

impl<C: TelegramApi> DocumentSearch<'_, C> {
    /// Search each eligible entity's history for documents matching `query`.
    ///
    /// Entities are visited in order and messages are kept in the order the
    /// server returns them. Failures are isolated per entity:
    /// - flood wait: pause, keep what was already fetched, move on
    /// - access denied or anything else: log and drop the entity
    pub async fn search_documents<'e, I>(
        &self,
        entities: I,
        query: &str,
    ) -> Result<Vec<DocumentMatch>>
    where
        I: IntoIterator<Item = &'e RemoteEntity>,
    {
        ensure_ready(self.client).await?;
        let mut found = Vec::new();

        for entity in entities {
            if !entity.supports_message_search() {
                tracing::debug!(
                    "Skipping entity '{}' ({}): message search not supported",
                    entity.display_name(),
                    entity.kind
                );
                continue;
            }

            let name = entity.display_name();
            tracing::info!(
                "Searching for files matching '{}' in: {} (ID: {})",
                query,
                name,
                entity.id
            );

            let mut batch = Vec::new();
            let Err(e) = self.search_entity(entity, &name, query, &mut batch).await else {
                found.append(&mut batch);
                continue;
            };

            let step = format!("message search in '{name}'");
            if self.flood.absorb(&e, &step).await {
                found.append(&mut batch);
            } else if e.is_access_denied() {
                tracing::warn!(
                    "Cannot search messages in '{}' (ID: {}): {}. Skipping.",
                    name,
                    entity.id,
                    e
                );
            } else {
                tracing::error!(
                    "Error searching messages in '{}' (ID: {}): {}",
                    name,
                    entity.id,
                    e
                );
            }
        }

        Ok(found)
    }

    async fn search_entity(
        &self,
        entity: &RemoteEntity,
        name: &str,
        query: &str,
        batch: &mut Vec<DocumentMatch>,
    ) -> telegram::Result<()> {
        let peer = self.client.resolve_input_reference(entity).await?;
        let mut messages = self.client.iterate_history(
            &peer,
            HistoryQuery {
                search: query,
                limit: self.config.messages_limit_per_channel,
            },
        );

        while let Some(message) = messages.try_next().await? {
            let Some(doc) = message.document() else {
                continue;
            };
            let found = document_match(entity, name, &message, doc);
            tracing::info!(
                "  Found: {} in {} -> TG Link: {}",
                found.filename,
                name,
                found.link.as_deref().unwrap_or("N/A")
            );
            batch.push(found);
        }
        Ok(())
    }
}

fn document_match(
    entity: &RemoteEntity,
    name: &str,
    message: &Message,
    doc: &Document,
) -> DocumentMatch {
    DocumentMatch {
        filename: document_filename(doc),
        size_bytes: doc.size,
        size_readable: format_size(doc.size),
        channel_name: name.to_string(),
        channel_id: entity.id,
        message_id: message.id,
        date: format_date(message.date),
        link: message_link(entity, message.id),
    }
}

/// First non-empty file name attribute, or [`UNKNOWN_FILENAME`].
pub fn document_filename(doc: &Document) -> String {
    doc.attributes
        .iter()
        .filter_map(DocumentAttribute::file_name)
        .find(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_FILENAME)
        .to_string()
}

/// Size in MB with two decimals, or "N/A" when unknown or zero.
pub fn format_size(size: Option<u64>) -> String {
    match size {
        Some(bytes) if bytes > 0 => format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0)),
        _ => "N/A".to_string(),
    }
}

pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(|| "N/A".to_string(), |d| d.to_rfc3339())
}

/// Deep link to a message.
///
/// Public handles give `t.me/{handle}/{id}`. Channels and supergroups without
/// one get `t.me/c/{id}/{id}` from their internal id with the `-100` prefix
/// cut off.
pub fn message_link(entity: &RemoteEntity, message_id: i32) -> Option<String> {
    if let Some(handle) = entity.username.as_deref().filter(|h| !h.is_empty()) {
        return Some(format!("https://t.me/{handle}/{message_id}"));
    }

    if entity.supports_message_search() && entity.id < INTERNAL_ID_THRESHOLD {
        let id = entity.id.to_string();
        return id
            .get(4..)
            .map(|short| format!("https://t.me/c/{short}/{message_id}"));
    }

    None
}
