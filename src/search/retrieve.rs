use std::path::Path;

use super::documents::{document_filename, UNKNOWN_FILENAME};
use crate::error::Result;
use crate::flood::FloodControl;
use crate::session::ensure_ready;
use crate::telegram::{self, TelegramApi};
use crate::types::DownloadResult;

/// Why a retrieval produced no file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
    /// The container id did not resolve to an entity
    Entity,
    /// No message with that id in the container
    Message,
    /// The message has no media, or its media is not a document
    NoDocument,
    /// The download completed without producing a file
    NothingDownloaded,
    /// Flood control interrupted the attempt; the caller may retry
    RateLimited,
}

impl std::fmt::Display for NotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFound::Entity => write!(f, "channel or chat not found"),
            NotFound::Message => write!(f, "message not found"),
            NotFound::NoDocument => write!(f, "message has no document"),
            NotFound::NothingDownloaded => write!(f, "download produced no file"),
            NotFound::RateLimited => write!(f, "rate limited, try again later"),
        }
    }
}

#[derive(Debug)]
pub enum Retrieval {
    Found(DownloadResult),
    NotFound(NotFound),
}

/// Download the document attached to `message_id` in `container_id`.
///
/// The file lands in `scratch_dir` under a sanitized name; the result keeps
/// the original name for presentation. `scratch_dir` belongs to the caller,
/// who removes it once the file has been consumed. Nothing is left in it
/// when the outcome is not-found or an error.
pub async fn retrieve_file<C: TelegramApi>(
    client: &C,
    container_id: i64,
    message_id: i32,
    scratch_dir: &Path,
    flood: &FloodControl,
) -> Result<Retrieval> {
    ensure_ready(client).await?;

    match fetch(client, container_id, message_id, scratch_dir).await {
        Ok(retrieval) => Ok(retrieval),
        Err(e) => {
            let step = format!("download of message {message_id} in {container_id}");
            if flood.absorb(&e, &step).await {
                Ok(Retrieval::NotFound(NotFound::RateLimited))
            } else {
                Err(e.into())
            }
        }
    }
}

async fn fetch<C: TelegramApi>(
    client: &C,
    container_id: i64,
    message_id: i32,
    scratch_dir: &Path,
) -> telegram::Result<Retrieval> {
    let entity = match client.resolve_entity(container_id).await {
        Ok(entity) => entity,
        Err(e) if e.flood_wait().is_some() => return Err(e),
        Err(e) => {
            tracing::warn!("Could not resolve entity {}: {}", container_id, e);
            return Ok(Retrieval::NotFound(NotFound::Entity));
        }
    };

    let peer = client.resolve_input_reference(&entity).await?;
    let Some(message) = client.get_message(&peer, message_id).await? else {
        tracing::warn!("Message {} not found in {}", message_id, container_id);
        return Ok(Retrieval::NotFound(NotFound::Message));
    };
    let Some(doc) = message.document() else {
        tracing::warn!(
            "Message {} in {} has no document attached",
            message_id,
            container_id
        );
        return Ok(Retrieval::NotFound(NotFound::NoDocument));
    };

    let filename = document_filename(doc);
    let local = scratch_dir.join(safe_filename(&filename));
    tracing::info!("Downloading '{}' to {}", filename, local.display());

    let downloaded = match client.download_media(&message, &local).await {
        Ok(downloaded) => downloaded,
        Err(e) => {
            remove_partial(&local).await;
            return Err(e);
        }
    };
    let Some(path) = downloaded else {
        remove_partial(&local).await;
        return Ok(Retrieval::NotFound(NotFound::NothingDownloaded));
    };

    let size_bytes = tokio::fs::metadata(&path).await?.len();
    Ok(Retrieval::Found(DownloadResult {
        path,
        filename,
        mime_type: doc.mime_type.clone(),
        size_bytes,
    }))
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove partial download {}: {}", path.display(), e);
        }
    }
}

/// Replace every character other than alphanumerics, `.`, `_` and `-` with `_`.
///
/// Names made only of dots (or empty) would escape or alias the scratch
/// directory and become [`UNKNOWN_FILENAME`].
pub fn safe_filename(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if safe.chars().all(|c| c == '.') {
        UNKNOWN_FILENAME.to_string()
    } else {
        safe
    }
}
