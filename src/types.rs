use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a remote entity, as far as message search is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    BasicGroup,
    /// A group flagged as a megagroup. Behaves like a channel for search.
    Supergroup,
    BroadcastChannel,
}

impl EntityKind {
    /// Whether the remote history search accepts this kind of entity.
    ///
    /// Users and plain groups are rejected or return nothing useful.
    pub fn supports_message_search(self) -> bool {
        matches!(self, EntityKind::Supergroup | EntityKind::BroadcastChannel)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::BasicGroup => write!(f, "basic_group"),
            EntityKind::Supergroup => write!(f, "supergroup"),
            EntityKind::BroadcastChannel => write!(f, "channel"),
        }
    }
}

/// Snapshot of a user, group or channel returned by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntity {
    pub id: i64,
    pub title: Option<String>,
    pub kind: EntityKind,
    /// Public handle, used for `t.me/{handle}` links
    pub username: Option<String>,
}

impl RemoteEntity {
    pub fn supports_message_search(&self) -> bool {
        self.kind.supports_message_search()
    }

    /// Title for display, falling back to the numeric id.
    pub fn display_name(&self) -> String {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("Channel/Chat ID {}", self.id),
        }
    }
}

/// Addressable reference to an entity, good for history and message calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPeer {
    pub id: i64,
    #[serde(default)]
    pub access_hash: i64,
}

/// A message as returned by the history and message lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i32,
    pub chat_id: i64,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub media: Option<Media>,
}

impl Message {
    /// The attached document, if the message carries one.
    pub fn document(&self) -> Option<&Document> {
        match &self.media {
            Some(Media::Document(doc)) => Some(doc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_", rename_all = "snake_case")]
pub enum Media {
    Document(Document),
    Photo,
    WebPage,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    /// Size in bytes; absent when the server did not report it
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub attributes: Vec<DocumentAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_", rename_all = "snake_case")]
pub enum DocumentAttribute {
    Filename {
        file_name: String,
    },
    Audio {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        duration: Option<u32>,
    },
    Video {
        #[serde(default)]
        duration: Option<f64>,
    },
    #[serde(other)]
    Other,
}

impl DocumentAttribute {
    pub fn file_name(&self) -> Option<&str> {
        match self {
            DocumentAttribute::Filename { file_name } => Some(file_name),
            _ => None,
        }
    }
}

/// A document found in a channel's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMatch {
    pub filename: String,
    #[serde(rename = "file_size_bytes")]
    pub size_bytes: Option<u64>,
    #[serde(rename = "file_size_readable")]
    pub size_readable: String,
    pub channel_name: String,
    pub channel_id: i64,
    pub message_id: i32,
    /// ISO-8601 timestamp, or "N/A"
    pub date: String,
    #[serde(rename = "telegram_message_link")]
    pub link: Option<String>,
}

/// A document downloaded into a caller-owned scratch directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Local path under the scratch directory (sanitized name)
    pub path: PathBuf,
    /// Name to present to the user
    pub filename: String,
    pub mime_type: Option<String>,
    pub size_bytes: u64,
}
