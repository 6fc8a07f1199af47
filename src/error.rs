use crate::telegram::{RpcError, TelegramError};

/// Errors that abort a whole search or retrieval request.
///
/// Per-keyword and per-channel failures never show up here; they are logged
/// and skipped inside the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Account deactivated, banned or session revoked. Needs re-authentication.
    #[error("Telegram account unusable: {0}")]
    AccountUnusable(RpcError),

    /// Connected, but the session carries no valid authorization.
    #[error("Telegram client not authorized: {0}")]
    NotAuthorized(String),

    /// Network-level failure reaching the remote service. Safe to retry.
    #[error("Failed to connect to Telegram: {0}")]
    Connection(#[source] TelegramError),

    #[error(transparent)]
    Telegram(#[from] TelegramError),
}

impl Error {
    /// Whether the session itself refused us (as opposed to a transient fault).
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, Error::AccountUnusable(_) | Error::NotAuthorized(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
