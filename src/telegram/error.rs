use std::time::Duration;

use serde::Deserialize;

/// A structured error returned by the remote service.
///
/// Error names follow the Telegram convention where a trailing number is a
/// parameter, e.g. `FLOOD_WAIT_17` is `FLOOD_WAIT` with value `17`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    pub code: i32,
    pub name: String,
    pub value: Option<u32>,
}

/// Error body sent by the gateway on non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorBody {
    pub error_code: i32,
    pub error_message: String,
}

impl RpcError {
    pub fn parse(code: i32, message: &str) -> Self {
        if let Some((name, tail)) = message.rsplit_once('_') {
            if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(value) = tail.parse() {
                    return Self {
                        code,
                        name: name.to_string(),
                        value: Some(value),
                    };
                }
            }
        }
        Self {
            code,
            name: message.to_string(),
            value: None,
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Mandated wait carried by a flood-control signal.
    pub fn flood_wait(&self) -> Option<Duration> {
        match self.name.as_str() {
            "FLOOD_WAIT" | "SLOWMODE_WAIT" | "FLOOD_PREMIUM_WAIT" => {
                Some(Duration::from_secs(u64::from(self.value.unwrap_or(0))))
            }
            _ => None,
        }
    }

    /// Private channel, not a participant, restricted search, or an entity
    /// the account cannot address.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self.name.as_str(),
            "CHANNEL_PRIVATE"
                | "USER_NOT_PARTICIPANT"
                | "CHAT_ADMIN_REQUIRED"
                | "BOT_METHOD_INVALID"
                | "CHANNEL_INVALID"
                | "PEER_ID_INVALID"
        )
    }

    /// Account deactivated, banned, or its authorization key revoked.
    pub fn is_account_revoked(&self) -> bool {
        matches!(
            self.name.as_str(),
            "USER_DEACTIVATED"
                | "USER_DEACTIVATED_BAN"
                | "AUTH_KEY_UNREGISTERED"
                | "AUTH_KEY_INVALID"
                | "SESSION_REVOKED"
        )
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.value {
            Some(v) => write!(f, "rpc error {}: {} ({})", self.code, self.name, v),
            None => write!(f, "rpc error {}: {}", self.code, self.name),
        }
    }
}

/// Errors surfaced by a [`super::TelegramApi`] implementation
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("{0}")]
    Rpc(RpcError),

    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected gateway response: {0}")]
    Decode(String),
}

impl TelegramError {
    pub fn rpc(&self) -> Option<&RpcError> {
        match self {
            TelegramError::Rpc(e) => Some(e),
            _ => None,
        }
    }

    pub fn flood_wait(&self) -> Option<Duration> {
        self.rpc().and_then(RpcError::flood_wait)
    }

    pub fn is_access_denied(&self) -> bool {
        self.rpc().is_some_and(RpcError::is_access_denied)
    }

    pub fn is_account_revoked(&self) -> bool {
        self.rpc().is_some_and(RpcError::is_account_revoked)
    }

    pub fn is_password_needed(&self) -> bool {
        self.rpc().is_some_and(|e| e.is("SESSION_PASSWORD_NEEDED"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TelegramError::NotFound(_))
    }
}

impl From<RpcError> for TelegramError {
    fn from(e: RpcError) -> Self {
        TelegramError::Rpc(e)
    }
}
