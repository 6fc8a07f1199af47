//! Connection manager and readiness guard for the shared client.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::telegram::{TelegramApi, TelegramError};

/// Make sure `client` is connected and authorized.
///
/// A no-op when the client is already connected. Otherwise connects and then
/// checks authorization, classifying failures:
/// - revoked / banned / deactivated account → [`Error::AccountUnusable`]
/// - missing credentials or a pending 2FA password → [`Error::NotAuthorized`]
/// - anything else during connect → [`Error::Connection`] (retryable)
pub async fn ensure_ready<C: TelegramApi>(client: &C) -> Result<()> {
    if client.is_connected() {
        return Ok(());
    }

    tracing::info!("Telegram client not connected, connecting");
    if let Err(e) = client.connect().await {
        return Err(classify(e));
    }

    let refused = match client.is_authorized().await {
        Ok(true) => {
            tracing::info!("Telegram client connected");
            return Ok(());
        }
        Ok(false) => {
            tracing::error!("Telegram client not authorized after connect; session may be invalid");
            Error::NotAuthorized("session invalid or expired, re-run the login flow".into())
        }
        Err(e) => classify(e),
    };

    // Drop the connection so the next call checks authorization again.
    client.disconnect().await;
    Err(refused)
}

fn classify(e: TelegramError) -> Error {
    if let Some(rpc) = e.rpc().filter(|r| r.is_account_revoked()) {
        tracing::error!(
            "Telegram account issue: {}; the account may be banned or its session revoked",
            rpc
        );
        return Error::AccountUnusable(rpc.clone());
    }
    if e.is_password_needed() {
        tracing::error!("Telegram session requires a 2FA password");
        return Error::NotAuthorized("session requires a 2FA password, re-authorize".into());
    }
    tracing::error!("Failed to connect to Telegram: {}", e);
    Error::Connection(e)
}

/// Process-wide owner of the client.
///
/// The client is not safe for concurrent use, so every request goes through
/// [`Session::acquire`], which holds a single-slot lock for the duration of
/// the request. Concurrent callers queue on the lock.
pub struct Session<C> {
    client: Mutex<C>,
    /// Outcome of the last readiness check, readable while the lock is held
    ready: AtomicBool,
}

impl<C: TelegramApi> Session<C> {
    pub fn new(client: C) -> Self {
        Self {
            client: Mutex::new(client),
            ready: AtomicBool::new(false),
        }
    }

    /// Lock the client and run the readiness guard.
    pub async fn acquire(&self) -> Result<MutexGuard<'_, C>> {
        let client = self.client.lock().await;
        let checked = ensure_ready(&*client).await;
        self.ready.store(checked.is_ok(), Ordering::SeqCst);
        checked?;
        Ok(client)
    }

    /// Startup connect. Logs problems instead of failing; requests retry later.
    pub async fn warm_up(&self) {
        tracing::info!("Connecting Telegram client on startup");
        match self.acquire().await {
            Ok(_) => tracing::info!("Telegram client connected and authorized"),
            Err(e) if e.is_connection_refused() => {
                tracing::error!("Telegram session unusable on startup: {}", e);
            }
            Err(e) => {
                tracing::warn!("Startup connect failed: {}; will retry on first request", e);
            }
        }
    }

    /// Current connection state, without connecting.
    ///
    /// Never waits for the lock. While a request holds the client, reports
    /// the last readiness check with `busy` set.
    pub async fn status(&self) -> SessionStatus {
        let Ok(client) = self.client.try_lock() else {
            let ready = self.ready.load(Ordering::SeqCst);
            return SessionStatus {
                connected: ready,
                authorized: ready,
                busy: true,
            };
        };
        let connected = client.is_connected();
        let authorized = if connected {
            client.is_authorized().await.unwrap_or(false)
        } else {
            false
        };
        SessionStatus {
            connected,
            authorized,
            busy: false,
        }
    }

    pub async fn close(&self) {
        let client = self.client.lock().await;
        self.ready.store(false, Ordering::SeqCst);
        if client.is_connected() {
            tracing::info!("Disconnecting Telegram client");
            client.disconnect().await;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SessionStatus {
    pub connected: bool,
    pub authorized: bool,
    /// A request currently holds the client
    pub busy: bool,
}
