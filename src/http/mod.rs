//! HTTP server for tgdoc.
//!
//! Exposes document search and file download as a small JSON API in front of
//! a single shared Telegram session.

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::session::Session;
use crate::telegram::GatewayClient;

/// Shared application state for HTTP handlers
pub struct AppState<C> {
    pub session: Session<C>,
    pub config: Config,
}

/// Run the HTTP server until Ctrl-C, then disconnect the session.
pub async fn run_server(config: Config, addr: SocketAddr) -> Result<()> {
    let client =
        GatewayClient::from_config(&config.telegram).context("Failed to create gateway client")?;
    tracing::info!("Using session gateway at {}", client.base_url());

    let state = Arc::new(AppState {
        session: Session::new(client),
        config,
    });
    state.session.warm_up().await;

    let app = handlers::router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("tgdoc HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    state.session.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
