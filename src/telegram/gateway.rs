//! HTTP adapter for an MTProto session gateway.
//!
//! The gateway is a sidecar that owns the authenticated user session and
//! exposes the handful of raw API calls we need as JSON endpoints. Errors
//! come back as `{"error_code": 420, "error_message": "FLOOD_WAIT_17"}`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use super::error::RpcErrorBody;
use super::{HistoryQuery, Result, RpcError, TelegramApi, TelegramError};
use crate::config::TelegramConfig;
use crate::types::{EntityKind, InputPeer, Message, RemoteEntity};

/// Largest history page the gateway is asked for in one call
const HISTORY_PAGE_SIZE: usize = 100;

/// Client for the session gateway.
pub struct GatewayClient {
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
    request_timeout: Duration,
    connected: AtomicBool,
}

/// Entity as serialized by the gateway (raw TL constructor names)
#[derive(Debug, Deserialize)]
#[serde(tag = "_", rename_all = "snake_case")]
enum WireEntity {
    User {
        id: i64,
        #[serde(default)]
        first_name: Option<String>,
        #[serde(default)]
        last_name: Option<String>,
        #[serde(default)]
        username: Option<String>,
    },
    Chat {
        id: i64,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        megagroup: bool,
    },
    Channel {
        id: i64,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        megagroup: bool,
    },
    #[serde(other)]
    Unsupported,
}

impl WireEntity {
    fn into_entity(self) -> Option<RemoteEntity> {
        match self {
            WireEntity::User {
                id,
                first_name,
                last_name,
                username,
            } => {
                let name = [first_name, last_name]
                    .into_iter()
                    .flatten()
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                Some(RemoteEntity {
                    id,
                    title: (!name.is_empty()).then_some(name),
                    kind: EntityKind::User,
                    username,
                })
            }
            WireEntity::Chat {
                id,
                title,
                megagroup,
            } => Some(RemoteEntity {
                id,
                title,
                kind: if megagroup {
                    EntityKind::Supergroup
                } else {
                    EntityKind::BasicGroup
                },
                username: None,
            }),
            WireEntity::Channel {
                id,
                title,
                username,
                megagroup,
            } => Some(RemoteEntity {
                id,
                title,
                kind: if megagroup {
                    EntityKind::Supergroup
                } else {
                    EntityKind::BroadcastChannel
                },
                username,
            }),
            WireEntity::Unsupported => None,
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    chats: Vec<WireEntity>,
    #[serde(default)]
    users: Vec<WireEntity>,
}

#[derive(Deserialize)]
struct AuthorizationResponse {
    authorized: bool,
}

#[derive(Deserialize)]
struct HistoryResponse {
    messages: Vec<Message>,
}

/// Paging cursor for history iteration
#[derive(Debug, Clone, Copy)]
struct Page {
    offset_id: i32,
    remaining: usize,
}

impl GatewayClient {
    /// Create a client pointing at the given gateway URL.
    pub fn new(base_url: &str, token: Option<String>, request_timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .build()?;
        Ok(Self {
            base_url,
            http,
            token,
            request_timeout,
            connected: AtomicBool::new(false),
        })
    }

    pub fn from_config(config: &TelegramConfig) -> Result<Self> {
        Self::new(
            &config.gateway_url,
            config.resolve_api_key(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Return the base URL (for display/logging).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let req = self.http.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response> {
        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_connect() {
                    self.connected.store(false, Ordering::SeqCst);
                }
                return Err(e.into());
            }
        };

        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(error_from_response(resp).await)
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let req = self
            .request(Method::GET, path)
            .query(query)
            .timeout(self.request_timeout);
        let resp = self.send(req).await?;
        resp.json()
            .await
            .map_err(|e| TelegramError::Decode(format!("{path}: {e}")))
    }

    async fn fetch_page(
        &self,
        peer: &InputPeer,
        query: HistoryQuery<'_>,
        page: Page,
    ) -> Result<Option<(Vec<Message>, Page)>> {
        if page.remaining == 0 {
            return Ok(None);
        }

        let batch_size = page.remaining.min(HISTORY_PAGE_SIZE);
        let resp: HistoryResponse = self
            .get_json(
                &format!("/peers/{}/history", peer.id),
                &[
                    ("q", query.search.to_string()),
                    ("filter", "document".to_string()),
                    ("limit", batch_size.to_string()),
                    ("offset_id", page.offset_id.to_string()),
                    ("access_hash", peer.access_hash.to_string()),
                ],
            )
            .await?;

        let mut messages = resp.messages;
        messages.truncate(batch_size);
        let Some(last) = messages.last() else {
            return Ok(None);
        };

        // A short page means the history is exhausted.
        let remaining = if messages.len() < batch_size {
            0
        } else {
            page.remaining - messages.len()
        };
        let next = Page {
            offset_id: last.id,
            remaining,
        };
        Ok(Some((messages, next)))
    }
}

async fn error_from_response(resp: reqwest::Response) -> TelegramError {
    let status = resp.status();
    let path = resp.url().path().to_string();
    let body = resp.bytes().await.unwrap_or_default();

    if let Ok(rpc) = serde_json::from_slice::<RpcErrorBody>(&body) {
        return RpcError::parse(rpc.error_code, &rpc.error_message).into();
    }
    if status == StatusCode::NOT_FOUND {
        return TelegramError::NotFound(path);
    }
    TelegramError::Decode(format!("HTTP {status} from {path}"))
}

impl TelegramApi for GatewayClient {
    async fn connect(&self) -> Result<()> {
        self.send(self.request(Method::POST, "/connect").timeout(self.request_timeout))
            .await?;
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn is_authorized(&self) -> Result<bool> {
        let resp: AuthorizationResponse = self.get_json("/authorization", &[]).await?;
        Ok(resp.authorized)
    }

    async fn disconnect(&self) {
        let req = self
            .request(Method::POST, "/disconnect")
            .timeout(self.request_timeout);
        if let Err(e) = self.send(req).await {
            tracing::debug!("Gateway disconnect failed: {}", e);
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn global_search(&self, term: &str, limit: usize) -> Result<Vec<RemoteEntity>> {
        let resp: SearchResponse = self
            .get_json(
                "/contacts/search",
                &[("q", term.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        Ok(resp
            .chats
            .into_iter()
            .chain(resp.users)
            .filter_map(WireEntity::into_entity)
            .collect())
    }

    async fn resolve_input_reference(&self, entity: &RemoteEntity) -> Result<InputPeer> {
        self.get_json(&format!("/peers/{}/input", entity.id), &[])
            .await
    }

    fn iterate_history<'a>(
        &'a self,
        peer: &'a InputPeer,
        query: HistoryQuery<'a>,
    ) -> BoxStream<'a, Result<Message>> {
        let first = Page {
            offset_id: 0,
            remaining: query.limit,
        };
        stream::try_unfold(first, move |page| self.fetch_page(peer, query, page))
            .map_ok(|batch| stream::iter(batch.into_iter().map(Ok::<Message, TelegramError>)))
            .try_flatten()
            .boxed()
    }

    async fn resolve_entity(&self, id: i64) -> Result<RemoteEntity> {
        let wire: WireEntity = self.get_json(&format!("/entities/{id}"), &[]).await?;
        wire.into_entity()
            .ok_or_else(|| TelegramError::NotFound(format!("entity {id}")))
    }

    async fn get_message(&self, peer: &InputPeer, id: i32) -> Result<Option<Message>> {
        let result = self
            .get_json::<Option<Message>>(
                &format!("/peers/{}/messages/{}", peer.id, id),
                &[("access_hash", peer.access_hash.to_string())],
            )
            .await;
        match result {
            Err(e) if e.is_not_found() => Ok(None),
            other => other,
        }
    }

    async fn download_media(&self, message: &Message, dest: &Path) -> Result<Option<PathBuf>> {
        let path = format!("/peers/{}/messages/{}/media", message.chat_id, message.id);
        let resp = self.send(self.request(Method::GET, &path)).await?;
        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut body = resp.bytes_stream();
        while let Some(chunk) = body.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        Ok(Some(dest.to_path_buf()))
    }
}
