#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::{Path as UrlPath, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Public channel the fake gateway knows about
pub const NEWS_CHANNEL: i64 = -1001234567890;
/// Message in [`NEWS_CHANNEL`] carrying `report (final).pdf`
pub const REPORT_MESSAGE: i32 = 12;
/// Message in [`NEWS_CHANNEL`] with no media
pub const TEXT_MESSAGE: i32 = 13;
pub const REPORT_BYTES: &[u8] = b"%PDF-1.7\n";

/// An MTProto session gateway stand-in served on an ephemeral port.
///
/// Runs on its own thread and runtime so the blocking CLI assertions can
/// talk to it. Lives until the test process exits.
pub struct FakeGateway {
    pub url: String,
}

impl FakeGateway {
    pub fn start() -> Self {
        Self::serve(true)
    }

    /// A gateway whose session has no valid authorization.
    pub fn unauthorized() -> Self {
        Self::serve(false)
    }

    fn serve(authorized: bool) -> Self {
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind fake gateway");
        listener
            .set_nonblocking(true)
            .expect("failed to set non-blocking");
        let addr = listener.local_addr().expect("failed to read local addr");

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("failed to build runtime");
            runtime.block_on(async move {
                let listener =
                    tokio::net::TcpListener::from_std(listener).expect("failed to adopt listener");
                axum::serve(listener, router(authorized))
                    .await
                    .expect("fake gateway failed");
            });
        });

        Self {
            url: format!("http://{addr}"),
        }
    }
}

/// A URL nothing is listening on.
pub fn closed_gateway_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let addr = listener.local_addr().expect("failed to read local addr");
    drop(listener);
    format!("http://{addr}")
}

fn router(authorized: bool) -> Router {
    Router::new()
        .route("/connect", post(|| async { Json(json!({})) }))
        .route("/disconnect", post(|| async { Json(json!({})) }))
        .route(
            "/authorization",
            get(move || async move { Json(json!({ "authorized": authorized })) }),
        )
        .route("/contacts/search", get(contacts_search))
        .route(
            "/peers/{id}/input",
            get(|UrlPath(id): UrlPath<i64>| async move {
                Json(json!({ "id": id, "access_hash": 42 }))
            }),
        )
        .route("/peers/{id}/history", get(history))
        .route("/entities/{id}", get(entity))
        .route("/peers/{id}/messages/{msg}", get(message))
        .route("/peers/{id}/messages/{msg}/media", get(media))
}

fn news_channel() -> Value {
    json!({
        "_": "channel",
        "id": NEWS_CHANNEL,
        "title": "Daily News",
        "username": "dailynews"
    })
}

fn document_message(id: i32, file_name: &str, size: u64) -> Value {
    json!({
        "id": id,
        "chat_id": NEWS_CHANNEL,
        "date": 1_700_000_000,
        "media": {
            "_": "document",
            "id": id,
            "size": size,
            "mime_type": "application/pdf",
            "attributes": [{ "_": "filename", "file_name": file_name }]
        }
    })
}

async fn contacts_search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    match params.get("q").map(String::as_str) {
        Some("news") => Json(json!({
            "chats": [
                news_channel(),
                { "_": "chat", "id": -55, "title": "Small Group" }
            ],
            "users": [{ "_": "user", "id": 7, "first_name": "Ada" }]
        })),
        _ => Json(json!({ "chats": [], "users": [] })),
    }
}

async fn history(
    UrlPath(id): UrlPath<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if id != NEWS_CHANNEL {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error_code": 400, "error_message": "CHANNEL_PRIVATE" })),
        )
            .into_response();
    }
    let messages = match params.get("q").map(String::as_str) {
        Some("report") => vec![
            document_message(REPORT_MESSAGE, "report (final).pdf", REPORT_BYTES.len() as u64),
            document_message(9, "report-q1.pdf", 2_097_152),
        ],
        _ => vec![],
    };
    Json(json!({ "messages": messages })).into_response()
}

async fn entity(UrlPath(id): UrlPath<i64>) -> Response {
    if id == NEWS_CHANNEL {
        Json(news_channel()).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn message(UrlPath((id, msg)): UrlPath<(i64, i32)>) -> Response {
    match (id, msg) {
        (NEWS_CHANNEL, REPORT_MESSAGE) => Json(document_message(
            REPORT_MESSAGE,
            "report (final).pdf",
            REPORT_BYTES.len() as u64,
        ))
        .into_response(),
        (NEWS_CHANNEL, TEXT_MESSAGE) => {
            Json(json!({ "id": TEXT_MESSAGE, "chat_id": NEWS_CHANNEL })).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn media(UrlPath((id, msg)): UrlPath<(i64, i32)>) -> Response {
    if (id, msg) == (NEWS_CHANNEL, REPORT_MESSAGE) {
        REPORT_BYTES.into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// A temporary working directory with its own config file.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    /// Workspace whose config points at `gateway_url`.
    pub fn new(gateway_url: &str) -> Self {
        let ws = Self::empty();
        ws.write_config(&format!(
            "[telegram]\ngateway_url = \"{gateway_url}\"\nrequest_timeout_secs = 5\n"
        ));
        ws
    }

    /// Workspace without a config file.
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("tgdoc.toml")
    }

    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_path(), content).expect("failed to write config");
    }

    /// `tgdoc` running in this workspace against its config file.
    pub fn tgdoc(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(tgdoc_bin());
        cmd.current_dir(self.path())
            .env_remove("TGDOC_CONFIG")
            .env_remove("TGDOC_GATEWAY_URL")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

/// Return the path to the tgdoc binary (built via cargo).
pub fn tgdoc_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tgdoc"))
}
