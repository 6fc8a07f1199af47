//! HTTP request handlers for the tgdoc REST API.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use crate::error::Error;
use crate::flood::FloodControl;
use crate::search::{parse_keywords, retrieve_file, DocumentSearch, Retrieval};
use crate::telegram::TelegramApi;
use crate::types::DocumentMatch;

use super::AppState;

/// Build the axum router with all routes
pub(super) fn router<C: TelegramApi + 'static>(state: Arc<AppState<C>>) -> axum::Router {
    use axum::routing::get;
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    axum::Router::new()
        .route("/search", get(search::<C>))
        .route("/download/{channel_id}/{message_id}", get(download::<C>))
        .route("/status", get(status::<C>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error response body
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn internal(err: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            e if e.is_connection_refused() => {
                tracing::error!("Telegram session refused: {}", e);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("Telegram Connection Error: {e}"),
                )
            }
            e @ Error::Connection(_) => {
                tracing::warn!("Telegram connection failed: {}", e);
                Self::new(
                    StatusCode::BAD_GATEWAY,
                    format!("Telegram Connection Error: {e}"),
                )
            }
            e => Self::internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

// -- /search --

#[derive(Deserialize)]
struct SearchParams {
    /// Document search term
    q: Option<String>,
    /// Comma-separated channel discovery keywords
    keywords: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    keywords: Vec<String>,
    candidates: usize,
    searched: usize,
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    results: Vec<SearchResultItem>,
}

#[derive(Serialize)]
struct SearchResultItem {
    #[serde(flatten)]
    document: DocumentMatch,
    download_url: String,
}

async fn search<C: TelegramApi + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Please enter a search query.",
        ));
    }
    let keywords = parse_keywords(
        params.keywords.as_deref(),
        &state.config.search.fallback_keywords,
    );
    if keywords.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Please enter channel keywords.",
        ));
    }

    let client = state.session.acquire().await?;
    let report = DocumentSearch::new(&*client, &state.config.search)
        .run(&keywords, query)
        .await?;
    drop(client);

    Ok(Json(SearchResponse {
        count: report.matches.len(),
        message: report.message,
        results: report
            .matches
            .into_iter()
            .map(|document| SearchResultItem {
                download_url: format!("/download/{}/{}", document.channel_id, document.message_id),
                document,
            })
            .collect(),
        query: report.query,
        keywords: report.keywords,
        candidates: report.candidates,
        searched: report.searched,
    }))
}

// -- /download/{channel_id}/{message_id} --

async fn download<C: TelegramApi + 'static>(
    State(state): State<Arc<AppState<C>>>,
    Path((channel_id, message_id)): Path<(i64, i32)>,
) -> Result<Response, ApiError> {
    let scratch = tempfile::Builder::new()
        .prefix("tgdoc-")
        .tempdir()
        .map_err(ApiError::internal)?;
    let flood = FloodControl::from_secs(state.config.search.flood_margin_secs);

    let retrieval = {
        let client = state.session.acquire().await?;
        retrieve_file(&*client, channel_id, message_id, scratch.path(), &flood).await?
    };
    let file = match retrieval {
        Retrieval::Found(file) => file,
        Retrieval::NotFound(reason) => {
            tracing::info!(
                "No file for message {} in {}: {}",
                message_id,
                channel_id,
                reason
            );
            return Err(ApiError::new(
                StatusCode::NOT_FOUND,
                format!("File not found: {reason}"),
            ));
        }
    };

    let handle = tokio::fs::File::open(&file.path)
        .await
        .map_err(ApiError::internal)?;
    // The scratch directory lives as long as the body stream.
    let body = ReaderStream::new(handle).map(move |chunk| {
        let _ = &scratch;
        chunk
    });

    let mime = file
        .mime_type
        .as_deref()
        .unwrap_or("application/octet-stream");
    Response::builder()
        .header(header::CONTENT_TYPE, mime)
        .header(header::CONTENT_LENGTH, file.size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&file.filename),
        )
        .body(Body::from_stream(body))
        .map_err(ApiError::internal)
}

/// `attachment` disposition carrying an ASCII fallback and the RFC 5987
/// encoded original name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

// -- /status --

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    connected: bool,
    authorized: bool,
}

async fn status<C: TelegramApi + 'static>(
    State(state): State<Arc<AppState<C>>>,
) -> Json<StatusResponse> {
    let session = state.session.status().await;
    Json(StatusResponse {
        status: if session.busy { "busy" } else { "ok" },
        connected: session.connected,
        authorized: session.authorized,
    })
}
