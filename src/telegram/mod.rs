//! Boundary to the remote messaging service.
//!
//! The pipeline only ever talks to [`TelegramApi`]. The session behind it is
//! authenticated out of band; implementations just connect and report whether
//! the account is authorized.

mod error;
#[cfg(test)]
pub mod fake;
pub mod gateway;

use std::future::Future;
use std::path::{Path, PathBuf};

use futures::stream::BoxStream;

use crate::types::{InputPeer, Message, RemoteEntity};

pub use error::{RpcError, TelegramError};
pub use gateway::GatewayClient;

pub type Result<T> = std::result::Result<T, TelegramError>;

/// Parameters for a document-only history search
#[derive(Debug, Clone, Copy)]
pub struct HistoryQuery<'a> {
    /// Text the server matches messages against
    pub search: &'a str,
    /// Upper bound on messages yielded
    pub limit: usize,
}

/// Capabilities the pipeline needs from an authenticated client.
pub trait TelegramApi: Send + Sync {
    fn connect(&self) -> impl Future<Output = Result<()>> + Send;

    fn is_connected(&self) -> bool;

    fn is_authorized(&self) -> impl Future<Output = Result<bool>> + Send;

    fn disconnect(&self) -> impl Future<Output = ()> + Send;

    /// Global search for users, groups and channels matching `term`.
    fn global_search(
        &self,
        term: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RemoteEntity>>> + Send;

    fn resolve_input_reference(
        &self,
        entity: &RemoteEntity,
    ) -> impl Future<Output = Result<InputPeer>> + Send;

    /// Messages carrying documents that match `query.search`, newest first.
    ///
    /// The stream is lazy, finite and cannot be restarted.
    fn iterate_history<'a>(
        &'a self,
        peer: &'a InputPeer,
        query: HistoryQuery<'a>,
    ) -> BoxStream<'a, Result<Message>>;

    /// Fails with [`TelegramError::NotFound`] for unknown ids.
    fn resolve_entity(&self, id: i64) -> impl Future<Output = Result<RemoteEntity>> + Send;

    fn get_message(
        &self,
        peer: &InputPeer,
        id: i32,
    ) -> impl Future<Output = Result<Option<Message>>> + Send;

    /// Write the message's media to `dest`. `None` when nothing was downloaded.
    fn download_media(
        &self,
        message: &Message,
        dest: &Path,
    ) -> impl Future<Output = Result<Option<PathBuf>>> + Send;
}
