//! Scripted in-memory client for unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use futures::stream::{self, BoxStream, StreamExt};

use super::{HistoryQuery, Result, RpcError, TelegramApi, TelegramError};
use crate::types::{
    Document, DocumentAttribute, EntityKind, InputPeer, Media, Message, RemoteEntity,
};

/// Failure to inject at a scripted call
#[derive(Debug, Clone)]
pub enum Fault {
    Flood(u32),
    Rpc(&'static str),
    NotFound,
    Transport,
}

impl Fault {
    fn to_error(&self) -> TelegramError {
        match self {
            Fault::Flood(secs) => RpcError::parse(420, &format!("FLOOD_WAIT_{secs}")).into(),
            Fault::Rpc(name) => RpcError::parse(400, name).into(),
            Fault::NotFound => TelegramError::NotFound("scripted".into()),
            Fault::Transport => TelegramError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
        }
    }
}

/// Calls observed by the fake, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    IsAuthorized,
    GlobalSearch(String, usize),
    ResolveInput(i64),
    History(i64),
    ResolveEntity(i64),
    GetMessage(i64, i32),
    Download(i64, i32),
}

pub struct FakeClient {
    connected: AtomicBool,
    authorized: bool,
    connect_fault: Option<Fault>,
    authorization_fault: Option<Fault>,
    searches: HashMap<String, std::result::Result<Vec<RemoteEntity>, Fault>>,
    input_faults: HashMap<i64, Fault>,
    histories: HashMap<i64, Vec<std::result::Result<Message, Fault>>>,
    entities: HashMap<i64, RemoteEntity>,
    messages: HashMap<(i64, i32), Message>,
    media: HashMap<(i64, i32), std::result::Result<Vec<u8>, Fault>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeClient {
    /// A connected, authorized client with nothing scripted.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            authorized: true,
            connect_fault: None,
            authorization_fault: None,
            searches: HashMap::new(),
            input_faults: HashMap::new(),
            histories: HashMap::new(),
            entities: HashMap::new(),
            messages: HashMap::new(),
            media: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn disconnected(self) -> Self {
        self.connected.store(false, Ordering::SeqCst);
        self
    }

    pub fn unauthorized(mut self) -> Self {
        self.authorized = false;
        self
    }

    pub fn with_connect_fault(mut self, fault: Fault) -> Self {
        self.connect_fault = Some(fault);
        self
    }

    pub fn with_authorization_fault(mut self, fault: Fault) -> Self {
        self.authorization_fault = Some(fault);
        self
    }

    pub fn with_search(mut self, term: &str, entities: Vec<RemoteEntity>) -> Self {
        self.searches.insert(term.to_string(), Ok(entities));
        self
    }

    pub fn with_search_fault(mut self, term: &str, fault: Fault) -> Self {
        self.searches.insert(term.to_string(), Err(fault));
        self
    }

    pub fn with_input_fault(mut self, id: i64, fault: Fault) -> Self {
        self.input_faults.insert(id, fault);
        self
    }

    pub fn with_history(
        mut self,
        id: i64,
        items: Vec<std::result::Result<Message, Fault>>,
    ) -> Self {
        self.histories.insert(id, items);
        self
    }

    pub fn with_entity(mut self, entity: RemoteEntity) -> Self {
        self.entities.insert(entity.id, entity);
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.insert((message.chat_id, message.id), message);
        self
    }

    pub fn with_media(mut self, chat_id: i64, id: i32, bytes: &[u8]) -> Self {
        self.media.insert((chat_id, id), Ok(bytes.to_vec()));
        self
    }

    pub fn with_media_fault(mut self, chat_id: i64, id: i32, fault: Fault) -> Self {
        self.media.insert((chat_id, id), Err(fault));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl TelegramApi for FakeClient {
    async fn connect(&self) -> Result<()> {
        self.record(Call::Connect);
        if let Some(fault) = &self.connect_fault {
            return Err(fault.to_error());
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn is_authorized(&self) -> Result<bool> {
        self.record(Call::IsAuthorized);
        match &self.authorization_fault {
            Some(fault) => Err(fault.to_error()),
            None => Ok(self.authorized),
        }
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn global_search(&self, term: &str, limit: usize) -> Result<Vec<RemoteEntity>> {
        self.record(Call::GlobalSearch(term.to_string(), limit));
        match self.searches.get(term) {
            Some(Ok(entities)) => Ok(entities.clone()),
            Some(Err(fault)) => Err(fault.to_error()),
            None => Ok(vec![]),
        }
    }

    async fn resolve_input_reference(&self, entity: &RemoteEntity) -> Result<InputPeer> {
        self.record(Call::ResolveInput(entity.id));
        match self.input_faults.get(&entity.id) {
            Some(fault) => Err(fault.to_error()),
            None => Ok(InputPeer {
                id: entity.id,
                access_hash: 1,
            }),
        }
    }

    fn iterate_history<'a>(
        &'a self,
        peer: &'a InputPeer,
        query: HistoryQuery<'a>,
    ) -> BoxStream<'a, Result<Message>> {
        self.record(Call::History(peer.id));
        let items: Vec<Result<Message>> = self
            .histories
            .get(&peer.id)
            .map(|items| {
                items
                    .iter()
                    .map(|item| item.clone().map_err(|f| f.to_error()))
                    .collect()
            })
            .unwrap_or_default();
        stream::iter(items).take(query.limit).boxed()
    }

    async fn resolve_entity(&self, id: i64) -> Result<RemoteEntity> {
        self.record(Call::ResolveEntity(id));
        self.entities
            .get(&id)
            .cloned()
            .ok_or_else(|| TelegramError::NotFound(format!("entity {id}")))
    }

    async fn get_message(&self, peer: &InputPeer, id: i32) -> Result<Option<Message>> {
        self.record(Call::GetMessage(peer.id, id));
        Ok(self.messages.get(&(peer.id, id)).cloned())
    }

    async fn download_media(&self, message: &Message, dest: &Path) -> Result<Option<PathBuf>> {
        self.record(Call::Download(message.chat_id, message.id));
        match self.media.get(&(message.chat_id, message.id)) {
            Some(Ok(bytes)) => {
                tokio::fs::write(dest, bytes).await?;
                Ok(Some(dest.to_path_buf()))
            }
            Some(Err(fault)) => {
                // Leave a partial file behind, like an interrupted transfer would.
                tokio::fs::write(dest, b"partial").await?;
                Err(fault.to_error())
            }
            None => Ok(None),
        }
    }
}

pub fn channel(id: i64, title: &str, username: Option<&str>) -> RemoteEntity {
    RemoteEntity {
        id,
        title: Some(title.to_string()),
        kind: EntityKind::BroadcastChannel,
        username: username.map(str::to_string),
    }
}

pub fn entity(id: i64, kind: EntityKind) -> RemoteEntity {
    RemoteEntity {
        id,
        title: Some(format!("{kind} {id}")),
        kind,
        username: None,
    }
}

/// A message carrying a document with the given file name (if any).
pub fn doc_message(chat_id: i64, id: i32, filename: Option<&str>, size: Option<u64>) -> Message {
    let attributes = filename
        .map(|name| {
            vec![DocumentAttribute::Filename {
                file_name: name.to_string(),
            }]
        })
        .unwrap_or_default();
    Message {
        id,
        chat_id,
        date: Utc.timestamp_opt(1_700_000_000, 0).single(),
        media: Some(Media::Document(Document {
            id: i64::from(id),
            size,
            mime_type: Some("application/pdf".to_string()),
            attributes,
        })),
    }
}
