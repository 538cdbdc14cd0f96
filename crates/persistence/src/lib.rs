#![deny(warnings)]

//! Persistence layer: an opaque document store keyed by collection and ID.
//!
//! Callers only ever find a document by ID or upsert it by ID. Documents
//! are stored as JSON, in memory or in SQLite (see [`sqlite`]).

pub mod sqlite;

pub use sqlite::{create_save, ensure_parent_dir, init_db, SqliteStore};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sim_core::MissionRecord;
use std::collections::HashMap;
use std::future::Future;
use thiserror::Error;
use tracing::info;

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/fleet.db"
}

/// Document collections the simulation persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Missions,
    Users,
    Ships,
    Prices,
    EventLogs,
    Reports,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Missions => "missions",
            Collection::Users => "users",
            Collection::Ships => "ships",
            Collection::Prices => "prices",
            Collection::EventLogs => "event_logs",
            Collection::Reports => "reports",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),
    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("save directory error: {0}")]
    Io(#[from] std::io::Error),
    #[error("document id must not be empty")]
    EmptyId,
}

/// Find-by-ID and upsert-by-ID over raw JSON bodies.
pub trait DocumentStore {
    fn upsert_raw(
        &mut self,
        collection: Collection,
        id: &str,
        body: String,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn find_raw(
        &self,
        collection: Collection,
        id: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;
}

pub async fn upsert_doc<S, T>(store: &mut S, collection: Collection, id: &str, doc: &T) -> Result<(), StoreError>
where
    S: DocumentStore,
    T: Serialize,
{
    if id.is_empty() {
        return Err(StoreError::EmptyId);
    }
    let body = serde_json::to_string(doc)?;
    store.upsert_raw(collection, id, body).await
}

pub async fn find_doc<S, T>(store: &S, collection: Collection, id: &str) -> Result<Option<T>, StoreError>
where
    S: DocumentStore,
    T: DeserializeOwned,
{
    match store.find_raw(collection, id).await? {
        Some(body) => Ok(Some(serde_json::from_str(&body)?)),
        None => Ok(None),
    }
}

/// Store each mission record and its event log under `run/vessel-N`.
pub async fn save_missions<S: DocumentStore>(store: &mut S, run: &str, missions: &[MissionRecord]) -> Result<(), StoreError> {
    for m in missions {
        let id = format!("{run}/{}", m.vessel);
        upsert_doc(&mut *store, Collection::Missions, &id, m).await?;
        upsert_doc(&mut *store, Collection::EventLogs, &id, &m.log).await?;
    }
    info!(run, missions = missions.len(), "missions saved");
    Ok(())
}

/// In-memory store for tests and unsaved runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: HashMap<(Collection, String), String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    async fn upsert_raw(&mut self, collection: Collection, id: &str, body: String) -> Result<(), StoreError> {
        self.docs.insert((collection, id.to_string()), body);
        Ok(())
    }

    async fn find_raw(&self, collection: Collection, id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.docs.get(&(collection, id.to_string())).cloned())
    }
}
