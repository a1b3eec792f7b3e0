//! SQLite-backed document log for search analytics.
//!
//! This module stores search events as JSON documents and keeps per-film
//! impression counters, using tokio-rusqlite for async access. It supports:
//!
//! - Verbatim document storage, so older record shapes stay readable
//! - Grouping columns written alongside each document, so views are computed in SQL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Upsert-by-key counters
//!
//! Analytics code talks to the store only through [`LogBackend`], obtained
//! from a [`Connector`], so an unreachable store can be substituted in tests.

pub mod connection;
pub mod events;
pub mod impressions;
pub mod migrations;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub use crate::Error;

pub use connection::LogDb;
pub use events::{EventIndex, GroupOrder, QueryGroup, SchemaVersion, StoredEvent};
pub use impressions::ImpressionCounter;

/// Operations the search log needs from its backing store.
#[async_trait]
pub trait LogBackend: Send + Sync {
    async fn insert_event(
        &self, document: &Value, index: &EventIndex, recorded_at: DateTime<Utc>,
    ) -> Result<i64, Error>;

    /// Top `limit` query groups among events of one schema version.
    async fn top_groups(
        &self, schema: SchemaVersion, order: GroupOrder, limit: usize,
    ) -> Result<Vec<QueryGroup>, Error>;

    async fn bump_impression(&self, film_id: i64, seen_at: DateTime<Utc>) -> Result<(), Error>;

    async fn get_impression(&self, film_id: i64) -> Result<Option<ImpressionCounter>, Error>;
}

#[async_trait]
impl LogBackend for LogDb {
    async fn insert_event(
        &self, document: &Value, index: &EventIndex, recorded_at: DateTime<Utc>,
    ) -> Result<i64, Error> {
        LogDb::insert_event(self, document, index, recorded_at).await
    }

    async fn top_groups(
        &self, schema: SchemaVersion, order: GroupOrder, limit: usize,
    ) -> Result<Vec<QueryGroup>, Error> {
        LogDb::top_groups(self, schema, order, limit).await
    }

    async fn bump_impression(&self, film_id: i64, seen_at: DateTime<Utc>) -> Result<(), Error> {
        LogDb::bump_impression(self, film_id, seen_at).await
    }

    async fn get_impression(&self, film_id: i64) -> Result<Option<ImpressionCounter>, Error> {
        LogDb::get_impression(self, film_id).await
    }
}

/// Opens a backing store on demand.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn LogBackend>, Error>;
}

/// Connects to a file-backed [`LogDb`].
#[derive(Debug, Clone)]
pub struct LogDbConnector {
    path: PathBuf,
}

impl LogDbConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Connector for LogDbConnector {
    async fn connect(&self) -> Result<Arc<dyn LogBackend>, Error> {
        let db = LogDb::open(&self.path).await?;
        tracing::info!(path = %self.path.display(), "search log opened");
        Ok(Arc::new(db))
    }
}
