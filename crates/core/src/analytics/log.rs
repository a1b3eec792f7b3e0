//! Best-effort search event log and impression counters.
//!
//! The backing store is optional at runtime. It is opened lazily on the first
//! call that needs it and every public operation tries to connect at most once;
//! a failure is logged, the call degrades to a no-op, and the next call may try
//! again. Nothing in here returns an error to the request path except
//! [`SearchLogStore::top_groups`], which the aggregator handles.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;

use super::event::{LoggedSearch, SearchKind};
use crate::Error;
use crate::config::AppConfig;
use crate::store::{Connector, GroupOrder, ImpressionCounter, LogBackend, LogDbConnector, QueryGroup, SchemaVersion};

enum ConnectionState {
    Disconnected,
    Connected(Arc<dyn LogBackend>),
}

struct Inner {
    connector: Box<dyn Connector>,
    state: Mutex<ConnectionState>,
    connect_timeout: Duration,
    op_timeout: Duration,
}

/// Append-only search log with per-film impression counters.
///
/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct SearchLogStore {
    inner: Arc<Inner>,
}

impl fmt::Debug for SearchLogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchLogStore")
            .field("connect_timeout", &self.inner.connect_timeout)
            .field("op_timeout", &self.inner.op_timeout)
            .finish_non_exhaustive()
    }
}

/// Reuses one already-open backend.
struct ReadyConnector(Arc<dyn LogBackend>);

#[async_trait::async_trait]
impl Connector for ReadyConnector {
    async fn connect(&self) -> Result<Arc<dyn LogBackend>, Error> {
        Ok(Arc::clone(&self.0))
    }
}

impl SearchLogStore {
    /// Create a disconnected store that opens its backend on first use.
    pub fn new(connector: impl Connector + 'static, connect_timeout: Duration, op_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector: Box::new(connector),
                state: Mutex::new(ConnectionState::Disconnected),
                connect_timeout,
                op_timeout,
            }),
        }
    }

    /// Create a store backed by the SQLite log named in the configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(LogDbConnector::new(&config.log_db_path), config.connect_timeout(), config.store_timeout())
    }

    /// Create a store around an already-open backend.
    pub fn with_backend(backend: Arc<dyn LogBackend>, op_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector: Box::new(ReadyConnector(Arc::clone(&backend))),
                state: Mutex::new(ConnectionState::Connected(backend)),
                connect_timeout: op_timeout,
                op_timeout,
            }),
        }
    }

    /// Return the backend, attempting one connect if there is none yet.
    ///
    /// Waiting for the state lock and the connect itself share one
    /// `connect_timeout` budget, so every caller gives up within that bound
    /// even while another caller's attempt is in flight.
    pub async fn ensure_connected(&self) -> Option<Arc<dyn LogBackend>> {
        let attempt = async {
            let mut state = self.inner.state.lock().await;
            if let ConnectionState::Connected(backend) = &*state {
                return Ok(Arc::clone(backend));
            }

            let backend = self.inner.connector.connect().await?;
            *state = ConnectionState::Connected(Arc::clone(&backend));
            Ok::<_, Error>(backend)
        };

        match tokio::time::timeout(self.inner.connect_timeout, attempt).await {
            Ok(Ok(backend)) => Some(backend),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "search log unavailable");
                None
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.inner.connect_timeout, "search log connect timed out");
                None
            }
        }
    }

    /// Whether a backend is currently held. Does not try to connect.
    pub async fn is_connected(&self) -> bool {
        matches!(*self.inner.state.lock().await, ConnectionState::Connected(_))
    }

    /// Check that the backing store can be reached.
    pub async fn ping(&self) -> bool {
        self.ensure_connected().await.is_some()
    }

    async fn bounded<T>(&self, op: &str, fut: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
        tokio::time::timeout(self.inner.op_timeout, fut)
            .await
            .map_err(|_| Error::StoreTimeout(op.to_string()))?
    }

    /// Record one search with the current time.
    ///
    /// Returns whether the event was stored; failures are logged and swallowed.
    pub async fn append(&self, kind: SearchKind, params: Map<String, Value>) -> bool {
        let document = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "search_kind": kind.as_str(),
            "params": Value::Object(params),
        });
        self.store_document(&document, "append").await
    }

    /// Store a document verbatim, e.g. when importing records from an older log.
    pub async fn append_document(&self, document: Value) -> bool {
        self.store_document(&document, "append_document").await
    }

    async fn store_document(&self, document: &Value, op: &str) -> bool {
        let Some(backend) = self.ensure_connected().await else {
            return false;
        };

        // ids are assigned by the store; only the grouping columns matter here
        let index = LoggedSearch::decode(0, document).index();
        match self.bounded(op, backend.insert_event(document, &index, Utc::now())).await {
            Ok(id) => {
                tracing::debug!(id, "search event logged");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, op, "failed to log search event");
                false
            }
        }
    }

    /// Bump the impression counter of every film shown in a result page.
    ///
    /// Each id is upserted on its own; returns how many succeeded.
    pub async fn record_impressions(&self, film_ids: &[i64]) -> usize {
        if film_ids.is_empty() {
            return 0;
        }
        let Some(backend) = self.ensure_connected().await else {
            return 0;
        };

        let now = Utc::now();
        let mut recorded = 0;
        for &film_id in film_ids {
            match self.bounded("record_impressions", backend.bump_impression(film_id, now)).await {
                Ok(()) => recorded += 1,
                Err(e) => tracing::warn!(film_id, error = %e, "failed to record impression"),
            }
        }
        recorded
    }

    /// Read one film's impression counter; `None` if absent or unreachable.
    pub async fn impressions(&self, film_id: i64) -> Option<ImpressionCounter> {
        let backend = self.ensure_connected().await?;
        match self.bounded("impressions", backend.get_impression(film_id)).await {
            Ok(counter) => counter,
            Err(e) => {
                tracing::warn!(film_id, error = %e, "failed to read impressions");
                None
            }
        }
    }

    /// Top `limit` query groups among events of one schema version.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` when no backend can be reached and
    /// `StoreTimeout` or `Database` when the query fails.
    pub async fn top_groups(
        &self, schema: SchemaVersion, order: GroupOrder, limit: usize,
    ) -> Result<Vec<QueryGroup>, Error> {
        let backend = self
            .ensure_connected()
            .await
            .ok_or_else(|| Error::StoreUnavailable("search log is not connected".into()))?;

        self.bounded("top_groups", backend.top_groups(schema, order, limit)).await
    }
}
