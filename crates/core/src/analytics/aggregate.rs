//! Popular and recent query views over the search log.
//!
//! Both views group events by canonical query. Grouping runs over current
//! records first; only when that yields nothing is the log regrouped using
//! legacy records, keyed by their flat `query` field. Grouping, ranking and
//! the limit are applied by the store, so a view costs one grouped query per
//! schema version however long the log grows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::event::LoggedSearch;
use super::log::SearchLogStore;
use crate::Error;
use crate::store::{GroupOrder, QueryGroup, SchemaVersion};

/// One row of a popular or recent view. Computed per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEntry {
    /// Canonical query the group was keyed on.
    pub query: String,
    /// Number of events in the group.
    pub count: u64,
    /// Most recent event timestamp in the group.
    pub latest_timestamp: Option<DateTime<Utc>>,
    /// Kind of the group's first event; `None` for legacy groups.
    pub search_kind: Option<String>,
    /// Params of the group's first event (legacy: year range and genres).
    pub params: Value,
    /// Log id of the group's first event.
    pub first_event_id: i64,
}

impl From<QueryGroup> for AggregateEntry {
    fn from(group: QueryGroup) -> Self {
        let first = group.first_event;
        let (search_kind, params) = match LoggedSearch::decode(first.id, &first.document) {
            LoggedSearch::Current(c) => (Some(c.search_kind), c.params),
            LoggedSearch::Legacy(l) => (None, l.raw_params()),
        };

        Self {
            query: group.query_key,
            count: group.count,
            latest_timestamp: group.latest,
            search_kind,
            params,
            first_event_id: first.id,
        }
    }
}

/// Read-only popular/recent views over a [`SearchLogStore`].
///
/// Holds no state of its own. Store failures are logged and produce an empty
/// view.
#[derive(Debug, Clone)]
pub struct QueryAggregator {
    log: SearchLogStore,
}

impl QueryAggregator {
    pub fn new(log: SearchLogStore) -> Self {
        Self { log }
    }

    /// Most frequent distinct queries: count descending, then latest descending.
    pub async fn top_popular(&self, limit: usize) -> Vec<AggregateEntry> {
        self.top(GroupOrder::Popular, limit).await
    }

    /// Most recent distinct queries: latest descending, one row per query.
    pub async fn top_recent(&self, limit: usize) -> Vec<AggregateEntry> {
        self.top(GroupOrder::Recent, limit).await
    }

    /// Group under the current schema, falling back to legacy when that is empty.
    ///
    /// # Errors
    ///
    /// Propagates store errors from [`SearchLogStore::top_groups`].
    pub async fn grouped(
        &self, order: GroupOrder, limit: usize,
    ) -> Result<(SchemaVersion, Vec<AggregateEntry>), Error> {
        for schema in [SchemaVersion::Current, SchemaVersion::Legacy] {
            let groups = self.log.top_groups(schema, order, limit).await?;
            if !groups.is_empty() {
                return Ok((schema, groups.into_iter().map(AggregateEntry::from).collect()));
            }
        }
        Ok((SchemaVersion::Legacy, Vec::new()))
    }

    async fn top(&self, order: GroupOrder, limit: usize) -> Vec<AggregateEntry> {
        if limit == 0 {
            return Vec::new();
        }
        match self.grouped(order, limit).await {
            Ok((version, entries)) => {
                tracing::debug!(?order, ?version, entries = entries.len(), "query view computed");
                entries
            }
            Err(e) => {
                tracing::warn!(?order, error = %e, "failed to read query view");
                Vec::new()
            }
        }
    }
}
