//! Search event documents.
//!
//! Events are append-only. Each document is stored verbatim as JSON text next
//! to the grouping columns derived from it at write time, so the popular and
//! recent views are grouped, ranked and limited by SQLite. Only the first
//! document of each returned group is read back.

use super::connection::LogDb;
use crate::Error;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_rusqlite::params;

/// A raw event row as stored in the log.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub id: i64,
    pub document: Value,
}

/// Which record version an event was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    Current,
    Legacy,
}

impl SchemaVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaVersion::Current => "current",
            SchemaVersion::Legacy => "legacy",
        }
    }
}

/// Grouping columns for one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventIndex {
    pub schema: SchemaVersion,
    /// Canonical query; `None` keeps the event out of every view.
    pub query_key: Option<String>,
    pub searched_at: Option<DateTime<Utc>>,
}

/// How query groups are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    /// Count descending, then latest descending.
    Popular,
    /// Latest descending.
    Recent,
}

impl GroupOrder {
    /// Missing timestamps are NULL, which SQLite sorts last under DESC.
    /// Remaining ties keep the order in which groups first appeared.
    fn order_by(self) -> &'static str {
        match self {
            GroupOrder::Popular => "g.hits DESC, g.latest DESC, g.first_id ASC",
            GroupOrder::Recent => "g.latest DESC, g.first_id ASC",
        }
    }
}

/// Events sharing one canonical query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryGroup {
    pub query_key: String,
    pub count: u64,
    pub latest: Option<DateTime<Utc>>,
    /// Earliest event of the group.
    pub first_event: StoredEvent,
}

type GroupRow = (String, i64, Option<i64>, i64, String);

impl LogDb {
    /// Append one event document with its grouping columns.
    ///
    /// Returns the row id assigned to the event.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `document` is not a JSON object.
    pub async fn insert_event(
        &self, document: &Value, index: &EventIndex, recorded_at: DateTime<Utc>,
    ) -> Result<i64, Error> {
        if !document.is_object() {
            return Err(Error::InvalidInput("event document must be a JSON object".into()));
        }

        let document = serde_json::to_string(document)?;
        let recorded_at = recorded_at.to_rfc3339();
        let schema = index.schema.as_str();
        let query_key = index.query_key.clone();
        let searched_at = index.searched_at.map(|t| t.timestamp_millis());

        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO search_events (recorded_at, schema_version, query_key, searched_at, document)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![recorded_at, schema, query_key, searched_at, document],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// The top `limit` query groups among events of one schema version.
    pub async fn top_groups(
        &self, schema: SchemaVersion, order: GroupOrder, limit: usize,
    ) -> Result<Vec<QueryGroup>, Error> {
        let sql = format!(
            "SELECT g.query_key, g.hits, g.latest, e.id, e.document
             FROM (
                 SELECT query_key, COUNT(*) AS hits, MAX(searched_at) AS latest, MIN(id) AS first_id
                 FROM search_events
                 WHERE schema_version = ?1 AND query_key IS NOT NULL
                 GROUP BY query_key
             ) g
             JOIN search_events e ON e.id = g.first_id
             ORDER BY {}
             LIMIT ?2",
            order.order_by()
        );
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<GroupRow>, Error> {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![schema.as_str(), limit], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        Ok(rows.into_iter().map(into_group).collect())
    }
}

fn into_group((query_key, hits, latest, id, raw): GroupRow) -> QueryGroup {
    let document = serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(id, error = %e, "unreadable search event document");
        Value::Null
    });

    QueryGroup {
        query_key,
        count: u64::try_from(hits).unwrap_or_default(),
        latest: latest.and_then(DateTime::from_timestamp_millis),
        first_event: StoredEvent { id, document },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn current(key: &str, secs: Option<i64>) -> EventIndex {
        EventIndex { schema: SchemaVersion::Current, query_key: Some(key.into()), searched_at: secs.map(at) }
    }

    async fn insert(db: &LogDb, index: EventIndex) -> i64 {
        db.insert_event(&json!({"search_kind": "keyword"}), &index, Utc::now())
            .await
            .unwrap()
    }

    fn keys(groups: &[QueryGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.query_key.as_str()).collect()
    }

    #[tokio::test]
    async fn test_insert_and_group() {
        let db = LogDb::open_in_memory().await.unwrap();
        let document = json!({"search_kind": "keyword", "params": {"query": "alien"}});
        let first = db.insert_event(&document, &current("alien", Some(1)), Utc::now()).await.unwrap();
        insert(&db, current("alien", Some(5))).await;
        insert(&db, current("heat", Some(3))).await;

        let groups = db.top_groups(SchemaVersion::Current, GroupOrder::Popular, 10).await.unwrap();
        assert_eq!(keys(&groups), vec!["alien", "heat"]);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].latest, Some(at(5)));
        assert_eq!(groups[0].first_event, StoredEvent { id: first, document });
    }

    #[tokio::test]
    async fn test_orders_and_limit() {
        let db = LogDb::open_in_memory().await.unwrap();
        insert(&db, current("old", Some(1))).await;
        insert(&db, current("new", Some(9))).await;
        insert(&db, current("old", Some(2))).await;
        insert(&db, current("undated", None)).await;
        insert(&db, current("mid", Some(4))).await;

        let popular = db.top_groups(SchemaVersion::Current, GroupOrder::Popular, 3).await.unwrap();
        assert_eq!(keys(&popular), vec!["old", "new", "mid"]);

        let recent = db.top_groups(SchemaVersion::Current, GroupOrder::Recent, 10).await.unwrap();
        assert_eq!(keys(&recent), vec!["new", "mid", "old", "undated"]);
        assert_eq!(recent[3].latest, None);
    }

    #[tokio::test]
    async fn test_schema_versions_and_missing_keys_are_separate() {
        let db = LogDb::open_in_memory().await.unwrap();
        insert(&db, current("alien", Some(1))).await;
        insert(&db, EventIndex { schema: SchemaVersion::Legacy, query_key: Some("heat".into()), searched_at: None })
            .await;
        insert(&db, EventIndex { schema: SchemaVersion::Legacy, query_key: None, searched_at: Some(at(9)) }).await;

        let current = db.top_groups(SchemaVersion::Current, GroupOrder::Recent, 10).await.unwrap();
        let legacy = db.top_groups(SchemaVersion::Legacy, GroupOrder::Recent, 10).await.unwrap();
        assert_eq!(keys(&current), vec!["alien"]);
        assert_eq!(keys(&legacy), vec!["heat"]);
    }

    #[tokio::test]
    async fn test_non_object_document_is_rejected() {
        let db = LogDb::open_in_memory().await.unwrap();
        let result = db.insert_event(&json!("just text"), &current("x", None), Utc::now()).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unreadable_first_document_still_counts() {
        let db = LogDb::open_in_memory().await.unwrap();
        db.conn
            .call(|conn| {
                conn.execute(
                    "INSERT INTO search_events (recorded_at, schema_version, query_key, searched_at, document)
                     VALUES ('2024-01-01T00:00:00Z', 'current', 'alien', NULL, '{broken')",
                    [],
                )
            })
            .await
            .unwrap();
        insert(&db, current("alien", Some(1))).await;

        let groups = db.top_groups(SchemaVersion::Current, GroupOrder::Popular, 5).await.unwrap();
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].first_event.document, Value::Null);
    }
}
