//! Search event record versions.
//!
//! Two document shapes live side by side in the log:
//!
//! - current: `{timestamp, search_kind, params}` where `search_kind` selects
//!   which `params` fields matter (older writers named it `search_type`);
//! - legacy: a flat `{query, year_from, year_to, genres, timestamp | last_searched}`
//!   with no kind at all.
//!
//! [`LoggedSearch::decode`] classifies a document once, and everything
//! downstream matches on the variant instead of probing fields. The grouping
//! columns stored with each event come from [`LoggedSearch::index`].

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::store::{EventIndex, SchemaVersion};

/// Canonical key for current records whose kind or fields are not recognised.
pub const UNKNOWN_QUERY: &str = "unknown";

/// What kind of search produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    /// Free-text title search; `params.query`.
    Keyword,
    /// Browse by genre; `params.category_id` and optionally `params.genre_name`.
    Genre,
    /// Browse by release year; `params.year`.
    Year,
    /// Search saved from the UI form; `query`, `year_from`, `year_to`, `genres`.
    Manual,
}

impl SearchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchKind::Keyword => "keyword",
            SearchKind::Genre => "genre",
            SearchKind::Year => "year",
            SearchKind::Manual => "manual",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "keyword" => Some(SearchKind::Keyword),
            "genre" => Some(SearchKind::Genre),
            "year" => Some(SearchKind::Year),
            "manual" => Some(SearchKind::Manual),
            _ => None,
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event written with a `search_kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSearch {
    pub id: i64,
    pub timestamp: Option<DateTime<Utc>>,
    /// Kind exactly as stored; may name a kind this build does not know.
    pub search_kind: String,
    pub params: Value,
}

/// A flat event from before search kinds existed.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacySearch {
    pub id: i64,
    pub timestamp: Option<DateTime<Utc>>,
    pub query: Option<String>,
    pub year_from: Value,
    pub year_to: Value,
    pub genres: Value,
}

/// A decoded log record, tagged by schema version.
#[derive(Debug, Clone, PartialEq)]
pub enum LoggedSearch {
    Current(CurrentSearch),
    Legacy(LegacySearch),
}

impl LoggedSearch {
    /// Classify a stored document.
    ///
    /// A string `search_kind` (or `search_type`) makes it current; anything
    /// else, including non-object documents, is read as legacy.
    pub fn decode(id: i64, document: &Value) -> Self {
        let empty = Map::new();
        let doc = document.as_object().unwrap_or(&empty);

        let kind = doc
            .get("search_kind")
            .or_else(|| doc.get("search_type"))
            .and_then(Value::as_str);

        if let Some(kind) = kind {
            return LoggedSearch::Current(CurrentSearch {
                id,
                timestamp: doc.get("timestamp").and_then(parse_timestamp),
                search_kind: kind.to_string(),
                params: doc.get("params").cloned().unwrap_or_else(|| Value::Object(Map::new())),
            });
        }

        let query = doc
            .get("query")
            .and_then(Value::as_str)
            .or_else(|| doc.get("params").and_then(|p| p.get("query")).and_then(Value::as_str))
            .map(str::to_string);

        let timestamp = doc
            .get("timestamp")
            .and_then(parse_timestamp)
            .or_else(|| doc.get("last_searched").and_then(parse_timestamp));

        LoggedSearch::Legacy(LegacySearch {
            id,
            timestamp,
            query,
            year_from: doc.get("year_from").cloned().unwrap_or(Value::Null),
            year_to: doc.get("year_to").cloned().unwrap_or(Value::Null),
            genres: doc.get("genres").cloned().unwrap_or(Value::Null),
        })
    }

    pub fn id(&self) -> i64 {
        match self {
            LoggedSearch::Current(c) => c.id,
            LoggedSearch::Legacy(l) => l.id,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            LoggedSearch::Current(c) => c.timestamp,
            LoggedSearch::Legacy(l) => l.timestamp,
        }
    }

    /// Grouping key for this record, `None` when a legacy record has no query.
    pub fn canonical_key(&self) -> Option<String> {
        match self {
            LoggedSearch::Current(c) => Some(c.canonical_key()),
            LoggedSearch::Legacy(l) => l.canonical_key(),
        }
    }

    pub fn schema(&self) -> SchemaVersion {
        match self {
            LoggedSearch::Current(_) => SchemaVersion::Current,
            LoggedSearch::Legacy(_) => SchemaVersion::Legacy,
        }
    }

    /// Columns the log groups this record by.
    pub fn index(&self) -> EventIndex {
        EventIndex { schema: self.schema(), query_key: self.canonical_key(), searched_at: self.timestamp() }
    }
}

impl CurrentSearch {
    pub fn kind(&self) -> Option<SearchKind> {
        SearchKind::parse(&self.search_kind)
    }

    /// `keyword` groups by query, `genre` by `genre:<category_id>`, `year` by
    /// the year. Everything else, and any missing field, is [`UNKNOWN_QUERY`].
    pub fn canonical_key(&self) -> String {
        let param = |name: &str| self.params.get(name).and_then(scalar_to_string);

        let key = match self.kind() {
            Some(SearchKind::Keyword) => param("query"),
            Some(SearchKind::Genre) => param("category_id").map(|id| format!("genre:{id}")),
            Some(SearchKind::Year) => param("year"),
            Some(SearchKind::Manual) | None => None,
        };

        key.unwrap_or_else(|| UNKNOWN_QUERY.to_string())
    }
}

impl LegacySearch {
    pub fn canonical_key(&self) -> Option<String> {
        self.query.clone().filter(|q| !q.is_empty())
    }

    /// The legacy filter fields, with `genres` defaulting to an empty list.
    pub fn raw_params(&self) -> Value {
        let genres = if self.genres.is_null() { json!([]) } else { self.genres.clone() };
        json!({
            "year_from": self.year_from,
            "year_to": self.year_to,
            "genres": genres,
        })
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Read a stored timestamp.
///
/// Accepts RFC 3339, naive ISO-8601 (taken as UTC), integer epoch seconds and
/// extended-JSON `{"$date": ...}` wrappers. Anything else is `None`.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|t| t.and_utc()))
            .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").ok().map(|t| t.and_utc())),
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::Object(map) => map.get("$date").and_then(parse_timestamp),
        _ => None,
    }
}
