//! TMDB multi-search request parameters.

use serde::Serialize;

use super::TmdbError;

/// Longest title sent to the API; longer strings are not film titles.
const MAX_QUERY_CHARS: usize = 500;

/// Query parameters for `GET /search/multi`.
///
/// The API key is attached by the client, not stored here.
#[derive(Debug, Clone, Serialize, Default)]
pub struct MultiSearchRequest {
    /// Title to look up (required).
    pub query: String,

    /// Response language (e.g., "en-US").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Include adult titles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_adult: Option<bool>,

    /// Result page (1-based, default 1).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl MultiSearchRequest {
    pub fn new(query: impl Into<String>, language: impl Into<String>) -> Self {
        Self { query: query.into(), language: Some(language.into()), ..Default::default() }
    }

    /// Validate the request parameters.
    pub fn validate(&self) -> Result<(), TmdbError> {
        if self.query.trim().is_empty() {
            return Err(TmdbError::InvalidQuery("query cannot be empty".to_string()));
        }

        let chars = self.query.chars().count();
        if chars > MAX_QUERY_CHARS {
            return Err(TmdbError::InvalidQuery(format!("query too long: {chars} chars (max {MAX_QUERY_CHARS})")));
        }

        if self.page == Some(0) {
            return Err(TmdbError::InvalidQuery("page starts at 1".to_string()));
        }

        Ok(())
    }
}
