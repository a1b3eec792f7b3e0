//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

const MAX_TIMEOUT_MS: u64 = 30_000;

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `tmdb_timeout_ms` is below 100ms or above 30s
    /// - `connect_timeout_ms` / `store_timeout_ms` are below 50ms or above 30s
    /// - any URL, language or user agent field is empty
    /// - `tmdb_base_url` is not an absolute URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_timeout("tmdb_timeout_ms", self.tmdb_timeout_ms, 100)?;
        check_timeout("connect_timeout_ms", self.connect_timeout_ms, 50)?;
        check_timeout("store_timeout_ms", self.store_timeout_ms, 50)?;

        for (field, value) in [
            ("tmdb_base_url", &self.tmdb_base_url),
            ("tmdb_language", &self.tmdb_language),
            ("poster_base_url", &self.poster_base_url),
            ("placeholder_url", &self.placeholder_url),
            ("user_agent", &self.user_agent),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
            }
        }

        if let Err(e) = url::Url::parse(&self.tmdb_base_url) {
            return Err(ConfigError::Invalid { field: "tmdb_base_url".into(), reason: e.to_string() });
        }

        if self.poster_cache_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "poster_cache_path".into(), reason: "must not be empty".into() });
        }

        if self.tmdb_api_key.is_none() {
            tracing::warn!("tmdb_api_key is not set; posters will resolve to the placeholder");
        }

        Ok(())
    }
}

fn check_timeout(field: &str, value_ms: u64, min_ms: u64) -> Result<(), ConfigError> {
    if value_ms < min_ms {
        return Err(ConfigError::Invalid { field: field.into(), reason: format!("must be at least {min_ms}ms") });
    }
    if value_ms > MAX_TIMEOUT_MS {
        return Err(ConfigError::Invalid {
            field: field.into(),
            reason: format!("must not exceed 30 seconds ({MAX_TIMEOUT_MS}ms)"),
        });
    }
    Ok(())
}
