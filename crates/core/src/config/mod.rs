//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CINEDEX_*)
//! 2. TOML config file (if CINEDEX_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CINEDEX_*)
/// 2. TOML config file (if CINEDEX_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// TMDB API key used for poster lookups.
    ///
    /// Set via CINEDEX_TMDB_API_KEY environment variable.
    /// Without it every poster resolves to the placeholder.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// Root of the TMDB REST API.
    #[serde(default = "default_tmdb_base_url")]
    pub tmdb_base_url: String,

    /// Language sent with every lookup.
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Poster lookup timeout in milliseconds.
    ///
    /// Set via CINEDEX_TMDB_TIMEOUT_MS environment variable.
    #[serde(default = "default_tmdb_timeout_ms")]
    pub tmdb_timeout_ms: u64,

    /// Base URL prefixed to a candidate's poster path.
    #[serde(default = "default_poster_base_url")]
    pub poster_base_url: String,

    /// Local fallback image, also cached as the negative result.
    #[serde(default = "default_placeholder_url")]
    pub placeholder_url: String,

    /// Path to the JSON poster cache file.
    ///
    /// Set via CINEDEX_POSTER_CACHE_PATH environment variable.
    #[serde(default = "default_poster_cache_path")]
    pub poster_cache_path: PathBuf,

    /// Path to the SQLite search log.
    ///
    /// Set via CINEDEX_LOG_DB_PATH environment variable.
    #[serde(default = "default_log_db_path")]
    pub log_db_path: PathBuf,

    /// Deadline for opening the search log, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Deadline for each search log round-trip, in milliseconds.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".into()
}

fn default_tmdb_language() -> String {
    "en-US".into()
}

fn default_tmdb_timeout_ms() -> u64 {
    2_000
}

fn default_poster_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".into()
}

fn default_placeholder_url() -> String {
    "/static/images/no-poster.svg".into()
}

fn default_poster_cache_path() -> PathBuf {
    PathBuf::from("./poster_cache.json")
}

fn default_log_db_path() -> PathBuf {
    PathBuf::from("./cinedex-log.sqlite")
}

fn default_connect_timeout_ms() -> u64 {
    500
}

fn default_store_timeout_ms() -> u64 {
    2_000
}

fn default_user_agent() -> String {
    "cinedex/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            tmdb_base_url: default_tmdb_base_url(),
            tmdb_language: default_tmdb_language(),
            tmdb_timeout_ms: default_tmdb_timeout_ms(),
            poster_base_url: default_poster_base_url(),
            placeholder_url: default_placeholder_url(),
            poster_cache_path: default_poster_cache_path(),
            log_db_path: default_log_db_path(),
            connect_timeout_ms: default_connect_timeout_ms(),
            store_timeout_ms: default_store_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl AppConfig {
    /// Poster lookup timeout as Duration.
    pub fn tmdb_timeout(&self) -> Duration {
        Duration::from_millis(self.tmdb_timeout_ms)
    }

    /// Search log connect timeout as Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Search log per-operation timeout as Duration.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CINEDEX_`
    /// 2. TOML file from `CINEDEX_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CINEDEX_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CINEDEX_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the TMDB API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the TMDB API key is not set.
    pub fn require_tmdb_api_key(&self) -> Result<&str, ConfigError> {
        self.tmdb_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "tmdb_api_key".into(),
                hint: "Set CINEDEX_TMDB_API_KEY environment variable".into(),
            })
    }
}
