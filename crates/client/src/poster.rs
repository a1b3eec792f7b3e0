//! Poster URL resolution with a persistent negative-result cache.
//!
//! `resolve` never fails. A cached value is returned as-is, including the
//! placeholder. On a miss the image search runs once under a timeout; its
//! outcome, a poster URL or the placeholder, is written through to the cache
//! so the same title is never looked up again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cinedex_core::{AppConfig, PosterCache};

use crate::tmdb::{MediaCandidate, MultiSearchRequest, TmdbClient, TmdbConfig, TmdbError};

/// External lookup of image candidates by title.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Wait for any client-side throttling before a lookup. Not covered by
    /// the lookup timeout.
    async fn wait_turn(&self) {}

    async fn search_images(&self, title: &str) -> Result<Vec<MediaCandidate>, TmdbError>;
}

#[async_trait]
impl ImageSearch for TmdbClient {
    async fn wait_turn(&self) {
        TmdbClient::wait_turn(self).await;
    }

    async fn search_images(&self, title: &str) -> Result<Vec<MediaCandidate>, TmdbError> {
        let req = MultiSearchRequest::new(title, self.language());
        req.validate()?;
        self.send_multi(&req).await
    }
}

/// Settings for building poster URLs.
#[derive(Debug, Clone)]
pub struct PosterConfig {
    /// Prefix for candidate image paths.
    pub base_url: String,
    /// Returned, and cached, when no poster can be found.
    pub placeholder_url: String,
    /// Upper bound on one external lookup.
    pub lookup_timeout: Duration,
}

impl Default for PosterConfig {
    fn default() -> Self {
        let app = AppConfig::default();
        let lookup_timeout = app.tmdb_timeout();
        Self { base_url: app.poster_base_url, placeholder_url: app.placeholder_url, lookup_timeout }
    }
}

impl From<&AppConfig> for PosterConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.poster_base_url.clone(),
            placeholder_url: config.placeholder_url.clone(),
            lookup_timeout: config.tmdb_timeout(),
        }
    }
}

/// Resolves film titles to poster URLs.
#[derive(Clone)]
pub struct PosterResolver {
    search: Option<Arc<dyn ImageSearch>>,
    cache: Arc<PosterCache>,
    config: PosterConfig,
}

impl std::fmt::Debug for PosterResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosterResolver")
            .field("search", &self.search.is_some())
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

impl PosterResolver {
    pub fn new(search: Arc<dyn ImageSearch>, cache: Arc<PosterCache>, config: PosterConfig) -> Self {
        Self { search: Some(search), cache, config }
    }

    /// A resolver with no image search; every uncached title gets the placeholder.
    pub fn offline(cache: Arc<PosterCache>, config: PosterConfig) -> Self {
        Self { search: None, cache, config }
    }

    /// Build a TMDB-backed resolver, or an offline one when no API key is set.
    pub fn from_config(config: &AppConfig, cache: Arc<PosterCache>) -> Self {
        let poster_config = PosterConfig::from(config);
        match TmdbConfig::from_app_config(config).and_then(TmdbClient::new) {
            Ok(client) => Self::new(Arc::new(client), cache, poster_config),
            Err(e) => {
                tracing::warn!(error = %e, "poster lookups disabled");
                Self::offline(cache, poster_config)
            }
        }
    }

    pub fn placeholder_url(&self) -> &str {
        &self.config.placeholder_url
    }

    pub fn cache(&self) -> &PosterCache {
        &self.cache
    }

    /// Resolve a title to a poster URL. Never fails.
    pub async fn resolve(&self, title: &str) -> String {
        if title.is_empty() {
            return self.config.placeholder_url.clone();
        }

        if let Some(cached) = self.cache.get(title) {
            tracing::debug!(title, "poster cache hit");
            return cached;
        }

        let Some(search) = &self.search else {
            return self.config.placeholder_url.clone();
        };

        // queueing behind the rate limiter must not count against the lookup
        search.wait_turn().await;
        if let Some(cached) = self.cache.get(title) {
            return cached;
        }

        let url = match tokio::time::timeout(self.config.lookup_timeout, search.search_images(title)).await {
            Ok(Ok(candidates)) => self.pick(&candidates),
            Ok(Err(e)) => {
                tracing::warn!(title, error = %e, "poster lookup failed");
                None
            }
            Err(_) => {
                tracing::warn!(title, timeout = ?self.config.lookup_timeout, "poster lookup timed out");
                None
            }
        };

        let url = url.unwrap_or_else(|| self.config.placeholder_url.clone());
        self.cache.set(title, &url).await;
        url
    }

    /// Resolve several titles in order.
    pub async fn resolve_many(&self, titles: &[String]) -> Vec<String> {
        let mut urls = Vec::with_capacity(titles.len());
        for title in titles {
            urls.push(self.resolve(title).await);
        }
        urls
    }

    /// First movie or TV candidate with a poster, as a full URL.
    fn pick(&self, candidates: &[MediaCandidate]) -> Option<String> {
        candidates
            .iter()
            .find_map(MediaCandidate::poster_path)
            .map(|path| format!("{}{}", self.config.base_url, path))
    }
}
