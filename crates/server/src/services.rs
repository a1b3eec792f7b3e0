//! Long-lived collaborators shared by every tool call.

use std::sync::Arc;

use cinedex_client::PosterResolver;
use cinedex_core::{AppConfig, PosterCache, QueryAggregator, SearchLogStore};

/// Handles to the search log, the query views and the poster resolver.
#[derive(Debug, Clone)]
pub struct Services {
    pub log: SearchLogStore,
    pub aggregator: QueryAggregator,
    pub posters: PosterResolver,
}

impl Services {
    /// Wire services from configuration.
    ///
    /// Nothing here touches the network or the log database; both are reached
    /// lazily by the first call that needs them.
    pub fn from_config(config: &AppConfig) -> Self {
        let log = SearchLogStore::from_config(config);
        let cache = Arc::new(PosterCache::load(&config.poster_cache_path));
        Self::new(log, PosterResolver::from_config(config, cache))
    }

    pub fn new(log: SearchLogStore, posters: PosterResolver) -> Self {
        let aggregator = QueryAggregator::new(log.clone());
        Self { log, aggregator, posters }
    }
}
