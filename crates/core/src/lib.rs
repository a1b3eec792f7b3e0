//! Core types and shared functionality for cinedex.
//!
//! This crate provides:
//! - Search analytics: event log, impression counters, popular/recent views
//! - SQLite document log backend
//! - Persistent poster URL cache
//! - Unified error types
//! - Configuration structures

pub mod analytics;
pub mod config;
pub mod error;
pub mod posters;
pub mod store;

pub use analytics::{AggregateEntry, QueryAggregator, SearchKind, SearchLogStore};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use posters::PosterCache;
pub use store::{ImpressionCounter, LogDb};
