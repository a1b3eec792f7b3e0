//! Search analytics: the event log and the popular/recent query views.

pub mod aggregate;
pub mod event;
pub mod log;

pub use crate::store::{GroupOrder, SchemaVersion};
pub use aggregate::{AggregateEntry, QueryAggregator};
pub use event::{LoggedSearch, SearchKind, UNKNOWN_QUERY};
pub use log::SearchLogStore;
