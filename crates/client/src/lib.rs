//! Client code for cinedex.
//!
//! This crate provides the TMDB search client and the poster resolver that
//! shields it behind the persistent poster cache.

pub mod poster;
pub mod tmdb;

pub use poster::{ImageSearch, PosterConfig, PosterResolver};
pub use tmdb::{MediaCandidate, MediaType, MultiSearchRequest, TmdbClient, TmdbConfig, TmdbError};
