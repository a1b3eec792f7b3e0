//! TMDB multi-search response types and normalization.

use serde::{Deserialize, Serialize};

/// Raw response from `GET /search/multi`.
#[derive(Debug, Deserialize)]
pub struct TmdbApiResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<RawMultiResult>,
    #[serde(default)]
    pub total_results: u64,
}

/// One raw result. Movies carry `title`, TV shows and people carry `name`.
#[derive(Debug, Deserialize)]
pub struct RawMultiResult {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Media classification of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
    Person,
    Other,
}

impl MediaType {
    fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("movie") => MediaType::Movie,
            Some("tv") => MediaType::Tv,
            Some("person") => MediaType::Person,
            _ => MediaType::Other,
        }
    }

    /// Films and series have posters; people and unknown kinds do not count.
    pub fn is_screen_media(self) -> bool {
        matches!(self, MediaType::Movie | MediaType::Tv)
    }
}

/// Normalized candidate, in API order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaCandidate {
    pub rank: usize,
    pub media_type: MediaType,
    /// Relative poster path such as `/abc.jpg`; `None` when absent or empty.
    pub image_path: Option<String>,
    pub title: Option<String>,
    pub tmdb_id: Option<i64>,
}

impl MediaCandidate {
    /// A candidate is usable when it is a movie or TV show with a poster.
    pub fn poster_path(&self) -> Option<&str> {
        if self.media_type.is_screen_media() { self.image_path.as_deref() } else { None }
    }
}

impl From<TmdbApiResponse> for Vec<MediaCandidate> {
    fn from(raw: TmdbApiResponse) -> Self {
        raw.results
            .into_iter()
            .enumerate()
            .map(|(idx, r)| MediaCandidate {
                rank: idx + 1,
                media_type: MediaType::from_raw(r.media_type.as_deref()),
                image_path: r.poster_path.filter(|p| !p.is_empty()),
                title: r.title.or(r.name),
                tmdb_id: r.id,
            })
            .collect()
    }
}
