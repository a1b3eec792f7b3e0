//! Persistent title → poster URL cache.
//!
//! The cache keeps an in-memory mirror and a JSON file on disk. Reads go to
//! the mirror only and never block on writers. Writes are serialized by one
//! lock held across update-then-persist; the mirror is swapped as a whole, so
//! a reader sees either the previous or the new map.
//!
//! Persistence is best effort. A snapshot that cannot be written after
//! [`persist::MAX_WRITE_ATTEMPTS`] tries is logged and dropped; the in-memory
//! value stays and the next successful write includes it again.

pub mod persist;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;

/// Title → URL cache backed by a JSON file.
#[derive(Debug)]
pub struct PosterCache {
    path: PathBuf,
    entries: ArcSwap<HashMap<String, String>>,
    write_lock: Mutex<()>,
}

impl PosterCache {
    /// Load the cache file at `path`.
    ///
    /// A missing, unreadable or malformed file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_snapshot(&path);
        tracing::debug!(path = %path.display(), entries = entries.len(), "poster cache loaded");

        Self { path, entries: ArcSwap::from_pointee(entries), write_lock: Mutex::new(()) }
    }

    /// Look up a title in the in-memory mirror.
    pub fn get(&self, title: &str) -> Option<String> {
        if title.is_empty() {
            return None;
        }
        self.entries.load().get(title).cloned()
    }

    /// Store `url` under `title` and persist the whole cache.
    ///
    /// Empty titles are ignored. Never fails: persistence errors are logged.
    pub async fn set(&self, title: &str, url: &str) {
        if title.is_empty() {
            return;
        }

        let _guard = self.write_lock.lock().await;

        let mut next = HashMap::clone(&self.entries.load());
        next.insert(title.to_string(), url.to_string());
        let next = Arc::new(next);
        self.entries.store(Arc::clone(&next));

        let bytes = match serde_json::to_vec_pretty(&sorted(&next)) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode poster cache");
                return;
            }
        };

        if let Err(e) = persist::write_atomic(&self.path, &bytes).await {
            tracing::warn!(
                error = %e,
                path = %self.path.display(),
                attempts = persist::MAX_WRITE_ATTEMPTS,
                "poster cache write failed; keeping in-memory entry"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.load().is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn sorted(entries: &HashMap<String, String>) -> BTreeMap<&str, &str> {
    entries.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

fn read_snapshot(path: &Path) -> HashMap<String, String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "poster cache unreadable, starting empty");
            return HashMap::new();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "poster cache malformed, starting empty");
            HashMap::new()
        }
    }
}
