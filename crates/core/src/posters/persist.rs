//! Atomic snapshot writes for the poster cache file.
//!
//! A snapshot is written to a uniquely named temp file in the target
//! directory, synced, then renamed over the cache file. The cache file is
//! therefore always either absent or a complete snapshot.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;

use crate::Error;

/// Total write-then-rename attempts per snapshot.
pub const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Backoff unit; attempt `n` waits `n * RETRY_BACKOFF` before the next try.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(50);

/// Nanoseconds on the monotonic clock since the first temp name was made.
fn monotonic_ticks() -> u128 {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    ORIGIN.get_or_init(Instant::now).elapsed().as_nanos()
}

/// Temp file path next to `target`: `.{name}.{monotonic nanos}.{random}.tmp`.
pub fn temp_path_for(target: &Path) -> PathBuf {
    let ticks = monotonic_ticks();
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cache".to_string());
    let tmp_name = format!(".{name}.{ticks}.{:08x}.tmp", fastrand::u32(..));

    match target.parent() {
        Some(dir) => dir.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

async fn write_once(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = target.parent()
        && !dir.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(dir).await?;
    }

    let tmp = temp_path_for(target);
    let written = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, target).await
    }
    .await;

    if written.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    written
}

/// Replace `target` with `bytes`, retrying with linear backoff.
///
/// Returns the last I/O error when every attempt failed.
pub async fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), Error> {
    let mut attempt = 1;
    loop {
        match write_once(target, bytes).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt >= MAX_WRITE_ATTEMPTS => return Err(e.into()),
            Err(e) => {
                tracing::debug!(attempt, error = %e, path = %target.display(), "poster cache write failed, retrying");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_paths_are_unique_siblings() {
        let target = Path::new("/var/cache/cinedex/poster_cache.json");
        let a = temp_path_for(target);
        let b = temp_path_for(target);

        assert_ne!(a, b);
        assert_eq!(a.parent(), target.parent());
        let name = a.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".poster_cache.json."));
        assert!(name.ends_with(".tmp"));
    }

    fn ticks_of(path: &Path) -> u128 {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        name.trim_start_matches(".cache.json.").split('.').next().unwrap().parse().unwrap()
    }

    #[test]
    fn test_temp_names_follow_monotonic_clock() {
        let target = Path::new("cache.json");
        let mut previous = ticks_of(&temp_path_for(target));
        for _ in 0..100 {
            let next = ticks_of(&temp_path_for(target));
            assert!(next >= previous);
            previous = next;
        }
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("cache.json");

        write_atomic(&target, b"{\"a\":\"1\"}").await.unwrap();
        write_atomic(&target, b"{\"b\":\"2\"}").await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "{\"b\":\"2\"}");
        let leftovers = std::fs::read_dir(target.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn test_write_atomic_gives_up_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let target = blocker.join("cache.json");

        let started = std::time::Instant::now();
        let err = write_atomic(&target, b"{}").await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        // two backoff sleeps: 50ms + 100ms
        assert!(started.elapsed() >= Duration::from_millis(150));
    }
}
