//! Log store schema migrations.
//!
//! The applied schema version lives in SQLite's `user_version` pragma. Each
//! pending script runs in its own transaction together with the version bump,
//! so a failed script leaves the previous version in place.

use crate::Error;
use tokio_rusqlite::Connection;

/// Schema scripts; script `n` (0-based) upgrades the log to version `n + 1`.
const MIGRATIONS: &[&str] = &[
    include_str!("../../migrations/001_search_events.sql"),
    include_str!("../../migrations/002_film_impressions.sql"),
];

/// Bring the schema up to the latest version.
///
/// # Errors
///
/// Returns `MigrationFailed` when the stored version is newer than this build
/// knows, or `Database` when a script fails.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let applied: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        let latest = MIGRATIONS.len() as i64;

        if applied > latest {
            return Err(Error::MigrationFailed(format!(
                "log schema version {applied} is newer than supported version {latest}"
            )));
        }

        for (version, script) in (1..).zip(MIGRATIONS).skip(applied as usize) {
            tracing::debug!(version, "applying log store migration");
            let tx = conn.transaction()?;
            tx.execute_batch(script)?;
            tx.pragma_update(None, "user_version", version)?;
            tx.commit()?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
