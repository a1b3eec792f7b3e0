//! Per-film impression counters.

use super::connection::LogDb;
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// How often a film appeared in search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpressionCounter {
    pub film_id: i64,
    pub search_impressions: i64,
    pub last_seen_at: DateTime<Utc>,
}

impl LogDb {
    /// Increment the impression counter for a film.
    ///
    /// Uses UPSERT semantics: the first impression creates the row with a
    /// count of one, later ones increment it and refresh `last_seen_at`.
    pub async fn bump_impression(&self, film_id: i64, seen_at: DateTime<Utc>) -> Result<(), Error> {
        let seen_at = seen_at.to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO film_impressions (film_id, search_impressions, last_seen_at)
                    VALUES (?1, 1, ?2)
                    ON CONFLICT(film_id) DO UPDATE SET
                        search_impressions = search_impressions + 1,
                        last_seen_at = excluded.last_seen_at",
                    params![film_id, seen_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the impression counter for a film.
    ///
    /// Returns None if the film was never shown in results.
    pub async fn get_impression(&self, film_id: i64) -> Result<Option<ImpressionCounter>, Error> {
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(i64, String)>, Error> {
                let result = conn.query_row(
                    "SELECT search_impressions, last_seen_at FROM film_impressions WHERE film_id = ?1",
                    params![film_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((search_impressions, last_seen_at)) = row else {
            return Ok(None);
        };

        let last_seen_at = DateTime::parse_from_rfc3339(&last_seen_at)
            .map_err(|e| Error::Serialization(format!("film {film_id} last_seen_at: {e}")))?
            .with_timezone(&Utc);

        Ok(Some(ImpressionCounter { film_id, search_impressions, last_seen_at }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_first_impression_creates_counter() {
        let db = LogDb::open_in_memory().await.unwrap();
        assert!(db.get_impression(7).await.unwrap().is_none());

        let now = Utc::now();
        db.bump_impression(7, now).await.unwrap();

        let counter = db.get_impression(7).await.unwrap().unwrap();
        assert_eq!(counter.search_impressions, 1);
        assert_eq!(counter.last_seen_at.timestamp(), now.timestamp());
    }

    #[tokio::test]
    async fn test_repeat_impressions_increment() {
        let db = LogDb::open_in_memory().await.unwrap();
        let earlier = Utc::now() - Duration::hours(1);
        let later = Utc::now();

        db.bump_impression(42, earlier).await.unwrap();
        db.bump_impression(42, later).await.unwrap();
        db.bump_impression(43, earlier).await.unwrap();

        let counter = db.get_impression(42).await.unwrap().unwrap();
        assert_eq!(counter.search_impressions, 2);
        assert_eq!(counter.last_seen_at.timestamp(), later.timestamp());

        let other = db.get_impression(43).await.unwrap().unwrap();
        assert_eq!(other.search_impressions, 1);
    }
}
