//! Persisted record of which store each scope last activated.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

impl CacheDb {
    /// Remember `cache_name` as the active store for `scope`.
    pub async fn save_active(&self, scope: &str, cache_name: &str) -> Result<(), Error> {
        let scope = scope.to_string();
        let cache_name = cache_name.to_string();
        let activated_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO registrations (scope, active_cache, activated_at) VALUES (?1, ?2, ?3)
                    ON CONFLICT(scope) DO UPDATE SET
                        active_cache = excluded.active_cache,
                        activated_at = excluded.activated_at",
                    params![scope, cache_name, activated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// The store last activated for `scope`, if any.
    pub async fn load_active(&self, scope: &str) -> Result<Option<String>, Error> {
        let scope = scope.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let name = conn
                    .query_row(
                        "SELECT active_cache FROM registrations WHERE scope = ?1",
                        params![scope],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(name)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_load_active() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.load_active("https://app.example.com").await.unwrap().is_none());

        db.save_active("https://app.example.com", "app-v1").await.unwrap();
        db.save_active("https://app.example.com", "app-v2").await.unwrap();
        db.save_active("https://other.example.com", "other-v1").await.unwrap();

        assert_eq!(db.load_active("https://app.example.com").await.unwrap().as_deref(), Some("app-v2"));
        assert_eq!(db.load_active("https://other.example.com").await.unwrap().as_deref(), Some("other-v1"));
    }
}
