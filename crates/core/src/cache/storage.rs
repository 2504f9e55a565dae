//! Named cache stores and their entries.
//!
//! Each store maps a request identity (method + URL) to one response.
//! Stores enumerate in creation order; a lookup across all stores returns
//! the match from the oldest store that has one.

use super::connection::CacheDb;
use super::hash::request_key;
use crate::Error;
use crate::http::{ResponseType, WorkerResponse};
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// A response stored under a request identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub store: String,
    pub method: String,
    pub url: String,
    pub response: WorkerResponse,
    pub stored_at: String,
}

/// Request identity plus the response to store for it.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub method: String,
    pub url: String,
    pub response: WorkerResponse,
}

const ENTRY_COLUMNS: &str = "s.name, e.method, e.url, e.response_url, e.status, e.status_text,
     e.response_type, e.headers_json, e.body, e.stored_at";

fn read_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        store: row.get(0)?,
        method: row.get(1)?,
        url: row.get(2)?,
        response_url: row.get(3)?,
        status: row.get(4)?,
        status_text: row.get(5)?,
        response_type: row.get(6)?,
        headers_json: row.get(7)?,
        body: row.get(8)?,
        stored_at: row.get(9)?,
    })
}

/// Row as read from SQLite, before decoding the JSON and enum columns.
struct RawEntry {
    store: String,
    method: String,
    url: String,
    response_url: String,
    status: u16,
    status_text: String,
    response_type: String,
    headers_json: String,
    body: Vec<u8>,
    stored_at: String,
}

impl RawEntry {
    fn decode(self) -> Result<StoredEntry, Error> {
        let response_type = ResponseType::parse(&self.response_type)
            .ok_or_else(|| Error::CorruptEntry(format!("unknown response type {}", self.response_type)))?;
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)?;

        Ok(StoredEntry {
            store: self.store,
            method: self.method,
            url: self.url,
            response: WorkerResponse {
                url: self.response_url,
                status: self.status,
                status_text: self.status_text,
                response_type,
                headers,
                body: Bytes::from(self.body),
            },
            stored_at: self.stored_at,
        })
    }
}

fn insert_entry(tx: &rusqlite::Connection, store_id: i64, entry: &NewEntry, stored_at: &str) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&entry.response.headers)?;
    let method = entry.method.to_ascii_uppercase();
    tx.execute(
        "INSERT INTO cache_entries (
            store_id, key_hash, method, url, response_url, status, status_text,
            response_type, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(store_id, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            response_url = excluded.response_url,
            status = excluded.status,
            status_text = excluded.status_text,
            response_type = excluded.response_type,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store_id,
            request_key(&method, &entry.url),
            &method,
            &entry.url,
            &entry.response.url,
            entry.response.status,
            &entry.response.status_text,
            entry.response.response_type.as_str(),
            headers_json,
            &entry.response.body[..],
            stored_at,
        ],
    )?;
    Ok(())
}

fn ensure_store(conn: &rusqlite::Connection, name: &str) -> Result<i64, Error> {
    conn.execute(
        "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    let id = conn.query_row("SELECT id FROM cache_stores WHERE name = ?1", params![name], |row| row.get(0))?;
    Ok(id)
}

impl CacheDb {
    /// Open the named store, creating it if absent.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_store(conn, &name)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a store with exactly this name exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All store names in creation order.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and every entry in it.
    ///
    /// Returns false if no store had that name.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace one entry in an existing store.
    ///
    /// Fails with `Error::InvalidState` if the store does not exist.
    pub async fn put_entry(&self, store: &str, entry: NewEntry) -> Result<(), Error> {
        let store = store.to_string();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let store_id: Option<i64> = conn
                    .query_row("SELECT id FROM cache_stores WHERE name = ?1", params![store], |row| row.get(0))
                    .optional()?;
                let store_id = store_id.ok_or_else(|| Error::InvalidState(format!("store {store} does not exist")))?;
                insert_entry(conn, store_id, &entry, &stored_at)
            })
            .await
            .map_err(Error::from)
    }

    /// Create the store if needed and write every entry in one transaction.
    ///
    /// Either all entries land or none do, and the store is only created
    /// when the write commits.
    pub async fn put_all(&self, store: &str, entries: Vec<NewEntry>) -> Result<usize, Error> {
        let store = store.to_string();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                let store_id = ensure_store(&tx, &store)?;
                for entry in &entries {
                    insert_entry(&tx, store_id, entry, &stored_at)?;
                }
                tx.commit()?;
                Ok(entries.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up a request in one store, or in every store when `store` is None.
    pub async fn match_entry(&self, store: Option<&str>, method: &str, url: &str) -> Result<Option<StoredEntry>, Error> {
        let store = store.map(str::to_string);
        let key = request_key(method, url);
        self.conn
            .call(move |conn| -> Result<Option<StoredEntry>, Error> {
                let raw = match store {
                    Some(store) => conn
                        .query_row(
                            &format!(
                                "SELECT {ENTRY_COLUMNS} FROM cache_entries e
                                 JOIN cache_stores s ON s.id = e.store_id
                                 WHERE s.name = ?1 AND e.key_hash = ?2"
                            ),
                            params![store, key],
                            read_entry,
                        )
                        .optional()?,
                    None => conn
                        .query_row(
                            &format!(
                                "SELECT {ENTRY_COLUMNS} FROM cache_entries e
                                 JOIN cache_stores s ON s.id = e.store_id
                                 WHERE e.key_hash = ?1
                                 ORDER BY s.id ASC LIMIT 1"
                            ),
                            params![key],
                            read_entry,
                        )
                        .optional()?,
                };

                raw.map(RawEntry::decode).transpose()
            })
            .await
            .map_err(Error::from)
    }

    /// Request identities (method, URL) held by a store, in insertion order.
    pub async fn store_keys(&self, store: &str) -> Result<Vec<(String, String)>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<(String, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.method, e.url FROM cache_entries e
                     JOIN cache_stores s ON s.id = e.store_id
                     WHERE s.name = ?1 ORDER BY e.rowid ASC",
                )?;
                let keys = stmt
                    .query_map(params![store], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<(String, String)>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a store (0 for a missing store).
    pub async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries e
                     JOIN cache_stores s ON s.id = e.store_id
                     WHERE s.name = ?1",
                    params![store],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(url: &str, body: &'static str) -> WorkerResponse {
        WorkerResponse {
            url: url.to_string(),
            status: 200,
            status_text: "OK".to_string(),
            response_type: ResponseType::Basic,
            headers: vec![("content-type".into(), "text/html".into())],
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn entry(url: &str, body: &'static str) -> NewEntry {
        NewEntry { method: "GET".into(), url: url.into(), response: response(url, body) }
    }

    #[tokio::test]
    async fn test_open_store_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("app-v1").await.unwrap();
        db.open_store("app-v1").await.unwrap();
        assert_eq!(db.store_names().await.unwrap(), vec!["app-v1"]);
        assert!(db.has_store("app-v1").await.unwrap());
        assert!(!db.has_store("app-v").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_names_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        for name in ["b-v1", "a-v2", "c-v0"] {
            db.open_store(name).await.unwrap();
        }
        assert_eq!(db.store_names().await.unwrap(), vec!["b-v1", "a-v2", "c-v0"]);
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("app-v1").await.unwrap();
        db.put_entry("app-v1", entry("https://example.com/index.html", "<html>"))
            .await
            .unwrap();

        let found = db
            .match_entry(Some("app-v1"), "GET", "https://example.com/index.html")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.store, "app-v1");
        assert_eq!(found.response.status, 200);
        assert_eq!(found.response.header("content-type"), Some("text/html"));
        assert_eq!(&found.response.body[..], b"<html>");

        let miss = db
            .match_entry(Some("app-v1"), "HEAD", "https://example.com/index.html")
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_put_entry_requires_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.put_entry("missing", entry("https://example.com/", "x")).await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_put_replaces_existing_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("app-v1").await.unwrap();
        db.put_entry("app-v1", entry("https://example.com/a", "old")).await.unwrap();
        db.put_entry("app-v1", entry("https://example.com/a", "new")).await.unwrap();

        assert_eq!(db.entry_count("app-v1").await.unwrap(), 1);
        let found = db.match_entry(None, "GET", "https://example.com/a").await.unwrap().unwrap();
        assert_eq!(&found.response.body[..], b"new");
    }

    #[tokio::test]
    async fn test_match_across_stores_prefers_oldest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("app-v1").await.unwrap();
        db.open_store("app-v2").await.unwrap();
        db.put_entry("app-v2", entry("https://example.com/a", "v2")).await.unwrap();
        db.put_entry("app-v1", entry("https://example.com/a", "v1")).await.unwrap();

        let found = db.match_entry(None, "GET", "https://example.com/a").await.unwrap().unwrap();
        assert_eq!(found.store, "app-v1");
    }

    #[tokio::test]
    async fn test_delete_store_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_all("app-v1", vec![entry("https://example.com/a", "a")]).await.unwrap();

        assert!(db.delete_store("app-v1").await.unwrap());
        assert!(!db.delete_store("app-v1").await.unwrap());
        assert!(db.match_entry(None, "GET", "https://example.com/a").await.unwrap().is_none());
        assert_eq!(db.entry_count("app-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_all_creates_store_and_keeps_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let written = db
            .put_all(
                "app-v1",
                vec![entry("https://example.com/", "root"), entry("https://example.com/index.html", "index")],
            )
            .await
            .unwrap();

        assert_eq!(written, 2);
        let keys = db.store_keys("app-v1").await.unwrap();
        assert_eq!(
            keys,
            vec![
                ("GET".to_string(), "https://example.com/".to_string()),
                ("GET".to_string(), "https://example.com/index.html".to_string()),
            ]
        );
    }
}
