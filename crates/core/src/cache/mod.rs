//! SQLite-backed cache storage.
//!
//! Named stores of request/response pairs, persisted with tokio-rusqlite:
//!
//! - Stores enumerate in creation order and are deleted as a unit
//! - Entries are keyed by SHA-256 of method and URL
//! - Automatic schema migrations, WAL mode
//! - A per-scope record of the last activated store

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod registration;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use storage::{NewEntry, StoredEntry};
