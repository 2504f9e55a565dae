//! Cache store MCP tools.
//!
//! This module provides tools for inspecting and pruning the SQLite-backed
//! cache stores directly, outside the fetch path.

pub mod delete;
pub mod get;
pub mod keys;

pub use delete::{CacheDeleteParams, delete_impl};
pub use get::{CacheGetParams, get_impl};
pub use keys::{CacheKeysParams, keys_impl};
