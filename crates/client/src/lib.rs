//! Network side of the offline cache interceptor.
//!
//! This crate provides the reqwest-backed [`Network`](swcache_core::Network)
//! used by the server to reach origins the cache cannot answer for.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, UrlError, canonicalize};
