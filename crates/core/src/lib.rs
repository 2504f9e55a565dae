//! Core of the offline cache interceptor.
//!
//! This crate provides:
//! - Versioned cache stores with a SQLite backend
//! - The interceptor runtime: install, activate, fetch and message handling
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod location;
pub mod manifest;
pub mod version;
pub mod worker;

pub use cache::{CacheDb, NewEntry, StoredEntry};
pub use config::{AppConfig, ConfigError, WorkerVariant};
pub use error::Error;
pub use http::{FetchRequest, RequestMode, ResponseType, WorkerResponse};
pub use manifest::ResourceManifest;
pub use version::CacheName;
pub use worker::{Network, ServiceWorker, WorkerScript};
