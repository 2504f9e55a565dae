//! swcache server entry point.
//!
//! Loads configuration, brings the configured version into service, then
//! serves MCP on stdio. Logging goes to stderr to avoid interfering with the
//! JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use swcache_client::{FetchClient, FetchConfig};
use swcache_core::{AppConfig, CacheDb, ServiceWorker, WorkerScript};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = Arc::new(AppConfig::load().context("loading configuration")?);
    tracing::info!(
        "Starting swcache server on stdio transport ({} {}, {:?})",
        config.app_name,
        config.cache_version,
        config.variant
    );

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(config.as_ref()))?);
    let worker = Arc::new(ServiceWorker::new(db, network, config.origin.clone()));

    let script = WorkerScript::current(config.clone())?;
    match worker.start(Arc::new(script)).await {
        Ok(status) => {
            let active = status.active.map(|v| v.cache_name);
            tracing::info!("interceptor ready, active version: {:?}", active);
        }
        Err(err) => tracing::error!("no version could be brought into service: {}", err),
    }

    let handler = handler::SwCacheServer::new(worker.clone(), config);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    worker.settle().await;

    Ok(())
}
