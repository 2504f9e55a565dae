//! cache_delete tool implementation.
//!
//! Deletes one named store and every entry in it.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::CacheDb;

use crate::error::ToolError;
use crate::tools::json_result;

/// Parameters for the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteParams {
    /// Name of the store to delete.
    pub store: String,
}

/// Output from the cache_delete tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDeleteOutput {
    pub store: String,
    /// False when no store had that name.
    pub deleted: bool,
}

/// Implementation of the cache_delete tool.
pub async fn delete_impl(cache: &CacheDb, params: CacheDeleteParams) -> Result<CallToolResult, McpError> {
    if params.store.is_empty() {
        return Err(ToolError::InvalidInput("store cannot be empty".into()).into());
    }

    let deleted = cache.delete_store(&params.store).await?;
    if deleted {
        tracing::info!("cache store {} deleted", params.store);
    }

    Ok(json_result(&CacheDeleteOutput { store: params.store, deleted })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_worker, output};

    #[tokio::test]
    async fn test_delete_existing_then_missing() {
        let worker = active_worker().await;
        let params = CacheDeleteParams { store: "notes-v2".into() };

        let out: CacheDeleteOutput = output(&delete_impl(worker.db(), params.clone()).await.unwrap());
        assert!(out.deleted);
        assert!(worker.db().store_names().await.unwrap().is_empty());

        let out: CacheDeleteOutput = output(&delete_impl(worker.db(), params).await.unwrap());
        assert!(!out.deleted);
    }

    #[tokio::test]
    async fn test_delete_requires_name() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let err = delete_impl(&cache, CacheDeleteParams { store: String::new() }).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
