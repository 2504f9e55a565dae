//! cache_get tool implementation.
//!
//! Retrieves a stored response by request method and URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, Error};

use crate::error::ToolError;
use crate::tools::json_result;
use crate::tools::sw_fetch::ResponseView;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL of the stored request.
    pub url: String,

    /// HTTP method of the stored request (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Only look in this store. Omit to search every store, oldest first.
    #[serde(default)]
    pub store: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub store: String,
    pub method: String,
    pub url: String,
    pub stored_at: String,
    pub response: ResponseView,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheDb, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }

    let entry = cache
        .match_entry(params.store.as_deref(), &params.method.to_ascii_uppercase(), params.url.trim())
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{} {}", params.method, params.url)))?;

    let output = CacheGetOutput {
        response: ResponseView::from(&entry.response),
        store: entry.store,
        method: entry.method,
        url: entry.url,
        stored_at: entry.stored_at,
    };

    Ok(json_result(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_worker, output};

    fn params(url: &str) -> CacheGetParams {
        CacheGetParams { url: url.into(), method: default_method(), store: None }
    }

    #[tokio::test]
    async fn test_get_impl_missing() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let err = get_impl(&cache, params("https://app.example.com/nothing")).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let worker = active_worker().await;
        let out: CacheGetOutput =
            output(&get_impl(worker.db(), params("https://app.example.com/index.html")).await.unwrap());

        assert_eq!(out.store, "notes-v2");
        assert_eq!(out.method, "GET");
        assert_eq!(out.response.status, 200);
        assert_eq!(out.response.body, "<html>notes</html>");
    }

    #[tokio::test]
    async fn test_get_impl_scoped_to_other_store() {
        let worker = active_worker().await;
        worker.db().open_store("notes-v1").await.unwrap();

        let request = CacheGetParams { store: Some("notes-v1".into()), ..params("https://app.example.com/") };
        assert!(get_impl(worker.db(), request).await.is_err());
    }
}
