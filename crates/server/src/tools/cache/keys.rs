//! cache_keys tool implementation.
//!
//! Lists stores with their entry counts, or the request keys of one store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::{CacheDb, Error};

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Store to list keys for. Omit to summarize every store.
    #[serde(default)]
    pub store: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub stores: Vec<StoreSummary>,
    /// Keys of the requested store; empty when no store was named.
    pub keys: Vec<CacheKey>,
}

pub async fn keys_impl(cache: &CacheDb, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let output = match params.store {
        Some(name) => {
            if !cache.has_store(&name).await? {
                return Err(Error::CacheMiss(format!("no store named {name}")).into());
            }
            let keys = cache
                .store_keys(&name)
                .await?
                .into_iter()
                .map(|(method, url)| CacheKey { method, url })
                .collect::<Vec<_>>();
            let entries = keys.len() as u64;
            CacheKeysOutput { stores: vec![StoreSummary { name, entries }], keys }
        }
        None => {
            let mut stores = Vec::new();
            for name in cache.store_names().await? {
                let entries = cache.entry_count(&name).await?;
                stores.push(StoreSummary { name, entries });
            }
            CacheKeysOutput { stores, keys: Vec::new() }
        }
    };

    Ok(json_result(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_worker, output};

    #[tokio::test]
    async fn test_keys_summary_and_listing() {
        let worker = active_worker().await;
        worker.db().open_store("notes-v1").await.unwrap();

        let out: CacheKeysOutput = output(&keys_impl(worker.db(), CacheKeysParams::default()).await.unwrap());
        let counts: Vec<_> = out.stores.iter().map(|s| (s.name.as_str(), s.entries)).collect();
        assert_eq!(counts, vec![("notes-v2", 2), ("notes-v1", 0)]);

        let params = CacheKeysParams { store: Some("notes-v2".into()) };
        let out: CacheKeysOutput = output(&keys_impl(worker.db(), params).await.unwrap());
        let mut urls: Vec<_> = out.keys.iter().map(|k| k.url.as_str()).collect();
        urls.sort();
        assert_eq!(urls, vec!["https://app.example.com/", "https://app.example.com/index.html"]);
    }

    #[tokio::test]
    async fn test_keys_unknown_store() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let params = CacheKeysParams { store: Some("nope".into()) };
        let err = keys_impl(&cache, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }
}
