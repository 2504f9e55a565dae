//! client_register and client_messages tool implementations.
//!
//! Pages register with the interceptor to be claimed on activation and to
//! receive what it posts to them.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::worker::{ClientId, ClientMessage};
use swcache_core::{AppConfig, Network, ServiceWorker, location};

use super::json_result;
use crate::error::ToolError;

/// Parameters for the client_register tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientRegisterParams {
    /// URL of the open page, absolute or relative to the app origin.
    pub url: String,
}

/// Output from the client_register tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientRegisterOutput {
    pub client: ClientId,
    pub url: String,
}

/// Parameters for the client_messages tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientMessagesParams {
    /// Id returned by client_register.
    pub client: u64,
}

/// Output from the client_messages tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientMessagesOutput {
    pub client: ClientId,
    /// Messages queued since the last drain, oldest first.
    pub messages: Vec<ClientMessage>,
}

pub async fn register_impl<N: Network>(
    worker: &ServiceWorker<N>, config: &AppConfig, params: ClientRegisterParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }
    let url = location::resolve(&config.origin, params.url.trim())?;
    let client = worker.clients().register(url.clone()).await;
    tracing::info!("page {} registered at {}", client, url);

    Ok(json_result(&ClientRegisterOutput { client, url })?)
}

pub async fn messages_impl<N: Network>(
    worker: &ServiceWorker<N>, params: ClientMessagesParams,
) -> Result<CallToolResult, McpError> {
    let client = ClientId(params.client);
    let messages = worker.clients().drain(client).await?;

    Ok(json_result(&ClientMessagesOutput { client, messages })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::sw_install::{SwInstallParams, install_impl};
    use crate::tools::testing::{config, fresh_worker, output};

    #[tokio::test]
    async fn test_registered_page_hears_activation() {
        let worker = fresh_worker().await;
        let params = ClientRegisterParams { url: "/".into() };
        let registered: ClientRegisterOutput = output(&register_impl(&worker, &config(), params).await.unwrap());
        assert_eq!(registered.url, "https://app.example.com/");

        install_impl(&worker, &config(), SwInstallParams::default()).await.unwrap();

        let params = ClientMessagesParams { client: registered.client.0 };
        let out: ClientMessagesOutput = output(&messages_impl(&worker, params.clone()).await.unwrap());
        assert_eq!(out.messages, vec![ClientMessage::SwActivated { cache_name: "notes-v2".into() }]);

        let out: ClientMessagesOutput = output(&messages_impl(&worker, params).await.unwrap());
        assert!(out.messages.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_client() {
        let worker = fresh_worker().await;
        let err = messages_impl(&worker, ClientMessagesParams { client: 99 }).await.unwrap_err();
        assert_eq!(err.code.0, -32010);
    }
}
