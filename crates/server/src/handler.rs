//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the interceptor.
use std::sync::Arc;

use crate::tools::{
    CacheDeleteParams, CacheGetParams, CacheKeysParams, ClientMessagesParams, ClientRegisterParams, SwFetchParams,
    SwInstallParams, SwMessageParams, SwStatusParams, cache, clients, sw_fetch, sw_install, sw_message, sw_status,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use swcache_client::FetchClient;
use swcache_core::{AppConfig, ServiceWorker};

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    tool_router: ToolRouter<Self>,
    worker: Arc<ServiceWorker<FetchClient>>,
    config: Arc<AppConfig>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler around a running interceptor.
    pub fn new(worker: Arc<ServiceWorker<FetchClient>>, config: Arc<AppConfig>) -> Self {
        Self { tool_router: Self::tool_router(), worker, config }
    }

    #[tool(description = "Install the configured version (optionally under a new version tag) by pre-caching its manifest. Activates it when it skips waiting or nothing is active.")]
    async fn sw_install(&self, params: Parameters<SwInstallParams>) -> Result<CallToolResult, McpError> {
        sw_install::install_impl(self.worker.as_ref(), &self.config, params.0).await
    }

    #[tool(description = "Report the installing, waiting and active versions, the current cache name, every cache store, and registered pages.")]
    async fn sw_status(&self, params: Parameters<SwStatusParams>) -> Result<CallToolResult, McpError> {
        sw_status::status_impl(self.worker.as_ref(), params.0).await
    }

    /// Dispatch a fetch event.
    ///
    /// Cache-first for intercepted GETs; network failures fall back to the
    /// cached entry page for navigations or a 408 otherwise.
    #[tool(description = "Fetch a URL through the offline cache. Returns the response the page would see and whether it came from cache, network, or an offline fallback.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        sw_fetch::fetch_impl(self.worker.as_ref(), &self.config, params.0).await
    }

    #[tool(description = "Post a message to the worker. Recognized: {\"type\":\"CLEAR_CACHE\"} and {\"type\":\"SKIP_WAITING\"}. Set reply to receive a reply.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        sw_message::message_impl(self.worker.as_ref(), params.0).await
    }

    #[tool(description = "Register an open page so it is claimed on activation and receives worker messages.")]
    async fn client_register(&self, params: Parameters<ClientRegisterParams>) -> Result<CallToolResult, McpError> {
        clients::register_impl(self.worker.as_ref(), &self.config, params.0).await
    }

    #[tool(description = "Take the messages the worker has posted to a registered page since the last call.")]
    async fn client_messages(&self, params: Parameters<ClientMessagesParams>) -> Result<CallToolResult, McpError> {
        clients::messages_impl(self.worker.as_ref(), params.0).await
    }

    #[tool(description = "List cache stores with entry counts, or the request keys of one store.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        cache::keys_impl(self.worker.db(), params.0).await
    }

    #[tool(description = "Look up a stored response by URL and method, in one store or across all of them.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        cache::get_impl(self.worker.db(), params.0).await
    }

    #[tool(description = "Delete a cache store by name.")]
    async fn cache_delete(&self, params: Parameters<CacheDeleteParams>) -> Result<CallToolResult, McpError> {
        cache::delete_impl(self.worker.db(), params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
