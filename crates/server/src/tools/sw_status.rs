//! sw_status tool implementation.
//!
//! Reports the registration slots, the store names on disk and, unless
//! asked not to, the registered pages.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::worker::{ClientInfo, RegistrationStatus};
use swcache_core::{Network, ServiceWorker};

use super::json_result;

/// Parameters for the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusParams {
    /// Include registered pages in the output (default: true).
    #[serde(default = "default_true")]
    pub include_clients: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SwStatusParams {
    fn default() -> Self {
        Self { include_clients: true }
    }
}

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusOutput {
    pub scope: String,
    /// Store the active version reads and writes.
    pub current_cache: Option<String>,
    pub registration: RegistrationStatus,
    /// Every store present, in creation order.
    pub stores: Vec<String>,
    pub clients: Vec<ClientInfo>,
}

pub async fn status_impl<N: Network>(
    worker: &ServiceWorker<N>, params: SwStatusParams,
) -> Result<CallToolResult, McpError> {
    let status = worker.status().await?;
    let clients = if params.include_clients { worker.clients().list().await } else { Vec::new() };

    let output = SwStatusOutput {
        scope: worker.scope().to_string(),
        current_cache: status.registration.active.as_ref().map(|v| v.cache_name.clone()),
        registration: status.registration,
        stores: status.stores,
        clients,
    };

    Ok(json_result(&output)?)
}
