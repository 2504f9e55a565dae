//! MCP tool implementations.
//!
//! Each tool is a free function over the interceptor so it can be exercised
//! against any [`Network`](swcache_core::Network).

pub mod cache;
pub mod clients;
pub mod sw_fetch;
pub mod sw_install;
pub mod sw_message;
pub mod sw_status;

#[cfg(test)]
pub(crate) mod testing;

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

use crate::error::ToolError;

pub use cache::{CacheDeleteParams, CacheGetParams, CacheKeysParams};
pub use clients::{ClientMessagesParams, ClientRegisterParams};
pub use sw_fetch::SwFetchParams;
pub use sw_install::SwInstallParams;
pub use sw_message::SwMessageParams;
pub use sw_status::SwStatusParams;

/// Render `output` as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, ToolError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::OutputFailed(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
