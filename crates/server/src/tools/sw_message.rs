//! sw_message tool implementation.
//!
//! Posts arbitrary JSON to the interceptor, optionally with a reply
//! channel, and reports how the message was handled.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::worker::{MessageEvent, MessageOutcome, WorkerReply};
use swcache_core::{Network, ServiceWorker};

use super::json_result;

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message data, e.g. `{"type": "CLEAR_CACHE"}`.
    pub data: serde_json::Value,

    /// Attach a reply channel to the message.
    #[serde(default)]
    pub reply: bool,
}

/// Output from the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    pub outcome: MessageOutcome,
    /// What arrived on the reply channel, if one was attached.
    pub reply: Option<WorkerReply>,
}

pub async fn message_impl<N: Network>(
    worker: &ServiceWorker<N>, params: SwMessageParams,
) -> Result<CallToolResult, McpError> {
    let (outcome, reply) = if params.reply {
        let (message, port) = MessageEvent::with_reply(params.data);
        let outcome = worker.handle_message(message).await?;
        (outcome, port.await.ok())
    } else {
        (worker.handle_message(MessageEvent::new(params.data)).await?, None)
    };

    Ok(json_result(&SwMessageOutput { outcome, reply })?)
}
