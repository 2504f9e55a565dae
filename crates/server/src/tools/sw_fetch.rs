//! sw_fetch tool implementation.
//!
//! Dispatches a fetch event as a page would issue it and reports the
//! response the page would receive, along with where it came from.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::http::{FetchRequest, ResponseType, WorkerResponse};
use swcache_core::worker::{ResponseSource, Served};
use swcache_core::{AppConfig, Network, ServiceWorker, location};

use super::json_result;
use crate::error::ToolError;

/// Parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request, absolute or relative to the app origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Issue the request as a page navigation.
    #[serde(default)]
    pub navigate: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// A response as the page sees it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResponseView {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub response_type: ResponseType,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
}

impl From<&WorkerResponse> for ResponseView {
    fn from(response: &WorkerResponse) -> Self {
        Self {
            url: response.url.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            response_type: response.response_type,
            headers: response.headers.clone(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_bytes: response.body.len(),
        }
    }
}

/// Output from the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub source: ResponseSource,
    /// A background store write was scheduled.
    pub stored: bool,
    pub response: ResponseView,
}

pub async fn fetch_impl<N: Network>(
    worker: &ServiceWorker<N>, config: &AppConfig, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(ToolError::InvalidInput("url cannot be empty".into()).into());
    }
    if params.method.trim().is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = location::resolve(&config.origin, params.url.trim())?;
    let request = if params.navigate { FetchRequest::navigate(url) } else { FetchRequest::get(url) };
    let request = request.with_method(params.method.trim());

    let Served { response, source, stored } = worker.fetch(request).await?;
    tracing::debug!("served {} {} from {:?}", response.status, response.url, source);

    Ok(json_result(&SwFetchOutput { source, stored, response: ResponseView::from(&response) })?)
}
