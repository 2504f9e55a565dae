//! sw_install tool implementation.
//!
//! Installs the configured version, optionally under a new version tag, the
//! way a redeploy would. Activation follows when the version skips waiting
//! or nothing is active yet.

use std::sync::Arc;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::worker::{InstallReport, RegistrationStatus};
use swcache_core::{AppConfig, Network, ServiceWorker, WorkerScript};

use super::json_result;
use crate::error::ToolError;

/// Parameters for the sw_install tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallParams {
    /// Version tag to install instead of the configured one.
    #[serde(default)]
    pub cache_version: Option<String>,

    /// Override whether the new version skips the waiting phase.
    #[serde(default)]
    pub skip_waiting: Option<bool>,
}

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallOutput {
    pub report: InstallReport,
    pub registration: RegistrationStatus,
}

pub async fn install_impl<N: Network>(
    worker: &ServiceWorker<N>, config: &AppConfig, params: SwInstallParams,
) -> Result<CallToolResult, McpError> {
    let mut config = config.clone();
    if let Some(tag) = params.cache_version {
        config.cache_version = tag;
    }
    if let Some(skip) = params.skip_waiting {
        config.skip_waiting = skip;
    }
    config.validate().map_err(|e| ToolError::InvalidInput(e.to_string()))?;

    let script = WorkerScript::current(Arc::new(config))?;
    let report = worker.install(Arc::new(script)).await?;
    let registration = worker.status().await?.registration;

    Ok(json_result(&SwInstallOutput { report, registration })?)
}
