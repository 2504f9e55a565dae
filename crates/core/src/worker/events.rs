//! Events the interceptor handles and what handling them produced.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::WorkerScript;
use super::lifecycle::RegistrationStatus;
use super::routing::BypassReason;
use crate::Error;
use crate::http::{FetchRequest, WorkerResponse};

/// Every event kind the runtime dispatches.
#[derive(Debug)]
pub enum WorkerEvent {
    /// Install a new version.
    Install(Arc<WorkerScript>),
    /// Activate the waiting version.
    Activate,
    Fetch(FetchRequest),
    Message(MessageEvent),
}

/// Commands pages may post, recognized by their `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerCommand {
    ClearCache,
    SkipWaiting,
}

impl WorkerCommand {
    /// Recognize a command in arbitrary message data; anything else is None.
    pub fn parse(data: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(data.clone()).ok()
    }
}

/// Replies sent back over a message's reply channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerReply {
    CacheCleared,
}

/// A posted message and the optional channel to answer on.
#[derive(Debug)]
pub struct MessageEvent {
    pub data: serde_json::Value,
    pub reply_to: Option<oneshot::Sender<WorkerReply>>,
}

impl MessageEvent {
    pub fn new(data: serde_json::Value) -> Self {
        Self { data, reply_to: None }
    }

    /// Attach a reply channel, returning the receiving end.
    pub fn with_reply(data: serde_json::Value) -> (Self, oneshot::Receiver<WorkerReply>) {
        let (tx, rx) = oneshot::channel();
        (Self { data, reply_to: Some(tx) }, rx)
    }
}

/// Where a response handed to the page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    /// The cached entry page, served to a navigation that failed.
    OfflineFallback,
    /// The locally built network error response.
    NetworkError,
    /// Fetched by the host without interception.
    Passthrough,
}

/// Result of the fetch handler.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The handler declined to respond.
    Passthrough(BypassReason),
    Responded { response: WorkerResponse, source: ResponseSource, stored: bool },
    /// The network answered but the response was refused, e.g. over the
    /// byte limit. Only unreachable networks get the offline fallback.
    Failed(Error),
}

/// A response as finally delivered to the page.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: WorkerResponse,
    pub source: ResponseSource,
    /// A store write was scheduled for this response.
    pub stored: bool,
}

/// Result of installing a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InstallReport {
    pub cache_name: String,
    pub precached: usize,
    /// The version went on to activate.
    pub activated: Option<ActivationReport>,
}

/// Result of activating a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivationReport {
    pub cache_name: String,
    /// Stores removed because their name was not the current one.
    pub deleted_stores: Vec<String>,
    pub claimed_clients: usize,
    pub notified_clients: usize,
}

/// Result of a posted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "handled", rename_all = "snake_case")]
pub enum MessageOutcome {
    CacheCleared { deleted_stores: Vec<String>, replied: bool },
    SkipWaiting { activated: Option<ActivationReport> },
    Ignored,
}

/// Result of dispatching any event.
#[derive(Debug)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(Option<ActivationReport>),
    Fetch(FetchOutcome),
    Message(MessageOutcome),
}

/// Registration state plus store names, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatus {
    pub registration: RegistrationStatus,
    pub stores: Vec<String>,
}
