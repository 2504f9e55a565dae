//! Pure routing decisions for intercepted requests.
//!
//! Nothing here touches storage or the network; the runtime in
//! [`super::ServiceWorker`] executes whatever these functions decide.

use crate::http::{FetchRequest, ResponseType, WorkerResponse};
use crate::manifest::ResourceManifest;

/// URL fragments that mark browser-extension requests.
pub const EXTENSION_SCHEMES: &[&str] = &["chrome-extension://", "safari-extension://", "moz-extension://"];

/// Why a request was left to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    BlobUrl,
    NonGetMethod,
    ExtensionScheme,
    /// No version is active, so nothing controls the page.
    NoController,
    /// The active version does not intercept fetches.
    PassthroughVariant,
}

impl BypassReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlobUrl => "blob_url",
            Self::NonGetMethod => "non_get_method",
            Self::ExtensionScheme => "extension_scheme",
            Self::NoController => "no_controller",
            Self::PassthroughVariant => "passthrough_variant",
        }
    }
}

/// What to do with an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchRoute {
    /// Do not respond; the request goes to the network as if never seen.
    Passthrough(BypassReason),
    /// Answer from cache, falling back to the network.
    CacheFirst,
}

/// Route a request for an intercepting version.
pub fn route_fetch(request: &FetchRequest) -> FetchRoute {
    if request.url.contains("blob:") {
        return FetchRoute::Passthrough(BypassReason::BlobUrl);
    }
    if request.method != "GET" {
        return FetchRoute::Passthrough(BypassReason::NonGetMethod);
    }
    if EXTENSION_SCHEMES.iter().any(|scheme| request.url.contains(scheme)) {
        return FetchRoute::Passthrough(BypassReason::ExtensionScheme);
    }
    FetchRoute::CacheFirst
}

/// Why a network response was not written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Status(u16),
    NotBasic(ResponseType),
    /// Neither same-origin nor listed in the manifest.
    Unlisted,
}

/// Whether a fresh network response goes into the current store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreDecision {
    Store,
    Skip(SkipReason),
}

/// Where the values a store decision depends on come from.
#[derive(Debug, Clone, Copy)]
pub struct StorePolicy<'a> {
    /// Serialized app origin, compared as a string prefix.
    pub origin: &'a str,
    pub manifest: &'a ResourceManifest,
    pub cdn_prefix: Option<&'a str>,
}

/// Decide whether `response` to `request` is stored.
pub fn store_decision(request: &FetchRequest, response: &WorkerResponse, policy: StorePolicy<'_>) -> StoreDecision {
    if response.status != 200 {
        return StoreDecision::Skip(SkipReason::Status(response.status));
    }
    if response.response_type != ResponseType::Basic {
        return StoreDecision::Skip(SkipReason::NotBasic(response.response_type));
    }

    let same_origin = request.url.starts_with(policy.origin);
    if same_origin || policy.manifest.lists(&request.url, policy.cdn_prefix) {
        StoreDecision::Store
    } else {
        StoreDecision::Skip(SkipReason::Unlisted)
    }
}

/// Response plan when the live fetch produced no response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPlan {
    /// Serve the cached entry page, or the network error response if absent.
    EntryPage,
    /// Serve the network error response.
    NetworkError,
}

pub fn fallback_plan(request: &FetchRequest) -> FallbackPlan {
    if request.is_navigation() { FallbackPlan::EntryPage } else { FallbackPlan::NetworkError }
}
