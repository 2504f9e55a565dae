//! The fixed list of resources pre-cached at install time.

use crate::Error;
use crate::location;

/// Ordered list of URLs, absolute or root-relative, as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceManifest {
    entries: Vec<String>,
}

impl ResourceManifest {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Entries resolved to absolute URLs, in manifest order.
    pub fn resolve_all(&self, origin: &str) -> Result<Vec<String>, Error> {
        self.entries.iter().map(|entry| location::resolve(origin, entry)).collect()
    }

    /// Whether `request_url` counts as a listed resource for runtime caching.
    ///
    /// An entry matches when it equals the URL, or when the URL contains the
    /// entry after `cdn_prefix` has been removed from it. An entry that is
    /// exactly the CDN prefix strips to the empty string, which every URL
    /// contains.
    pub fn lists(&self, request_url: &str, cdn_prefix: Option<&str>) -> bool {
        self.entries.iter().any(|entry| {
            let stripped = match cdn_prefix {
                Some(prefix) if !prefix.is_empty() => entry.replacen(prefix, "", 1),
                _ => entry.clone(),
            };
            request_url.contains(stripped.as_str()) || request_url == entry
        })
    }
}
