//! Request and response values flowing through the interceptor.
//!
//! These mirror what a page hands to the interceptor and what the
//! interceptor hands back, independent of the HTTP client underneath.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// How the request was issued by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Full page load.
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Absolute URL.
    pub url: String,
    /// Upper-cased HTTP method.
    pub method: String,
    pub mode: RequestMode,
}

impl FetchRequest {
    /// A `GET` sub-resource request.
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into(), method: "GET".into(), mode: RequestMode::NoCors }
    }

    /// A `GET` page navigation.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self { url: url.into(), method: "GET".into(), mode: RequestMode::Navigate }
    }

    /// Same request with a different method (upper-cased).
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// Browser-style classification of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response with full access.
    Basic,
    /// Cross-origin response the origin opted into sharing.
    Cors,
    /// Cross-origin response with no access granted.
    Opaque,
    /// Constructed locally rather than received.
    Default,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Cors => "cors",
            Self::Opaque => "opaque",
            Self::Default => "default",
        }
    }

    /// Parse the stored column value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(Self::Basic),
            "cors" => Some(Self::Cors),
            "opaque" => Some(Self::Opaque),
            "default" => Some(Self::Default),
            _ => None,
        }
    }
}

/// A response as seen by the page.
///
/// The body is reference counted, so cloning hands out a second readable
/// copy without duplicating the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResponse {
    /// URL the response was produced for (after redirects).
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub response_type: ResponseType,
    /// Header pairs in received order, names lower-cased.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl WorkerResponse {
    /// Status in the 200-299 range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The response handed to pages when the network is unreachable and no
    /// cached fallback applies.
    pub fn network_error() -> Self {
        Self {
            url: String::new(),
            status: 408,
            status_text: "Request Timeout".into(),
            response_type: ResponseType::Default,
            headers: vec![("content-type".into(), "text/plain".into())],
            body: Bytes::from_static(b"Network error happened"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_constructors() {
        let req = FetchRequest::get("https://example.com/app.js");
        assert_eq!(req.method, "GET");
        assert!(!req.is_navigation());

        let req = FetchRequest::navigate("https://example.com/").with_method("post");
        assert_eq!(req.method, "POST");
        assert!(req.is_navigation());
    }

    #[test]
    fn test_response_type_round_trip() {
        for ty in [ResponseType::Basic, ResponseType::Cors, ResponseType::Opaque, ResponseType::Default] {
            assert_eq!(ResponseType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(ResponseType::parse("error"), None);
    }

    #[test]
    fn test_network_error_response() {
        let resp = WorkerResponse::network_error();
        assert_eq!(resp.status, 408);
        assert!(!resp.ok());
        assert_eq!(resp.header("Content-Type"), Some("text/plain"));
        assert_eq!(&resp.body[..], b"Network error happened");
    }
}
