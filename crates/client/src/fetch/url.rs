//! URL canonicalization for outgoing requests.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a request URL before it goes on the wire.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative references against `base` (the app origin)
/// 3. Reject anything but http and https
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(base: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> url::Url {
        url::Url::parse("https://app.example.com").unwrap()
    }

    #[test]
    fn test_canonicalize_absolute() {
        let url = canonicalize(&base(), "https://cdn.example.com/lib.js").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/lib.js");
    }

    #[test]
    fn test_canonicalize_relative_to_origin() {
        let url = canonicalize(&base(), "/app/index.html").unwrap();
        assert_eq!(url.as_str(), "https://app.example.com/app/index.html");
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize(&base(), "https://EXAMPLE.COM").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize(&base(), "https://example.com/docs#section").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/docs");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize(&base(), "/search?b=2&a=1").unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
    }

    #[test]
    fn test_canonicalize_trim_whitespace() {
        let url = canonicalize(&base(), "  https://example.com  ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        for input in ["file:///etc/passwd", "chrome-extension://abc/popup.html", "blob:https://app.example.com/1"] {
            assert!(matches!(canonicalize(&base(), input), Err(UrlError::UnsupportedScheme(_))));
        }
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize(&base(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_canonicalize_http_allowed() {
        let url = canonicalize(&base(), "http://example.com").unwrap();
        assert_eq!(url.scheme(), "http");
    }
}
