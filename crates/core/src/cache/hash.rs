//! Request identity keys for cache entries.

use sha2::{Digest, Sha256};

/// Compute the entry key for a request: method plus URL, fragment excluded.
///
/// The method is compared case-insensitively, so `get` and `GET` share a key.
pub fn request_key(method: &str, url: &str) -> String {
    let url = url.split_once('#').map_or(url, |(before, _)| before);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = request_key("GET", "https://example.com/index.html");
        let key2 = request_key("GET", "https://example.com/index.html");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_method_matters() {
        assert_ne!(request_key("GET", "https://example.com/"), request_key("HEAD", "https://example.com/"));
        assert_eq!(request_key("get", "https://example.com/"), request_key("GET", "https://example.com/"));
    }

    #[test]
    fn test_key_ignores_fragment() {
        assert_eq!(
            request_key("GET", "https://example.com/page#section"),
            request_key("GET", "https://example.com/page")
        );
        assert_ne!(request_key("GET", "https://example.com/page?a=1"), request_key("GET", "https://example.com/page"));
    }

    #[test]
    fn test_key_format() {
        let key = request_key("GET", "https://example.com");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
