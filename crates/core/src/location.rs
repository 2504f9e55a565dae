//! Resolving manifest and request URLs against the app origin.

use crate::Error;

/// Resolve `input` against `origin`.
///
/// Absolute inputs (any scheme) come back unchanged apart from URL
/// normalization; root-relative inputs are joined onto the origin.
pub fn resolve(origin: &str, input: &str) -> Result<String, Error> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".into()));
    }

    let base = url::Url::parse(origin).map_err(|e| Error::InvalidUrl(format!("{origin}: {e}")))?;
    let resolved = base
        .join(trimmed)
        .map_err(|e| Error::InvalidUrl(format!("{trimmed}: {e}")))?;

    Ok(resolved.to_string())
}

/// Serialized origin of `origin`, without the trailing slash the URL parser
/// adds (`https://app.example.com`).
pub fn origin_prefix(origin: &str) -> Result<String, Error> {
    let parsed = url::Url::parse(origin).map_err(|e| Error::InvalidUrl(format!("{origin}: {e}")))?;
    Ok(parsed.origin().ascii_serialization())
}
