//! URL normalization and derivation helpers (spec §3 "URL").
//!
//! Only `http`, `https`, `file`, and the empty scheme (a local filesystem
//! path) are accepted; anything else is refused with a typed error.

use crate::error::{Error, Result};

/// The scheme class a source URL belongs to, as seen by the cache proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlScheme {
    /// `http://...`
    Http,
    /// `https://...`
    Https,
    /// `file://...` or a bare local path.
    File,
}

/// Classifies a source string's scheme, rejecting unsupported ones.
pub fn classify_scheme(source: &str) -> Result<UrlScheme> {
    if let Some(rest) = source.strip_prefix("http://") {
        let _ = rest;
        return Ok(UrlScheme::Http);
    }
    if let Some(rest) = source.strip_prefix("https://") {
        let _ = rest;
        return Ok(UrlScheme::Https);
    }
    if source.starts_with("file://") || !source.contains("://") {
        return Ok(UrlScheme::File);
    }
    Err(Error::InventoryUrlNoSupport {
        source: source.to_string(),
    })
}

/// Derives a "base URL" from any source: strips a trailing slash and, if the
/// path's final segment looks like a file (contains a `.` and doesn't start
/// with one), replaces it with its parent.
///
/// Idempotent under repeated application (spec §8 round-trip property).
#[must_use]
pub fn normalize_base_url(source: &str) -> String {
    let trimmed = source.trim_end_matches('/');
    let last_segment = trimmed.rsplit('/').next().unwrap_or("");
    let looks_like_file = last_segment.contains('.') && !last_segment.starts_with('.');
    if looks_like_file {
        if let Some(idx) = trimmed.rfind('/') {
            return trimmed[..idx].to_string();
        }
        return String::new();
    }
    trimmed.to_string()
}

/// Joins a base URL and a relative path, normalizing the single `/` between
/// them.
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.is_empty() {
        return base_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// `<base>/objects.inv`
#[must_use]
pub fn derive_inventory_url(base_url: &str) -> String {
    join_url(base_url, "objects.inv")
}

/// `<base>/searchindex.json`
#[must_use]
pub fn derive_searchindex_url(base_url: &str) -> String {
    join_url(base_url, "searchindex.json")
}

/// `<base>/all.html`
#[must_use]
pub fn derive_all_html_url(base_url: &str) -> String {
    join_url(base_url, "all.html")
}

/// `<base>/std/all.html`, the fallback location for Rustdoc standard-library docs.
#[must_use]
pub fn derive_std_all_html_url(base_url: &str) -> String {
    join_url(base_url, "std/all.html")
}

/// `<base>/mkdocs.yml`
#[must_use]
pub fn derive_mkdocs_yml_url(base_url: &str) -> String {
    join_url(base_url, "mkdocs.yml")
}

/// `<base>/index.html`, used for best-effort theme sniffing.
#[must_use]
pub fn derive_index_url(base_url: &str) -> String {
    join_url(base_url, "index.html")
}

/// Derives an absolute documentation page URL from an inventory object's
/// `uri` template: substitutes `$` with `name`, splits off a `#fragment`,
/// and joins the remaining path onto `base_url`.
#[must_use]
pub fn derive_documentation_url(base_url: &str, uri: &str, name: &str) -> String {
    let substituted = uri.replace('$', name);
    let (path, fragment) = match substituted.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (substituted.as_str(), None),
    };
    let joined = join_url(base_url, path);
    match fragment {
        Some(fragment) if !fragment.is_empty() => format!("{joined}#{fragment}"),
        _ => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_url_strips_trailing_slash() {
        assert_eq!(normalize_base_url("https://docs.rs/serde/"), "https://docs.rs/serde");
    }

    #[test]
    fn normalize_base_url_strips_file_name() {
        assert_eq!(
            normalize_base_url("https://docs.rs/serde/objects.inv"),
            "https://docs.rs/serde"
        );
    }

    #[test]
    fn normalize_base_url_is_idempotent() {
        let once = normalize_base_url("https://docs.rs/serde/objects.inv");
        let twice = normalize_base_url(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn derive_documentation_url_substitutes_and_splits_fragment() {
        let url = derive_documentation_url("https://docs.rs/serde", "$.html#method.new", "Deserializer");
        assert_eq!(url, "https://docs.rs/serde/Deserializer.html#method.new");
    }

    #[test]
    fn classify_scheme_rejects_unsupported() {
        assert!(classify_scheme("ftp://example.com").is_err());
        assert!(matches!(classify_scheme("https://x").unwrap(), UrlScheme::Https));
        assert!(matches!(classify_scheme("/local/path").unwrap(), UrlScheme::File));
    }
}
