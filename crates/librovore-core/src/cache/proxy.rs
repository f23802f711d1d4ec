//! The cache proxy: scheme dispatch, the robots.txt gate, and the three
//! caches tied together behind `probe`/`retrieve`/`retrieve_as_text`
//! (spec §4.1).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::error::{Error, Result};

use super::content::{ContentCache, ContentValue};
use super::probe::ProbeCache;
use super::robots::{RobotsCache, default_delay};

/// A textual mimetype whitelist beyond the `text/*` prefix (spec §4.1
/// `retrieve_as_text`).
const TEXTUAL_MIMETYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "application/yaml",
    "image/svg+xml",
];

/// A zero-argument callable producing an HTTP client, so tests can
/// substitute a deterministic mock transport (spec §9 "Per-call client
/// factory").
pub type ClientFactory = Arc<dyn Fn() -> reqwest::Client + Send + Sync>;

fn default_client_factory() -> ClientFactory {
    Arc::new(|| reqwest::Client::new())
}

/// Ties the probe, content, and robots caches together with scheme
/// dispatch (`http`/`https`/`file`/empty) and the `robots.txt` gate.
pub struct CacheProxy {
    probe: ProbeCache,
    content: ContentCache,
    robots: RobotsCache,
    client_factory: ClientFactory,
    user_agent: String,
    probe_duration_max: Duration,
    retrieve_duration_max: Duration,
    robots_duration_max: Duration,
}

impl CacheProxy {
    /// Constructs a cache proxy from `config`, using the real network
    /// transport and `tokio::time::sleep` for crawl-delay waits.
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_client_factory(config, default_client_factory())
    }

    /// Constructs a cache proxy with an injected client factory, for tests.
    #[must_use]
    pub fn with_client_factory(config: &CacheConfig, client_factory: ClientFactory) -> Self {
        Self {
            probe: ProbeCache::new(
                config.probe_entries_max,
                config.success_ttl_seconds,
                config.error_ttl_seconds,
            ),
            content: ContentCache::new(
                config.content_memory_max,
                config.success_ttl_seconds,
                config.error_ttl_seconds,
            ),
            robots: RobotsCache::new(
                config.robots_ttl_seconds,
                config.robots_error_ttl_seconds,
                default_delay(),
            ),
            client_factory,
            user_agent: config.user_agent.clone(),
            probe_duration_max: Duration::from_secs_f64(config.probe_duration_max_seconds),
            retrieve_duration_max: Duration::from_secs_f64(config.retrieve_duration_max_seconds),
            robots_duration_max: Duration::from_secs_f64(config.robots_duration_max_seconds),
        }
    }

    /// Does the resource at `url` exist? Never raises; network and parse
    /// failures surface as `false` via the cached `Err` branch (spec §4.1).
    pub async fn probe(&self, url: &str) -> Result<bool> {
        match crate::url::classify_scheme(url)? {
            crate::url::UrlScheme::File => Ok(local_path_of(url).exists()),
            crate::url::UrlScheme::Http | crate::url::UrlScheme::Https => {
                if let Err(err) = self.gate_robots(url).await {
                    return Err(err);
                }
                let outcome = self
                    .probe
                    .get_or_fetch(url, || self.probe_http(url))
                    .await;
                Ok(outcome.unwrap_or(false))
            },
        }
    }

    /// Fetches the body at `url`. Raises on failure, so callers can
    /// distinguish missing documents from empty ones (spec §4.1).
    pub async fn retrieve(&self, url: &str) -> Result<Vec<u8>> {
        Ok(self.retrieve_value(url).await?.bytes)
    }

    /// Fetches the body at `url` and decodes it as text, validating the
    /// response mimetype is textual and extracting the charset from
    /// `Content-Type` (spec §4.1).
    pub async fn retrieve_as_text(&self, url: &str, charset_default: &str) -> Result<String> {
        let value = self.retrieve_value(url).await?;
        let content_type = value
            .headers
            .get("content-type")
            .cloned()
            .unwrap_or_default();
        let (mimetype, charset) = parse_content_type(&content_type, charset_default);
        if !is_textual(&mimetype) {
            return Err(Error::HttpContentTypeInvalidity {
                url: url.to_string(),
                mimetype,
                context: "retrieve_as_text".to_string(),
            });
        }
        decode_text(&value.bytes, &charset, url)
    }

    async fn retrieve_value(&self, url: &str) -> Result<ContentValue> {
        match crate::url::classify_scheme(url)? {
            crate::url::UrlScheme::File => self.retrieve_file(url).await,
            crate::url::UrlScheme::Http | crate::url::UrlScheme::Https => {
                self.gate_robots(url).await?;
                self.content
                    .get_or_fetch(url, || self.retrieve_http(url))
                    .await
                    .map_err(|cause| Error::DocumentationInaccessibility {
                        url: url.to_string(),
                        cause,
                    })
            },
        }
    }

    async fn retrieve_file(&self, url: &str) -> Result<ContentValue> {
        let path = local_path_of(url);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| Error::DocumentationInaccessibility {
                url: url.to_string(),
                cause: err.to_string(),
            })?;
        Ok(ContentValue {
            bytes,
            headers: HashMap::new(),
        })
    }

    async fn probe_http(&self, url: &str) -> Result<bool, String> {
        let client = (self.client_factory)();
        let request = client
            .head(url)
            .header("User-Agent", &self.user_agent)
            .timeout(self.probe_duration_max);
        match request.send().await {
            Ok(response) => Ok(response.status().is_success() || response.status().is_redirection()),
            Err(err) => Err(err.to_string()),
        }
    }

    async fn retrieve_http(&self, url: &str) -> Result<ContentValue, String> {
        let client = (self.client_factory)();
        let request = client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .timeout(self.retrieve_duration_max);
        let response = request.send().await.map_err(|err| err.to_string())?;
        let response = response.error_for_status().map_err(|err| err.to_string())?;
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(name.as_str().to_lowercase(), value_str.to_string());
            }
        }
        let bytes = response.bytes().await.map_err(|err| err.to_string())?;
        Ok(ContentValue {
            bytes: bytes.to_vec(),
            headers,
        })
    }

    async fn gate_robots(&self, url: &str) -> Result<()> {
        let parsed = url::Url::parse(url).map_err(|_| Error::InventoryUrlInvalidity {
            source: url.to_string(),
        })?;
        let domain = domain_key(&parsed);
        let path = if parsed.path().is_empty() {
            "/".to_string()
        } else {
            parsed.path().to_string()
        };
        let user_agent = self.user_agent.clone();
        let robots_url = format!("{domain}/robots.txt");
        let client_factory = self.client_factory.clone();
        let duration_max = self.robots_duration_max;
        self.robots
            .gate(&domain, &path, &user_agent, move || {
                let client_factory = client_factory.clone();
                let user_agent = user_agent.clone();
                async move {
                    let client = (client_factory)();
                    let response = client
                        .get(&robots_url)
                        .header("User-Agent", &user_agent)
                        .timeout(duration_max)
                        .send()
                        .await
                        .map_err(|err| Error::DocumentationInaccessibility {
                            url: robots_url.clone(),
                            cause: err.to_string(),
                        })?;
                    if !response.status().is_success() {
                        return Err(Error::DocumentationInaccessibility {
                            url: robots_url.clone(),
                            cause: format!("status {}", response.status()),
                        });
                    }
                    response
                        .text()
                        .await
                        .map_err(|err| Error::DocumentationInaccessibility {
                            url: robots_url.clone(),
                            cause: err.to_string(),
                        })
                }
            })
            .await
    }
}

fn domain_key(url: &url::Url) -> String {
    let scheme = url.scheme();
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    }
}

fn local_path_of(url: &str) -> std::path::PathBuf {
    Path::new(url.strip_prefix("file://").unwrap_or(url)).to_path_buf()
}

fn parse_content_type(content_type: &str, charset_default: &str) -> (String, String) {
    let mut parts = content_type.split(';');
    let mimetype = parts
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    let mimetype = if mimetype.is_empty() {
        "text/plain".to_string()
    } else {
        mimetype
    };
    let charset = parts
        .find_map(|part| {
            let part = part.trim();
            part.strip_prefix("charset=")
                .map(|c| c.trim_matches('"').to_string())
        })
        .unwrap_or_else(|| charset_default.to_string());
    (mimetype, charset)
}

fn is_textual(mimetype: &str) -> bool {
    mimetype.starts_with("text/") || TEXTUAL_MIMETYPES.contains(&mimetype)
}

fn decode_text(bytes: &[u8], charset: &str, url: &str) -> Result<String> {
    let _ = url;
    // Decode with the Content-Type-declared charset; an unrecognized label
    // falls back to lossy UTF-8 rather than raising, since the inventory and
    // structure processors all expect textual content, not a byte-exact copy.
    let encoding = encoding_rs::Encoding::for_label(charset.as_bytes())
        .unwrap_or(encoding_rs::UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CacheConfig {
        CacheConfig::default()
    }

    #[tokio::test]
    async fn file_probe_reflects_filesystem() {
        let proxy = CacheProxy::new(&config());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objects.inv");
        std::fs::write(&path, b"x").unwrap();
        assert!(proxy.probe(path.to_str().unwrap()).await.unwrap());
        assert!(!proxy.probe(dir.path().join("missing").to_str().unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn file_retrieve_reads_bytes() {
        let proxy = CacheProxy::new(&config());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, b"hello").unwrap();
        let bytes = proxy.retrieve(path.to_str().unwrap()).await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn unsupported_scheme_fails_retrieve() {
        let proxy = CacheProxy::new(&config());
        let err = proxy.retrieve("ftp://example.com/x").await.unwrap_err();
        assert_eq!(err.category(), "InventoryUrlNoSupport");
    }

    #[test]
    fn parse_content_type_extracts_charset() {
        let (mime, charset) = parse_content_type("text/html; charset=latin-1", "utf-8");
        assert_eq!(mime, "text/html");
        assert_eq!(charset, "latin-1");
    }

    #[test]
    fn is_textual_accepts_whitelisted_application_types() {
        assert!(is_textual("application/json"));
        assert!(is_textual("image/svg+xml"));
        assert!(!is_textual("image/png"));
    }

    #[test]
    fn decode_text_honors_declared_charset() {
        // "café" in Latin-1/Windows-1252: 'é' is the single byte 0xE9.
        let latin1_bytes = b"caf\xe9";
        let decoded = decode_text(latin1_bytes, "latin-1", "https://x").unwrap();
        assert_eq!(decoded, "café");
    }

    #[test]
    fn decode_text_falls_back_to_lossy_utf8_for_unknown_charset() {
        let decoded = decode_text(b"hello", "not-a-real-charset", "https://x").unwrap();
        assert_eq!(decoded, "hello");
    }
}
