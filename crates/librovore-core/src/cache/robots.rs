//! `robots.txt` parsing and the per-domain crawl-delay gate (spec §4.1
//! "robots.txt gate").

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::utils::now_seconds;

use super::dedup::RequestDedup;

/// Rules for a specific user-agent within a `robots.txt` document.
#[derive(Debug, Clone, Default)]
pub struct AgentRules {
    /// Disallowed path prefixes.
    pub disallow: Vec<String>,
    /// Allowed path prefixes (checked first; override disallow).
    pub allow: Vec<String>,
    /// Crawl delay in seconds, for this agent specifically.
    pub crawl_delay: Option<f64>,
}

/// A parsed `robots.txt` document.
#[derive(Debug, Clone, Default)]
pub struct RobotsTxt {
    rules: HashMap<String, AgentRules>,
    default_rules: AgentRules,
    crawl_delay: Option<f64>,
    sitemaps: Vec<String>,
}

impl RobotsTxt {
    /// The empty, fully-permissive parser installed when `robots.txt`
    /// cannot be fetched or parsed.
    #[must_use]
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Parses `robots.txt` content. Unrecognized directives are ignored;
    /// a non-numeric `Crawl-delay` is ignored (spec §1 Non-goals).
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut robots = Self::default();
        let mut current_agents: Vec<String> = Vec::new();
        let mut current_rules = AgentRules::default();

        let flush = |robots: &mut Self, agents: &[String], rules: &AgentRules| {
            for agent in agents {
                if agent == "*" {
                    robots.default_rules = rules.clone();
                } else {
                    robots.rules.insert(agent.clone(), rules.clone());
                }
            }
        };

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    if !current_agents.is_empty() {
                        flush(&mut robots, &current_agents, &current_rules);
                        current_rules = AgentRules::default();
                        current_agents.clear();
                    }
                    current_agents.push(value.to_lowercase());
                },
                "disallow" => {
                    if !value.is_empty() {
                        current_rules.disallow.push(value.to_string());
                    }
                },
                "allow" => {
                    if !value.is_empty() {
                        current_rules.allow.push(value.to_string());
                    }
                },
                "crawl-delay" => {
                    if let Ok(delay) = value.parse::<f64>() {
                        current_rules.crawl_delay = Some(delay);
                        if robots.crawl_delay.is_none() {
                            robots.crawl_delay = Some(delay);
                        }
                    }
                },
                "sitemap" => robots.sitemaps.push(value.to_string()),
                _ => {},
            }
        }
        flush(&mut robots, &current_agents, &current_rules);
        robots
    }

    fn rules_for(&self, user_agent: &str) -> &AgentRules {
        let agent_lower = user_agent.to_lowercase();
        self.rules.get(&agent_lower).map_or_else(
            || {
                self.rules
                    .iter()
                    .find(|(k, _)| agent_lower.contains(k.as_str()))
                    .map_or(&self.default_rules, |(_, v)| v)
            },
            |rules| rules,
        )
    }

    /// `true` iff `user_agent` may request `path`. Allow rules are checked
    /// before disallow rules, so a more specific `Allow` overrides a
    /// blanket `Disallow`.
    #[must_use]
    pub fn is_allowed(&self, user_agent: &str, path: &str) -> bool {
        let rules = self.rules_for(user_agent);
        if rules.allow.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            return true;
        }
        for disallow in &rules.disallow {
            if disallow == "/" || path.starts_with(disallow.as_str()) {
                return false;
            }
        }
        true
    }

    /// The numeric `Crawl-delay` directive applying to `user_agent`, if any.
    #[must_use]
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        self.rules_for(user_agent).crawl_delay.or(self.crawl_delay)
    }
}

/// An injectable async delay function, so tests can substitute a no-op
/// (spec §4.1, §9 "Per-call client factory").
pub type DelayFn = Arc<dyn Fn(Duration) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// The default delay function: `tokio::time::sleep`.
#[must_use]
pub fn default_delay() -> DelayFn {
    Arc::new(|duration| Box::pin(tokio::time::sleep(duration)))
}

struct RobotsEntry {
    robots: Arc<RobotsTxt>,
    timestamp: f64,
    ttl: f64,
    next_allowed_time: Option<f64>,
}

/// Caches parsed `robots.txt` documents per domain (`scheme://host[:port]`)
/// and tracks the earliest next permitted request time derived from
/// `Crawl-delay`.
pub struct RobotsCache {
    entries: Mutex<HashMap<String, RobotsEntry>>,
    dedup: Arc<RequestDedup>,
    success_ttl: f64,
    error_ttl: f64,
    delay: DelayFn,
}

impl RobotsCache {
    /// Constructs a robots cache with the given TTL pair and delay function.
    #[must_use]
    pub fn new(success_ttl: f64, error_ttl: f64, delay: DelayFn) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            dedup: Arc::new(RequestDedup::new()),
            success_ttl,
            error_ttl,
            delay,
        }
    }

    /// Runs the full robots gate for `url`: fetches (or reuses) the
    /// domain's parser, raises [`Error::UrlImpermissibility`] if forbidden,
    /// and sleeps out any outstanding crawl-delay before returning.
    ///
    /// `fetch_robots_txt` is invoked at most once per domain per TTL window
    /// even under concurrent callers.
    pub async fn gate<F, Fut>(
        &self,
        domain: &str,
        path: &str,
        user_agent: &str,
        fetch_robots_txt: F,
    ) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let robots = self.ensure_cached(domain, fetch_robots_txt).await;

        if !robots.is_allowed(user_agent, path) {
            return Err(Error::UrlImpermissibility {
                url: format!("{domain}{path}"),
                user_agent: user_agent.to_string(),
            });
        }

        if let Some(delay) = robots.crawl_delay(user_agent) {
            self.record_crawl_delay(domain, delay).await;
        }

        let remainder = self.remaining_delay(domain).await;
        if remainder > 0.0 {
            (self.delay)(Duration::from_secs_f64(remainder)).await;
        }
        Ok(())
    }

    async fn ensure_cached<F, Fut>(&self, domain: &str, fetch_robots_txt: F) -> Arc<RobotsTxt>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if let Some(robots) = self.fresh_entry(domain).await {
            return robots;
        }
        let guard = self.dedup.acquire(domain).await;
        if let Some(robots) = self.fresh_entry(domain).await {
            drop(guard);
            return robots;
        }
        let (robots, ttl) = match fetch_robots_txt().await {
            Ok(body) => (RobotsTxt::parse(&body), self.success_ttl),
            Err(_) => (RobotsTxt::permissive(), self.error_ttl),
        };
        let robots = Arc::new(robots);
        self.entries.lock().await.insert(
            domain.to_string(),
            RobotsEntry {
                robots: robots.clone(),
                timestamp: now_seconds(),
                ttl,
                next_allowed_time: None,
            },
        );
        drop(guard);
        robots
    }

    async fn fresh_entry(&self, domain: &str) -> Option<Arc<RobotsTxt>> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(domain)?;
        if now_seconds() - entry.timestamp > entry.ttl {
            entries.remove(domain);
            return None;
        }
        Some(entry.robots.clone())
    }

    async fn record_crawl_delay(&self, domain: &str, delay: f64) {
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(domain) {
            if entry.next_allowed_time.is_none() {
                entry.next_allowed_time = Some(now_seconds() + delay);
            }
        }
    }

    async fn remaining_delay(&self, domain: &str) -> f64 {
        let entries = self.entries.lock().await;
        entries
            .get(domain)
            .and_then(|entry| entry.next_allowed_time)
            .map_or(0.0, |next| next - now_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_overrides_disallow() {
        let robots = RobotsTxt::parse("User-agent: *\nDisallow: /private/\nAllow: /private/public/\n");
        assert!(!robots.is_allowed("bot", "/private/secret"));
        assert!(robots.is_allowed("bot", "/private/public/page"));
    }

    #[test]
    fn disallow_all() {
        let robots = RobotsTxt::parse("User-agent: *\nDisallow: /\n");
        assert!(!robots.is_allowed("bot", "/anything"));
    }

    #[test]
    fn permissive_allows_everything() {
        let robots = RobotsTxt::permissive();
        assert!(robots.is_allowed("bot", "/anything"));
        assert!(robots.crawl_delay("bot").is_none());
    }

    #[tokio::test]
    async fn fetch_failure_installs_permissive_sentinel() {
        let cache = RobotsCache::new(3600.0, 300.0, default_delay());
        let result = cache
            .gate("https://example.com", "/x", "librovore", || async {
                Err(Error::DocumentationInaccessibility {
                    url: "https://example.com/robots.txt".into(),
                    cause: "timeout".into(),
                })
            })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn disallowed_path_surfaces_error() {
        let cache = RobotsCache::new(3600.0, 300.0, default_delay());
        let result = cache
            .gate("https://h", "/private/x", "librovore", || async {
                Ok("User-agent: *\nDisallow: /private/\n".to_string())
            })
            .await;
        assert!(matches!(result, Err(Error::UrlImpermissibility { .. })));
    }
}
