//! The two-tier HTTP/file cache (spec §4.1): a probe cache, a content
//! cache, a `robots.txt` cache, and the proxy that ties them together with
//! scheme dispatch and request deduplication.

mod content;
mod dedup;
mod probe;
mod robots;
mod proxy;

pub use content::{ContentCache, ContentValue};
pub use dedup::RequestDedup;
pub use probe::ProbeCache;
pub use robots::{AgentRules, DelayFn, RobotsCache, RobotsTxt, default_delay};
pub use proxy::{CacheProxy, ClientFactory};
