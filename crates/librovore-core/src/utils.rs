//! Shared timing helper used by the caches' entry timestamps.

/// Current Unix time in fractional seconds, used for cache-entry timestamps.
#[must_use]
pub fn now_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
