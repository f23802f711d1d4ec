//! Pretty-printed JSON rendering of any response shape (spec §6 "canonical
//! JSON").

use serde::Serialize;

/// Renders `value` as pretty-printed JSON, falling back to a minimal error
/// object if serialization itself fails (which should not happen for the
/// response types this crate emits).
#[must_use]
pub fn render<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|err| format!("{{\"error\": \"serialization failed: {err}\"}}"))
}
