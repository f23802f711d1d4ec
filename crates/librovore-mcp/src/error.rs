//! MCP-facing error shapes.
//!
//! Spec §7: "in the tool server, each category maps to a JSON error object
//! with `error_type`, `message`, `details`, `suggestion`." Tool failures are
//! therefore reported as structured *tool results* (`CallToolResult::error`)
//! rather than protocol-level JSON-RPC errors, so a client sees the same
//! taxonomy it would from the CLI.

use librovore_core::Error as CoreError;
use serde_json::{Value, json};

/// Errors internal to this crate: wraps [`CoreError`] plus transport/startup
/// failures that have no core-error counterpart.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// An error surfaced by librovore-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The MCP transport (stdio framing, SSE listener) failed.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result alias for this crate.
pub type McpResult<T> = Result<T, McpError>;

/// Renders an error as the JSON object shape spec §7 documents for the tool
/// server: `{ error_type, message, details, suggestion }`.
#[must_use]
pub fn to_tool_error_json(err: &McpError) -> Value {
    match err {
        McpError::Core(core) => json!({
            "error_type": core.category(),
            "message": core.to_string(),
            "details": {},
            "suggestion": core.suggestion(),
        }),
        McpError::Transport(message) => json!({
            "error_type": "Transport",
            "message": message,
            "details": {},
            "suggestion": "check the MCP client's stdio/SSE transport configuration",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_renders_structured_fields() {
        let err = McpError::Core(CoreError::ProcessorInavailability {
            subject: "src".into(),
        });
        let value = to_tool_error_json(&err);
        assert_eq!(value["error_type"], "ProcessorInavailability");
        assert!(value["suggestion"].is_string());
    }
}
