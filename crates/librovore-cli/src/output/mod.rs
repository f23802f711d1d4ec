//! Response rendering: JSON for machine consumption, text for humans.
//!
//! Each command picks one of [`json::render`] or a `text::*` function
//! depending on [`crate::cli::OutputFormat`]; `summarize_inventory`'s
//! response is already the plain string spec §6 documents, so it bypasses
//! both and is printed directly.

/// JSON rendering: pretty-printed, matching spec §6's canonical shapes.
pub mod json;
/// Human-readable text rendering for each operation's response.
pub mod text;
