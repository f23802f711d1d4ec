//! The five MCP tools (spec §6), one module each. Each tool's parameter
//! struct derives [`schemars::JsonSchema`] for the server's tool listing and
//! [`serde::Deserialize`] to parse the JSON-RPC `arguments` object.

/// `detect` tool.
pub mod detect;
/// `query-content` tool.
pub mod query_content;
/// `query-inventory` tool.
pub mod query_inventory;
/// `summarize-inventory` tool.
pub mod summarize_inventory;
/// `survey-processors` tool.
pub mod survey_processors;

use librovore_core::Error as CoreError;
use librovore_core::types::{InventoryFilters, MatchMode, SearchBehaviors};
use serde::Deserialize;
use serde_json::Value;

use crate::error::McpError;

/// Shared name-matching parameters, flattened into every search-bearing
/// tool's parameter struct.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[serde(default)]
pub struct SearchBehaviorsInput {
    /// How to match `query` against inventory object names.
    pub match_mode: MatchModeInput,
    /// Minimum fuzzy-match ratio (0-100) to keep a candidate.
    pub fuzzy_threshold: u32,
}

impl Default for SearchBehaviorsInput {
    fn default() -> Self {
        let defaults = SearchBehaviors::default();
        Self {
            match_mode: MatchModeInput::from(defaults.match_mode),
            fuzzy_threshold: defaults.fuzzy_threshold,
        }
    }
}

impl From<SearchBehaviorsInput> for SearchBehaviors {
    fn from(value: SearchBehaviorsInput) -> Self {
        Self {
            match_mode: value.match_mode.into(),
            fuzzy_threshold: value.fuzzy_threshold,
        }
    }
}

/// The wire form of [`MatchMode`], so the JSON schema spells out the three
/// accepted strings explicitly rather than relying on the core type's own
/// serde attributes.
#[derive(Debug, Clone, Copy, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchModeInput {
    /// Case-insensitive full-string equality.
    Exact,
    /// Case-insensitive regular expression.
    Regex,
    /// Normalized similarity ratio.
    Fuzzy,
}

impl From<MatchMode> for MatchModeInput {
    fn from(value: MatchMode) -> Self {
        match value {
            MatchMode::Exact => Self::Exact,
            MatchMode::Regex => Self::Regex,
            MatchMode::Fuzzy => Self::Fuzzy,
        }
    }
}

impl From<MatchModeInput> for MatchMode {
    fn from(value: MatchModeInput) -> Self {
        match value {
            MatchModeInput::Exact => Self::Exact,
            MatchModeInput::Regex => Self::Regex,
            MatchModeInput::Fuzzy => Self::Fuzzy,
        }
    }
}

/// Shared equality filters, flattened into every inventory-bearing tool's
/// parameter struct.
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
#[serde(default)]
pub struct FiltersInput {
    /// Restrict to a Sphinx domain (`py`, `std`, ...).
    pub domain: Option<String>,
    /// Restrict to a role/item-type (`function`, `class`, ...).
    pub role: Option<String>,
    /// Restrict to a Sphinx priority (`0`, `1`, `-1`).
    pub priority: Option<String>,
    /// Restrict to names containing this substring (Rustdoc).
    pub name: Option<String>,
}

impl From<FiltersInput> for InventoryFilters {
    fn from(value: FiltersInput) -> Self {
        Self {
            domain: value.domain,
            role: value.role,
            priority: value.priority,
            name: value.name,
        }
    }
}

/// Parses a tool call's `arguments` object into `T`, mapping malformed
/// arguments onto the same `InventoryFilterInvalidity` category the search
/// engine uses for invalid regexes (spec §7's taxonomy has no dedicated
/// "bad arguments" variant; this is the closest caller-facing fit).
pub fn parse_params<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, McpError> {
    serde_json::from_value(arguments).map_err(|err| {
        McpError::Core(CoreError::InventoryFilterInvalidity {
            message: format!("invalid tool arguments: {err}"),
        })
    })
}
