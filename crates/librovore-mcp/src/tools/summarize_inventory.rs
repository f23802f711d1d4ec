//! `summarize-inventory` tool (spec §6).

use librovore_core::registry::{ProcessorContext, ProcessorRegistry};
use serde::Deserialize;
use serde_json::Value;

use crate::error::McpResult;

use super::{FiltersInput, SearchBehaviorsInput, parse_params};

/// Parameters for the `summarize-inventory` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SummarizeInventoryParams {
    /// The documentation source (URL or local path).
    pub source: String,
    /// The name query; empty summarizes the whole inventory.
    #[serde(default)]
    pub query: String,
    /// Restrict to a single named inventory processor.
    #[serde(default)]
    pub processor_name: Option<String>,
    /// Name-matching behavior.
    #[serde(default)]
    pub search_behaviors: SearchBehaviorsInput,
    /// Equality filters applied before name matching.
    #[serde(default)]
    pub filters: FiltersInput,
    /// Field to group the summary by (`domain`, `role`, ...).
    #[serde(default)]
    pub group_by: Option<String>,
}

/// Handles a `summarize-inventory` tool call. Unlike the other tools, the
/// result is a plain human-readable string (spec §6), returned here as a
/// JSON string value rather than an object.
pub async fn handle(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    arguments: Value,
) -> McpResult<Value> {
    let params: SummarizeInventoryParams = parse_params(arguments)?;
    let summary = librovore_core::orchestration::summarize_inventory(
        registry,
        ctx,
        &params.source,
        &params.query,
        params.processor_name.as_deref(),
        &params.search_behaviors.into(),
        &params.filters.into(),
        params.group_by.as_deref(),
    )
    .await?;
    Ok(Value::String(summary))
}
