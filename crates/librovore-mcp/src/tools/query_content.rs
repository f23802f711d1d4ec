//! `query-content` tool (spec §6).

use librovore_core::registry::{ProcessorContext, ProcessorRegistry};
use serde::Deserialize;
use serde_json::Value;

use crate::error::McpResult;

use super::{FiltersInput, SearchBehaviorsInput, parse_params};

/// Parameters for the `query-content` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct QueryContentParams {
    /// The documentation source (URL or local path).
    pub source: String,
    /// The name query.
    pub query: String,
    /// Restrict to a single named processor pair.
    #[serde(default)]
    pub processor_name: Option<String>,
    /// Name-matching behavior.
    #[serde(default)]
    pub search_behaviors: SearchBehaviorsInput,
    /// Equality filters applied before name matching.
    #[serde(default)]
    pub filters: FiltersInput,
    /// Include a truncated content preview per document.
    #[serde(default = "default_true")]
    pub include_snippets: bool,
    /// Maximum number of results to return.
    #[serde(default = "default_results_max")]
    pub results_max: usize,
}

const fn default_true() -> bool {
    true
}

const fn default_results_max() -> usize {
    10
}

/// Handles a `query-content` tool call.
pub async fn handle(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    arguments: Value,
) -> McpResult<Value> {
    let params: QueryContentParams = parse_params(arguments)?;
    let response = librovore_core::orchestration::query_content(
        registry,
        ctx,
        &params.source,
        &params.query,
        params.processor_name.as_deref(),
        &params.search_behaviors.into(),
        &params.filters.into(),
        params.include_snippets,
        params.results_max,
    )
    .await?;
    Ok(serde_json::to_value(response).unwrap_or_default())
}
