//! `survey-processors` tool (spec §6).

use librovore_core::registry::ProcessorRegistry;
use serde::Deserialize;
use serde_json::Value;

use crate::error::McpResult;

use super::parse_params;

/// Parameters for the `survey-processors` tool.
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct SurveyProcessorsParams {
    /// Restrict the survey to a single named processor.
    #[serde(default)]
    pub name: Option<String>,
}

/// Handles a `survey-processors` tool call.
pub fn handle(registry: &ProcessorRegistry, arguments: Value) -> McpResult<Value> {
    let params: SurveyProcessorsParams = parse_params(arguments)?;
    let response = librovore_core::orchestration::survey_processors(registry, params.name.as_deref())?;
    Ok(serde_json::to_value(response).unwrap_or_default())
}
