//! `query-content` command (spec §6).

use librovore_core::registry::{ProcessorContext, ProcessorRegistry};
use librovore_core::types::{InventoryFilters, SearchBehaviors};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output::{json, text};

/// Runs `query_content` and renders the response per `format`.
#[allow(clippy::too_many_arguments)]
pub async fn execute(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    source: &str,
    query: &str,
    processor_name: Option<&str>,
    search_behaviors: &SearchBehaviors,
    filters: &InventoryFilters,
    include_snippets: bool,
    results_max: usize,
    format: OutputFormat,
) -> Result<String, CliError> {
    let response = librovore_core::orchestration::query_content(
        registry,
        ctx,
        source,
        query,
        processor_name,
        search_behaviors,
        filters,
        include_snippets,
        results_max,
    )
    .await?;
    Ok(match format {
        OutputFormat::Json => json::render(&response),
        OutputFormat::Text => text::query_content(&response),
    })
}
