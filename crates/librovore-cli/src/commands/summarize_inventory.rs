//! `summarize-inventory` command (spec §6).
//!
//! Its response is already the plain string spec §6 documents, so unlike
//! the other operations there is no JSON/text distinction to render.

use librovore_core::registry::{ProcessorContext, ProcessorRegistry};
use librovore_core::types::{InventoryFilters, SearchBehaviors};

use crate::error::CliError;

/// Runs `summarize_inventory` and returns its plain-text summary verbatim.
pub async fn execute(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    source: &str,
    query: &str,
    processor_name: Option<&str>,
    search_behaviors: &SearchBehaviors,
    filters: &InventoryFilters,
    group_by: Option<&str>,
) -> Result<String, CliError> {
    let summary = librovore_core::orchestration::summarize_inventory(
        registry,
        ctx,
        source,
        query,
        processor_name,
        search_behaviors,
        filters,
        group_by,
    )
    .await?;
    Ok(summary)
}
