//! `survey-processors` command (spec §6).

use librovore_core::registry::ProcessorRegistry;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output::{json, text};

/// Runs `survey_processors` and renders the response per `format`.
pub fn execute(
    registry: &ProcessorRegistry,
    name: Option<&str>,
    format: OutputFormat,
) -> Result<String, CliError> {
    let response = librovore_core::orchestration::survey_processors(registry, name)?;
    Ok(match format {
        OutputFormat::Json => json::render(&response),
        OutputFormat::Text => text::survey_processors(&response),
    })
}
