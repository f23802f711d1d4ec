//! `detect` command (spec §6).

use librovore_core::registry::{ProcessorContext, ProcessorRegistry};
use librovore_core::types::Detection;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::output::{json, text};

/// Runs `detect`, optionally restricted to `inventory` or `structure`
/// detections only via `genus`.
pub async fn execute(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    source: &str,
    processor_name: Option<&str>,
    genus: Option<&str>,
    format: OutputFormat,
) -> Result<String, CliError> {
    let response = match genus {
        Some("inventory") => detect_inventory_only(registry, ctx, source, processor_name).await,
        Some("structure") => detect_structure_only(registry, ctx, source, processor_name).await,
        _ => librovore_core::orchestration::detect(registry, ctx, source, processor_name).await?,
    };
    Ok(match format {
        OutputFormat::Json => json::render(&response),
        OutputFormat::Text => text::detect(&response),
    })
}

async fn detect_inventory_only(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    source: &str,
    processor_name: Option<&str>,
) -> librovore_core::orchestration::DetectionResponse {
    let start = std::time::Instant::now();
    let mut detections: Vec<Detection> = Vec::new();
    if let Ok((_, detection)) = registry
        .detect_inventory_optimal(ctx, source, processor_name)
        .await
    {
        detections.push(detection);
    }
    let best = detections.first().cloned();
    librovore_core::orchestration::DetectionResponse {
        source: source.to_string(),
        detections,
        detection_best: best,
        time_detection_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

async fn detect_structure_only(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    source: &str,
    processor_name: Option<&str>,
) -> librovore_core::orchestration::DetectionResponse {
    let start = std::time::Instant::now();
    let mut detections: Vec<Detection> = Vec::new();
    if let Ok((_, detection)) = registry
        .detect_structure_optimal(ctx, source, processor_name)
        .await
    {
        detections.push(detection);
    }
    let best = detections.first().cloned();
    librovore_core::orchestration::DetectionResponse {
        source: source.to_string(),
        detections,
        detection_best: best,
        time_detection_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}
