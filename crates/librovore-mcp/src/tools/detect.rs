//! `detect` tool (spec §6).

use librovore_core::registry::{ProcessorContext, ProcessorRegistry};
use serde::Deserialize;
use serde_json::Value;

use crate::error::McpResult;

use super::parse_params;

/// Parameters for the `detect` tool.
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DetectParams {
    /// The documentation source (URL or local path).
    pub source: String,
    /// Restrict detection to a single named processor.
    #[serde(default)]
    pub processor_name: Option<String>,
    /// Restrict detection to `"inventory"` or `"structure"` processors only;
    /// omitted or any other value runs both.
    #[serde(default)]
    pub genus: Option<String>,
}

/// Handles a `detect` tool call.
pub async fn handle(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    arguments: Value,
) -> McpResult<Value> {
    let params: DetectParams = parse_params(arguments)?;
    let response = match params.genus.as_deref() {
        Some("inventory") => {
            detect_one(registry, ctx, &params.source, params.processor_name.as_deref(), true).await
        },
        Some("structure") => {
            detect_one(registry, ctx, &params.source, params.processor_name.as_deref(), false).await
        },
        _ => {
            librovore_core::orchestration::detect(
                registry,
                ctx,
                &params.source,
                params.processor_name.as_deref(),
            )
            .await?
        },
    };
    Ok(serde_json::to_value(response).unwrap_or_default())
}

async fn detect_one(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    source: &str,
    processor_name: Option<&str>,
    inventory: bool,
) -> librovore_core::orchestration::DetectionResponse {
    let start = std::time::Instant::now();
    let mut detections = Vec::new();
    if inventory {
        if let Ok((_, detection)) = registry
            .detect_inventory_optimal(ctx, source, processor_name)
            .await
        {
            detections.push(detection);
        }
    } else if let Ok((_, detection)) = registry
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
