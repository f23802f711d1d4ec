//! Human-readable text rendering for each operation's response shape.

use librovore_core::orchestration::{
    ContentQueryResponse, DetectionResponse, InventoryQueryResponse, SurveyProcessorsResponse,
};

/// Renders a `detect` response (spec §6 `detect`).
#[must_use]
pub fn detect(response: &DetectionResponse) -> String {
    let mut lines = vec![format!("Source: {}", response.source)];
    if response.detections.is_empty() {
        lines.push("No processor detections.".to_string());
    }
    for detection in &response.detections {
        lines.push(format!(
            "  {} — confidence {:.2}",
            detection.processor, detection.confidence
        ));
    }
    if let Some(best) = &response.detection_best {
        lines.push(format!(
            "Best: {} (confidence {:.2})",
            best.processor, best.confidence
        ));
    }
    lines.push(format!("Detection took {}ms", response.time_detection_ms));
    lines.join("\n")
}

/// Renders a `query-inventory` response (spec §6 `query_inventory`).
#[must_use]
pub fn query_inventory(response: &InventoryQueryResponse) -> String {
    let mut lines = vec![
        format!("Project: {} ({})", response.project, response.version),
        format!(
            "Matches: {} total, showing {}",
            response.search_metadata.matches_total, response.search_metadata.results_count
        ),
    ];
    for document in &response.documents {
        lines.push(format!(
            "  {} [{}/{}] — {}",
            document.dispname, document.domain, document.role, document.uri
        ));
    }
    lines.join("\n")
}

/// Renders a `query-content` response (spec §6 `query_content`).
#[must_use]
pub fn query_content(response: &ContentQueryResponse) -> String {
    let mut lines = vec![format!(
        "{} result(s) for {:?} at {}",
        response.search_metadata.results_count, response.query, response.source
    )];
    for document in &response.documents {
        lines.push(String::new());
        lines.push(format!(
            "# {} (score {:.1})",
            document.name, document.relevance_score
        ));
        lines.push(format!("  url: {}", document.url));
        if let Some(signature) = &document.signature {
            lines.push(format!("  signature: {signature}"));
        }
        if let Some(snippet) = &document.content_snippet {
            lines.push(format!("  {snippet}"));
        }
    }
    lines.join("\n")
}

/// Renders a `survey-processors` response (spec §6 `survey_processors`).
#[must_use]
pub fn survey_processors(response: &SurveyProcessorsResponse) -> String {
    let mut lines = Vec::new();
    for (name, capabilities) in &response.processors {
        lines.push(format!(
            "{name}: filters=[{}] results_limit_max={} {}",
            capabilities.supported_filter_keys.join(", "),
            capabilities.results_limit_max,
            capabilities.notes
        ));
    }
    if lines.is_empty() {
        lines.push("No processors registered.".to_string());
    }
    lines.join("\n")
}
