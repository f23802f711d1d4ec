//! The five orchestration functions exposed to the CLI and MCP server
//! (spec §4.6): `detect`, `query_inventory`, `query_content`,
//! `summarize_inventory`, and `survey_processors`. Each composes the
//! registry, search engine, and inventory/structure processors; none of
//! them talk to the cache proxy directly.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::registry::{ProcessorContext, ProcessorRegistry};
use crate::search;
use crate::types::{
    Capabilities, ContentDocument, Detection, InventoryFilters, InventoryQueryDetails,
    SearchBehaviors,
};

/// Response shape for `detect` (spec §6): both inventory and structure
/// detection are attempted; `detection_best` is the higher-confidence of
/// the two, ties kept as whichever was found first (inventory before
/// structure).
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResponse {
    /// The source that was probed.
    pub source: String,
    /// Every detection that succeeded (confidence may still be `0.0`).
    pub detections: Vec<Detection>,
    /// The highest-confidence detection among `detections`, if any.
    pub detection_best: Option<Detection>,
    /// Wall-clock time spent probing, in milliseconds.
    pub time_detection_ms: u64,
}

/// Attempts both inventory and structure detection for `source`, optionally
/// restricted to a single named processor for each kind. A processor that
/// raises `ProcessorInavailability` (unknown name, or no confident match
/// when unnamed) is simply omitted rather than failing the whole call.
pub async fn detect(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    source: &str,
    processor_name: Option<&str>,
) -> Result<DetectionResponse> {
    let start = Instant::now();
    let mut detections = Vec::new();
    let mut best: Option<Detection> = None;

    if let Ok((_, detection)) = registry
        .detect_inventory_optimal(ctx, source, processor_name)
        .await
    {
        if best.as_ref().is_none_or(|b| detection.confidence > b.confidence) {
            best = Some(detection.clone());
        }
        detections.push(detection);
    }
    if let Ok((_, detection)) = registry
        .detect_structure_optimal(ctx, source, processor_name)
        .await
    {
        if best.as_ref().is_none_or(|b| detection.confidence > b.confidence) {
            best = Some(detection.clone());
        }
        detections.push(detection);
    }

    Ok(DetectionResponse {
        source: source.to_string(),
        detections,
        detection_best: best,
        time_detection_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

/// A single entry in `query_inventory`'s `documents` list (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct InventoryDocument {
    /// The object's name.
    pub name: String,
    /// Sphinx role, or Rustdoc/Pydoctor item type, if known.
    pub role: String,
    /// Sphinx domain, if known.
    pub domain: String,
    /// Relative path to the object's documentation page.
    pub uri: String,
    /// Human-friendly display name, falling back to `name`.
    pub dispname: String,
}

/// `query_inventory`'s `search_metadata` (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct InventorySearchMetadata {
    /// Number of documents returned after truncation to `results_max`.
    pub results_count: usize,
    /// The caller's requested cap.
    pub results_max: usize,
    /// Total matches before truncation.
    pub matches_total: usize,
}

/// Response shape for `query_inventory` (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct InventoryQueryResponse {
    /// The inventory's declared project name, or `"Unknown"`.
    pub project: String,
    /// The inventory's declared version, or `"Unknown"`.
    pub version: String,
    /// The query that was searched.
    pub query: String,
    /// The source that was queried.
    pub source: String,
    /// The matched, truncated documents.
    pub documents: Vec<InventoryDocument>,
    /// Search metadata.
    pub search_metadata: InventorySearchMetadata,
    /// Same as `search_metadata.results_count`; kept as its own top-level
    /// field for compatibility with the documented return shape.
    pub objects_count: usize,
}

/// Searches a source's inventory by name (spec §4.6 `query_inventory`).
///
/// Per the literal spec wording, inventory filtering always runs with
/// `details = Name` regardless of the caller's `details` argument, since
/// `query_inventory`'s response documents never surface signature/summary/
/// documentation fields; `details` is accepted for interface parity with
/// the CLI/MCP surface but otherwise unused here.
pub async fn query_inventory(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    source: &str,
    query: &str,
    processor_name: Option<&str>,
    search_behaviors: &SearchBehaviors,
    filters: &InventoryFilters,
    _details: InventoryQueryDetails,
    results_max: usize,
) -> Result<InventoryQueryResponse> {
    let (processor, _) = registry
        .detect_inventory_optimal(ctx, source, processor_name)
        .await?;
    let batch = processor
        .filter_inventory(ctx, source, filters, query, InventoryQueryDetails::Name)
        .await?;
    let matches_total = batch.objects.len();
    let search_results = search::filter_by_name(
        batch.objects,
        query,
        search_behaviors.match_mode,
        search_behaviors.fuzzy_threshold,
    )?;
    let selected: Vec<_> = search_results.into_iter().take(results_max).collect();
    let documents: Vec<InventoryDocument> = selected
        .iter()
        .map(|result| {
            let object = &result.object;
            InventoryDocument {
                name: object.name.clone(),
                role: object.specific_str("role").unwrap_or_default().to_string(),
                domain: object.specific_str("domain").unwrap_or_default().to_string(),
                uri: object.uri.clone(),
                dispname: object
                    .display_name
                    .clone()
                    .unwrap_or_else(|| object.name.clone()),
            }
        })
        .collect();
    Ok(InventoryQueryResponse {
        project: batch.project.unwrap_or_else(|| "Unknown".to_string()),
        version: batch.version.unwrap_or_else(|| "Unknown".to_string()),
        query: query.to_string(),
        source: source.to_string(),
        objects_count: documents.len(),
        search_metadata: InventorySearchMetadata {
            results_count: documents.len(),
            results_max,
            matches_total,
        },
        documents,
    })
}

/// A single entry in `query_content`'s `documents` list (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct ContentQueryDocument {
    /// The object's name.
    pub name: String,
    /// Sphinx role, or Rustdoc/Pydoctor item type, if known.
    pub r#type: String,
    /// Sphinx domain, if known.
    pub domain: String,
    /// Sphinx priority, if known.
    pub priority: String,
    /// The absolute documentation page URL.
    pub url: String,
    /// Extracted signature, if any.
    pub signature: Option<String>,
    /// Extracted description (Markdown), if any.
    pub description: Option<String>,
    /// A truncated preview of the description, omitted unless requested.
    pub content_snippet: Option<String>,
    /// Relevance score (spec §4.4 rubric).
    pub relevance_score: f64,
    /// Human-readable reasons contributing to `relevance_score`.
    pub match_reasons: Vec<String>,
}

impl ContentQueryDocument {
    fn from_content_document(document: ContentDocument, include_snippets: bool) -> Self {
        let object = document.object;
        Self {
            name: object.name.clone(),
            r#type: object.specific_str("role").unwrap_or_default().to_string(),
            domain: object.specific_str("domain").unwrap_or_default().to_string(),
            priority: object.specific_str("priority").unwrap_or_default().to_string(),
            url: document.documentation_url,
            signature: document.signature,
            description: document.description,
            content_snippet: include_snippets.then_some(document.content_snippet).flatten(),
            relevance_score: document.relevance_score,
            match_reasons: document.match_reasons,
        }
    }
}

/// `query_content`'s `search_metadata` (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct ContentSearchMetadata {
    /// Number of documents returned after truncation to `results_max`.
    pub results_count: usize,
    /// The caller's requested cap.
    pub results_max: usize,
}

/// Response shape for `query_content` (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct ContentQueryResponse {
    /// The source that was queried.
    pub source: String,
    /// The query that was searched.
    pub query: String,
    /// Search metadata.
    pub search_metadata: ContentSearchMetadata,
    /// The extracted, ranked documents.
    pub documents: Vec<ContentQueryDocument>,
}

/// Searches documentation content with relevance ranking (spec §4.6
/// `query_content`): inventory detection → filter → name search, taking
/// `3 × results_max` candidates → structure detection → extraction
/// (which itself sorts, truncates, and validates).
#[allow(clippy::too_many_arguments)]
pub async fn query_content(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    source: &str,
    query: &str,
    processor_name: Option<&str>,
    search_behaviors: &SearchBehaviors,
    filters: &InventoryFilters,
    include_snippets: bool,
    results_max: usize,
) -> Result<ContentQueryResponse> {
    let (inventory_processor, _) = registry
        .detect_inventory_optimal(ctx, source, processor_name)
        .await?;
    let batch = inventory_processor
        .filter_inventory(ctx, source, filters, query, InventoryQueryDetails::Name)
        .await?;
    let search_results = search::filter_by_name(
        batch.objects,
        query,
        search_behaviors.match_mode,
        search_behaviors.fuzzy_threshold,
    )?;
    let candidates: Vec<_> = search_results
        .into_iter()
        .take(results_max.saturating_mul(3))
        .map(|result| result.object)
        .collect();

    if candidates.is_empty() {
        return Ok(ContentQueryResponse {
            source: source.to_string(),
            query: query.to_string(),
            search_metadata: ContentSearchMetadata {
                results_count: 0,
                results_max,
            },
            documents: Vec::new(),
        });
    }

    let (structure_processor, _) = registry
        .detect_structure_optimal(ctx, source, processor_name)
        .await?;
    let raw_documents = structure_processor
        .extract_contents(ctx, source, &candidates, query, results_max)
        .await?;
    let documents: Vec<ContentQueryDocument> = raw_documents
        .into_iter()
        .map(|document| ContentQueryDocument::from_content_document(document, include_snippets))
        .collect();
    Ok(ContentQueryResponse {
        source: source.to_string(),
        query: query.to_string(),
        search_metadata: ContentSearchMetadata {
            results_count: documents.len(),
            results_max,
        },
        documents,
    })
}

/// Renders a human-readable summary of a source's inventory (spec §4.6
/// `summarize_inventory`): runs `query_inventory` with `results_max = 1000`
/// and, if `group_by` is set, partitions the documents by that field.
#[allow(clippy::too_many_arguments)]
pub async fn summarize_inventory(
    registry: &ProcessorRegistry,
    ctx: &ProcessorContext,
    source: &str,
    query: &str,
    processor_name: Option<&str>,
    search_behaviors: &SearchBehaviors,
    filters: &InventoryFilters,
    group_by: Option<&str>,
) -> Result<String> {
    let result = query_inventory(
        registry,
        ctx,
        source,
        query,
        processor_name,
        search_behaviors,
        filters,
        InventoryQueryDetails::Name,
        1000,
    )
    .await?;

    let mut lines = vec![
        format!("Project: {}", result.project),
        format!("Version: {}", result.version),
        format!("Objects: {}", result.search_metadata.matches_total),
    ];
    if let Some(field) = group_by {
        if !result.documents.is_empty() {
            lines.push(String::new());
            lines.push("Breakdown by groups:".to_string());
            let groups = group_documents_by_field(&result.documents, field);
            for (group_name, count) in groups {
                lines.push(format!("  {group_name}: {count} objects"));
            }
        }
    } else if !result.documents.is_empty() {
        lines.push(String::new());
        lines.push("Objects listed without grouping.".to_string());
    }
    Ok(lines.join("\n"))
}

fn document_field_value(document: &InventoryDocument, field: &str) -> Option<String> {
    let value = match field {
        "name" => &document.name,
        "role" => &document.role,
        "domain" => &document.domain,
        "uri" => &document.uri,
        "dispname" => &document.dispname,
        _ => return None,
    };
    (!value.is_empty()).then(|| value.clone())
}

/// Groups documents by `field`, counting each group; missing or unknown
/// values fall into `"(missing <field>)"`. Returned as a sorted map so
/// output is deterministic.
fn group_documents_by_field(documents: &[InventoryDocument], field: &str) -> BTreeMap<String, usize> {
    let mut groups = BTreeMap::new();
    for document in documents {
        let key = document_field_value(document, field)
            .unwrap_or_else(|| format!("(missing {field})"));
        *groups.entry(key).or_insert(0) += 1;
    }
    groups
}

/// Response shape for `survey_processors` (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct SurveyProcessorsResponse {
    /// Every surveyed processor's capabilities, keyed by name.
    pub processors: BTreeMap<String, Capabilities>,
}

/// Enumerates the registered inventory and structure processors' self-
/// described capabilities, optionally restricted to one name (spec §4.6
/// `survey_processors`).
pub fn survey_processors(
    registry: &ProcessorRegistry,
    name: Option<&str>,
) -> Result<SurveyProcessorsResponse> {
    let mut processors = registry.inventory_capabilities();
    processors.extend(registry.structure_capabilities());
    if let Some(name) = name {
        if !processors.contains_key(name) {
            return Err(Error::ProcessorInavailability {
                subject: name.to_string(),
            });
        }
        processors.retain(|key, _| key == name);
    }
    Ok(SurveyProcessorsResponse { processors })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, domain: &str) -> InventoryDocument {
        InventoryDocument {
            name: name.to_string(),
            role: "function".to_string(),
            domain: domain.to_string(),
            uri: format!("{name}.html"),
            dispname: name.to_string(),
        }
    }

    #[test]
    fn groups_by_known_field_and_counts() {
        let documents = vec![doc("foo", "py"), doc("bar", "py"), doc("baz", "std")];
        let groups = group_documents_by_field(&documents, "domain");
        assert_eq!(groups.get("py"), Some(&2));
        assert_eq!(groups.get("std"), Some(&1));
        assert_eq!(groups.values().sum::<usize>(), documents.len());
    }

    #[test]
    fn groups_missing_values_under_missing_sentinel() {
        let documents = vec![doc("foo", ""), doc("bar", "py")];
        let groups = group_documents_by_field(&documents, "domain");
        assert_eq!(groups.get("(missing domain)"), Some(&1));
        assert_eq!(groups.get("py"), Some(&1));
    }

    #[test]
    fn unknown_field_groups_everything_as_missing() {
        let documents = vec![doc("foo", "py"), doc("bar", "std")];
        let groups = group_documents_by_field(&documents, "nonexistent");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get("(missing nonexistent)"), Some(&2));
    }

    #[test]
    fn survey_processors_rejects_unknown_name() {
        let registry = ProcessorRegistry::empty(3600.0);
        let err = survey_processors(&registry, Some("nonexistent")).unwrap_err();
        assert_eq!(err.category(), "ProcessorInavailability");
    }

    #[test]
    fn survey_processors_lists_all_when_unnamed() {
        let registry = ProcessorRegistry::empty(3600.0);
        let response = survey_processors(&registry, None).unwrap();
        assert!(response.processors.is_empty());
    }
}
