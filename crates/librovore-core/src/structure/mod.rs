//! Format-specific structure processors (spec §4.4): Sphinx, Pydoctor,
//! Rustdoc, and MkDocs page-content extraction.

/// Sphinx documentation page structure processor.
pub mod sphinx;

/// Pydoctor documentation page structure processor.
pub mod pydoctor;

/// Rustdoc documentation page structure processor.
pub mod rustdoc;

/// MkDocs documentation page structure processor.
pub mod mkdocs;

use futures::stream::{self, StreamExt};

use crate::error::{Error, Result};
use crate::types::ContentDocument;

/// Upper bound on simultaneous per-object page fetches during extraction
/// (spec §4.4 "Parallelism"; spec §5 bounds all I/O concurrency).
const EXTRACTION_CONCURRENCY_MAX: usize = 8;

/// Runs `extract_one` over `candidates` concurrently, bounded to
/// [`EXTRACTION_CONCURRENCY_MAX`] in flight at a time, dropping any
/// candidate whose extraction returns `None` (spec §4.4 "individual
/// per-object failures are dropped from the result set").
pub async fn extract_concurrently<'a, T, F, Fut>(
    candidates: Vec<T>,
    extract_one: F,
) -> Vec<ContentDocument>
where
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = Option<ContentDocument>> + 'a,
{
    stream::iter(candidates.into_iter().map(extract_one))
        .buffer_unordered(EXTRACTION_CONCURRENCY_MAX)
        .filter_map(|document| async move { document })
        .collect()
        .await
}

/// Minimum fraction of requested objects that must yield meaningful content
/// before extraction is considered a processor/source mismatch rather than
/// a handful of missing pages (spec §4.4 "Non-goals"/edge cases).
const MEANINGFUL_RATIO_MIN: f64 = 0.10;

/// Validates an extraction batch against the spec's two failure modes:
/// zero results at all (`StructureIncompatibility`) or a meaningful-result
/// ratio below [`MEANINGFUL_RATIO_MIN`] (`ContentExtractFailure`).
pub fn validate_extraction_results(
    processor_name: &str,
    source: &str,
    requested_objects: usize,
    documents: &[ContentDocument],
) -> Result<()> {
    if documents.is_empty() {
        return Err(Error::StructureIncompatibility {
            processor_name: processor_name.to_string(),
            source: source.to_string(),
        });
    }
    let meaningful_results = documents.iter().filter(|doc| doc.is_meaningful()).count();
    if requested_objects > 0
        && (meaningful_results as f64 / requested_objects as f64) < MEANINGFUL_RATIO_MIN
    {
        return Err(Error::ContentExtractFailure {
            processor_name: processor_name.to_string(),
            source: source.to_string(),
            meaningful_results,
            requested_objects,
        });
    }
    Ok(())
}

/// The additive relevance-scoring rubric shared by the structure processors
/// (spec §4.4 "Relevance scoring"): exact case-insensitive name match +10,
/// name substring +10 (non-exclusive with the exact match), priority `"1"`
/// +2 / `"0"` +1, description substring +3, signature substring +2.
/// Returns the raw score (unbounded) and the human-readable reasons.
#[must_use]
pub fn calculate_relevance_score(
    query_lower: &str,
    name: &str,
    priority: Option<&str>,
    signature: Option<&str>,
    description: Option<&str>,
) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut reasons = Vec::new();
    let name_lower = name.to_lowercase();
    if name_lower == query_lower {
        score += 10.0;
        reasons.push("exact name match".to_string());
    }
    if name_lower.contains(query_lower) {
        score += 10.0;
        reasons.push("name contains query".to_string());
    }
    match priority {
        Some("1") => {
            score += 2.0;
            reasons.push("high priority".to_string());
        },
        Some("0") => {
            score += 1.0;
            reasons.push("normal priority".to_string());
        },
        _ => {},
    }
    if let Some(description) = description {
        if description.to_lowercase().contains(query_lower) {
            score += 3.0;
            reasons.push("description contains query".to_string());
        }
    }
    if let Some(signature) = signature {
        if signature.to_lowercase().contains(query_lower) {
            score += 2.0;
            reasons.push("signature contains query".to_string());
        }
    }
    (score, reasons)
}

/// Pre-scores candidates by name and priority alone, before any HTTP
/// fetch, so only the top `results_max * 3` candidates incur a request
/// (spec §4.4 "Pre-filtering"). Candidates scoring `0` are dropped.
#[must_use]
pub fn prescore_and_select<'a, T>(
    candidates: &'a [T],
    query_lower: &str,
    results_max: usize,
    name_of: impl Fn(&T) -> &str,
    priority_of: impl Fn(&T) -> Option<&str>,
) -> Vec<&'a T> {
    let mut scored: Vec<(f64, &T)> = candidates
        .iter()
        .filter_map(|candidate| {
            let mut score = 0.0;
            if name_of(candidate).to_lowercase().contains(query_lower) {
                score += 10.0;
            }
            match priority_of(candidate) {
                Some("1") => score += 2.0,
                Some("0") => score += 1.0,
                _ => {},
            }
            (score > 0.0).then_some((score, candidate))
        })
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    let fetch_limit = scored.len().min(results_max.saturating_mul(3));
    scored
        .into_iter()
        .take(fetch_limit)
        .map(|(_, candidate)| candidate)
        .collect()
}

/// Builds a truncated content snippet around the first case-insensitive
/// occurrence of `query`, falling back to a leading truncation (spec §4.4
/// "content_snippet").
#[must_use]
pub fn extract_content_snippet(query_lower: &str, text: &str, max_chars: usize) -> String {
    let text_lower = text.to_lowercase();
    if let Some(byte_idx) = text_lower.find(query_lower) {
        let char_idx = text_lower[..byte_idx].chars().count();
        let start_char = char_idx.saturating_sub(max_chars / 4);
        let start_byte = text
            .char_indices()
            .nth(start_char)
            .map_or(0, |(idx, _)| idx);
        let prefix = if start_byte > 0 { "…" } else { "" };
        let remainder = &text[start_byte..];
        format!("{prefix}{}", crate::html::snippet(remainder, max_chars))
    } else {
        crate::html::snippet(text, max_chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevance_score_combines_all_signals() {
        let (score, reasons) =
            calculate_relevance_score("foo", "foo", Some("1"), Some("fn foo()"), Some("about foo"));
        assert_eq!(score, 10.0 + 10.0 + 2.0 + 3.0 + 2.0);
        assert_eq!(reasons.len(), 5);
    }

    #[test]
    fn prescore_and_select_caps_at_triple_results_max() {
        let candidates: Vec<(String, String)> = (0..20)
            .map(|i| (format!("widget{i}"), "1".to_string()))
            .collect();
        let selected = prescore_and_select(
            &candidates,
            "widget",
            2,
            |c| c.0.as_str(),
            |c| Some(c.1.as_str()),
        );
        assert_eq!(selected.len(), 6);
    }

    #[test]
    fn validate_extraction_results_rejects_empty_batch() {
        let err = validate_extraction_results("sphinx", "src", 5, &[]).unwrap_err();
        assert_eq!(err.category(), "StructureIncompatibility");
    }
}
