//! Pydoctor documentation page structure processor (spec §4.4 "Pydoctor").

use async_trait::async_trait;

use crate::error::Result;
use crate::html;
use crate::registry::{ProcessorContext, StructureProcessor};
use crate::types::{Capabilities, ContentDocument, Detection, InventoryObject};
use crate::url;

use super::{
    calculate_relevance_score, extract_concurrently, extract_content_snippet, prescore_and_select,
    validate_extraction_results,
};

const SNIPPET_MAX_CHARS: usize = 200;

/// Extracts a signature via the fallback chain Pydoctor's own templates use:
/// `code.thisobject` (module/class title), then `div.functionHeader code`,
/// then `.thingTitle code`, falling back to the qualified name itself.
fn extract_signature(doc: &scraper::Html, qname: &str) -> Result<String> {
    if let Some(element) = html::select_first(doc, "code.thisobject")? {
        let text = html::text_of(element);
        if !text.is_empty() {
            return Ok(text);
        }
    }
    if let Some(element) = html::select_first(doc, "div.functionHeader code")? {
        let text = html::text_of(element);
        if !text.is_empty() {
            return Ok(text);
        }
    }
    if let Some(element) = html::select_first(doc, ".thingTitle code")? {
        let text = html::text_of(element);
        if !text.is_empty() {
            return Ok(text);
        }
    }
    Ok(qname.to_string())
}

/// Extracts the object's docstring from `div.docstring`, stripping any
/// nested `<nav>` elements.
fn extract_docstring(content: &str) -> Result<String> {
    let Some(docstring) = html::select_first(&html::parse_document(content)?, "div.docstring")?
    else {
        return Ok(String::new());
    };
    let stripped = html::strip_elements(&docstring.html(), &["nav"]);
    Ok(stripped)
}

fn parse_pydoctor_html(content: &str, qname: &str) -> Result<(String, String)> {
    let doc = html::parse_document(content)?;
    let signature = extract_signature(&doc, qname)?;
    let docstring_html = extract_docstring(content)?;
    Ok((signature, docstring_html))
}

/// Processes Pydoctor-rendered documentation pages.
pub struct PydoctorStructureProcessor;

impl PydoctorStructureProcessor {
    /// Constructs the Pydoctor structure processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PydoctorStructureProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StructureProcessor for PydoctorStructureProcessor {
    fn name(&self) -> &str {
        "pydoctor"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supported_filter_keys: vec![],
            results_limit_max: 100,
            notes: "Extracts signatures and docstrings from Pydoctor-rendered pages".to_string(),
        }
    }

    async fn detect(&self, ctx: &ProcessorContext, source: &str) -> Detection {
        let base_url = url::normalize_base_url(source);
        let index_url = url::derive_index_url(&base_url);
        let Ok(content) = ctx.cache.retrieve_as_text(&index_url, "utf-8").await else {
            return Detection::rejected(
                self.name(),
                crate::utils::now_seconds(),
                "index.html unreachable",
            );
        };
        let lower = content.to_lowercase();
        let mut confidence: f64 = 0.0;
        if lower.contains(r#"<meta name="generator" content="pydoctor"#) {
            confidence = 1.0;
        } else if lower.contains("apidocs.css") {
            confidence = 0.8;
        } else if lower.contains("navbar navbar-default mainnavbar") {
            confidence += 0.3;
        }
        if lower.contains(r#"class="docstring""#) {
            confidence += 0.2;
        }
        confidence = confidence.min(1.0);
        if confidence <= 0.0 {
            return Detection::rejected(self.name(), crate::utils::now_seconds(), "no Pydoctor markers found");
        }
        Detection::new(self.name(), confidence, crate::utils::now_seconds(), std::collections::BTreeMap::new())
            .unwrap_or_else(|_| {
                Detection::rejected(self.name(), crate::utils::now_seconds(), "invalid confidence")
            })
    }

    async fn extract_contents(
        &self,
        ctx: &ProcessorContext,
        source: &str,
        objects: &[InventoryObject],
        query: &str,
        results_max: usize,
    ) -> Result<Vec<ContentDocument>> {
        let base_url = url::normalize_base_url(source);
        let query_lower = query.to_lowercase();

        let selected: Vec<InventoryObject> = prescore_and_select(
            objects,
            &query_lower,
            results_max,
            |object| object.name.as_str(),
            |_| None,
        )
        .into_iter()
        .cloned()
        .collect();

        let mut documents = extract_concurrently(selected, |object| {
            let base_url = &base_url;
            let query_lower = &query_lower;
            async move {
                let doc_url = url::join_url(base_url, &object.uri);
                let html_content = ctx.cache.retrieve_as_text(&doc_url, "utf-8").await.ok()?;
                let (signature, docstring_html) =
                    parse_pydoctor_html(&html_content, &object.name).ok()?;
                let description = html::to_markdown(&docstring_html);
                let (score, reasons) = calculate_relevance_score(
                    query_lower,
                    &object.name,
                    None,
                    Some(&signature),
                    Some(&description),
                );
                if score <= 0.0 {
                    tracing::debug!(object = object.name.as_str(), "below relevance threshold");
                    return None;
                }
                let snippet = extract_content_snippet(query_lower, &description, SNIPPET_MAX_CHARS);
                Some(ContentDocument {
                    object: object.clone(),
                    documentation_url: doc_url,
                    signature: Some(signature),
                    description: Some(description),
                    content_snippet: Some(snippet),
                    relevance_score: score,
                    match_reasons: reasons,
                    extraction_metadata: std::collections::BTreeMap::new(),
                })
            }
        })
        .await;
        documents.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        documents.truncate(results_max);
        validate_extraction_results(self.name(), source, objects.len(), &documents)?;
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_signature_from_thisobject_code() {
        let doc = html::parse_document(r#"<code class="thisobject">pkg.Widget</code>"#).unwrap();
        assert_eq!(extract_signature(&doc, "pkg.Widget").unwrap(), "pkg.Widget");
    }

    #[test]
    fn falls_back_to_qname_when_no_signature_markers() {
        let doc = html::parse_document("<body></body>").unwrap();
        assert_eq!(extract_signature(&doc, "pkg.Widget").unwrap(), "pkg.Widget");
    }

    #[test]
    fn strips_nav_from_docstring() {
        let content = r#"<div class="docstring"><nav>skip</nav><p>Does a thing.</p></div>"#;
        let docstring = extract_docstring(content).unwrap();
        assert!(!docstring.contains("skip"));
        assert!(docstring.contains("Does a thing."));
    }
}
