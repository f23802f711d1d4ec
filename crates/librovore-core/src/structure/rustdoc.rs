//! Rustdoc documentation page structure processor (spec §4.4 "Rustdoc").

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::html;
use crate::inventory::rustdoc::detect_rustdoc_markers;
use crate::registry::{ProcessorContext, StructureProcessor};
use crate::types::{Capabilities, ContentDocument, Detection, InventoryObject};
use crate::url;

use super::{
    calculate_relevance_score, extract_concurrently, extract_content_snippet, prescore_and_select,
    validate_extraction_results,
};

const SNIPPET_MAX_CHARS: usize = 200;

/// Selectors for navigation/chrome elements stripped from the main content
/// container before extraction (spec §4.4 "Rustdoc" cleanup list).
const CLEANUP_SELECTORS: &[&str] = &[
    "nav.sidebar",
    "rustdoc-toolbar",
    "rustdoc-topbar",
    ".sidebar-resizer",
    ".src",
    ".out-of-band",
];

struct ExtractedParts {
    item_declaration: String,
    documentation: String,
    code_examples: String,
}

fn extract_item_declaration(content: &str) -> Result<String> {
    let doc = html::parse_document(content)?;
    let Some(element) = html::select_first(&doc, "pre.rust.item-decl")? else {
        return Ok(String::new());
    };
    let text = html::text_of(element);
    if text.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("```rust\n{text}\n```"))
    }
}

fn extract_docblocks(content: &str) -> Result<String> {
    let doc = html::parse_document(content)?;
    let docblocks = html::select_all(&doc, "div.docblock")?;
    let mut parts = Vec::new();
    for docblock in docblocks {
        let without_examples = html::strip_elements(&docblock.html(), &["div.example-wrap"]);
        let markdown = html::to_markdown(&without_examples);
        if !markdown.is_empty() {
            parts.push(markdown);
        }
    }
    Ok(parts.join("\n\n"))
}

fn extract_code_examples(content: &str) -> Result<String> {
    let doc = html::parse_document(content)?;
    let mut examples = Vec::new();
    for wrap in html::select_all(&doc, "div.example-wrap")? {
        let wrap_doc = html::parse_document(&wrap.html())?;
        if let Some(code_block) = html::select_first(&wrap_doc, "pre.rust")? {
            let text = html::text_of(code_block);
            if !text.is_empty() {
                examples.push(format!("```rust\n{text}\n```"));
            }
        }
    }
    Ok(examples.join("\n\n"))
}

/// Parses a fetched Rustdoc page: locates `main` (or `section#main-content`
/// as a fallback), strips navigation chrome, and extracts the declaration,
/// prose documentation, and code examples.
fn parse_documentation_html(content: &str, url: &str) -> Result<ExtractedParts> {
    let doc = html::parse_document(content)?;
    let main_content = html::select_first_of(&doc, &["main", "section#main-content"])?
        .ok_or_else(|| Error::DocumentationContentAbsence { url: url.to_string() })?;
    let cleaned = html::strip_elements(&main_content.html(), CLEANUP_SELECTORS);
    Ok(ExtractedParts {
        item_declaration: extract_item_declaration(&cleaned)?,
        documentation: extract_docblocks(&cleaned)?,
        code_examples: extract_code_examples(&cleaned)?,
    })
}

fn assemble_markdown(display_name: &str, parts: &ExtractedParts) -> String {
    let mut sections = Vec::new();
    if !parts.item_declaration.is_empty() {
        sections.push(format!("## Declaration\n\n{}", parts.item_declaration));
    }
    if !parts.documentation.is_empty() {
        sections.push(format!("## Documentation\n\n{}", parts.documentation));
    }
    if !parts.code_examples.is_empty() {
        sections.push(format!("## Examples\n\n{}", parts.code_examples));
    }
    if sections.is_empty() {
        return format!("# {display_name}\n\nNo documentation available.");
    }
    format!("# {display_name}\n\n{}", sections.join("\n\n"))
}

/// Processes Rustdoc-rendered documentation pages.
pub struct RustdocStructureProcessor;

impl RustdocStructureProcessor {
    /// Constructs the Rustdoc structure processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustdocStructureProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StructureProcessor for RustdocStructureProcessor {
    fn name(&self) -> &str {
        "rustdoc"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supported_filter_keys: vec![],
            results_limit_max: 100,
            notes: "Extracts declarations, prose, and examples from Rustdoc pages".to_string(),
        }
    }

    async fn detect(&self, ctx: &ProcessorContext, source: &str) -> Detection {
        let base_url = url::normalize_base_url(source);
        for path in ["all.html", "std/all.html"] {
            let candidate = url::join_url(&base_url, path);
            let Ok(content) = ctx.cache.retrieve_as_text(&candidate, "utf-8").await else {
                continue;
            };
            let Ok(doc) = html::parse_document(&content) else {
                continue;
            };
            if detect_rustdoc_markers(&doc) {
                return Detection::new(self.name(), 0.8, crate::utils::now_seconds(), Default::default())
                    .unwrap_or_else(|_| {
                        Detection::rejected(self.name(), crate::utils::now_seconds(), "invalid confidence")
                    });
            }
        }
        Detection::rejected(self.name(), crate::utils::now_seconds(), "no rustdoc markers found")
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
                let parts = parse_documentation_html(&html_content, &doc_url).ok()?;
                let display_name = object.display_name.clone().unwrap_or_else(|| object.name.clone());
                let description = assemble_markdown(&display_name, &parts);
                let (score, reasons) = calculate_relevance_score(
                    query_lower,
                    &object.name,
                    None,
                    Some(&parts.item_declaration),
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
                    signature: (!parts.item_declaration.is_empty()).then_some(parts.item_declaration),
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
    fn assembles_sections_in_order() {
        let parts = ExtractedParts {
            item_declaration: "```rust\nfn foo()\n```".to_string(),
            documentation: "does a thing".to_string(),
            code_examples: String::new(),
        };
        let markdown = assemble_markdown("foo", &parts);
        assert!(markdown.starts_with("# foo\n\n## Declaration"));
        assert!(markdown.contains("## Documentation"));
        assert!(!markdown.contains("## Examples"));
    }

    #[test]
    fn assembles_placeholder_when_nothing_extracted() {
        let parts = ExtractedParts {
            item_declaration: String::new(),
            documentation: String::new(),
            code_examples: String::new(),
        };
        assert_eq!(assemble_markdown("foo", &parts), "# foo\n\nNo documentation available.");
    }

    #[test]
    fn missing_main_content_is_content_absence() {
        let err = parse_documentation_html("<html><body>no main here</body></html>", "https://x")
            .unwrap_err();
        assert_eq!(err.category(), "DocumentationContentAbsence");
    }
}
