//! Sphinx documentation page structure processor (spec §4.4 "Sphinx").

use std::collections::BTreeMap;

use async_trait::async_trait;
use scraper::ElementRef;

use crate::error::{Error, Result};
use crate::html;
use crate::registry::{ProcessorContext, StructureProcessor};
use crate::types::{Capabilities, ContentDocument, Detection, InventoryObject};
use crate::url;

use super::{
    calculate_relevance_score, extract_concurrently, extract_content_snippet, prescore_and_select,
    validate_extraction_results,
};

const SNIPPET_MAX_CHARS: usize = 200;

/// Theme-keyed chains of CSS selectors for locating a page's main content
/// container, tried in order until one matches (spec §4.4 "Theme-keyed
/// content container").
fn container_chain(theme: Option<&str>) -> &'static [&'static str] {
    match theme {
        Some("furo") => &["article[role=main]", "div#furo-main-content"],
        Some("sphinx_rtd_theme") => &["div.document", "div.body", "div[role=main]"],
        Some("pydoctheme") => &["div.body", "div.content", "body"],
        Some("flask") => &["div.body", "div.content", "body"],
        Some("alabaster") => &["div.body", "div.content"],
        _ => &[
            "article[role=main]",
            "div.body",
            "div.content",
            "div.main",
            "main",
            "div[role=main]",
            "body",
        ],
    }
}

/// Extracts a (signature, description) pair from a `dt`/`dd` definition
/// pair, stripping `a.headerlink` anchors from the description.
fn extract_dt_content(dt: ElementRef<'_>, doc: &scraper::Html) -> Result<(String, String)> {
    let signature = html::text_of(dt);
    let dd = next_sibling_dd(doc, dt);
    let description = match dd {
        Some(dd) => {
            let stripped = html::strip_elements(&dd.html(), &["a.headerlink"]);
            let fragment = html::parse_document(&stripped)?;
            html::text_of(fragment.root_element())
        },
        None => String::new(),
    };
    Ok((signature, description))
}

/// Finds the next sibling `<dd>` element following `dt` in source order.
fn next_sibling_dd<'a>(doc: &'a scraper::Html, dt: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let target_id = dt.id();
    let mut found_target = false;
    for node in doc.tree.nodes() {
        if node.id() == target_id {
            found_target = true;
            continue;
        }
        if found_target {
            if let Some(element) = node.value().as_element() {
                if let Some(element_ref) = ElementRef::wrap(node) {
                    if element.name() == "dd" {
                        return Some(element_ref);
                    }
                    if element.name() == "dt" {
                        return None;
                    }
                }
            }
        }
    }
    None
}

/// Extracts a (signature, description) pair from a `<section>` element: the
/// nearest heading's text as the signature, the first paragraph as the
/// description.
fn extract_section_content(section: ElementRef<'_>) -> Result<(String, String)> {
    let signature = html::select_first_of(
        &html::parse_document(&section.html())?,
        &["h1", "h2", "h3", "h4", "h5", "h6"],
    )?
    .map(html::text_of)
    .unwrap_or_default();
    let description = html::select_first(&html::parse_document(&section.html())?, "p")?
        .map(html::text_of)
        .unwrap_or_default();
    Ok((signature, description))
}

/// Parses a fetched documentation page, locates `element_id` inside the
/// theme's main content container, and extracts its signature/description.
fn parse_documentation_html(
    content: &str,
    element_id: &str,
    theme: Option<&str>,
    url: &str,
) -> Result<(String, String)> {
    let doc = html::parse_document(content)?;
    let container = html::select_first_of(&doc, container_chain(theme))?.ok_or_else(|| {
        Error::DocumentationContentAbsence {
            url: url.to_string(),
        }
    })?;
    let selector = format!("#{}", css_escape(element_id));
    let element = container
        .select(&html::parse_selector(&selector)?)
        .next()
        .ok_or_else(|| Error::DocumentationObjectAbsence {
            object_id: element_id.to_string(),
            url: url.to_string(),
        })?;
    let tag = element.value().name();
    if tag == "dt" {
        extract_dt_content(element, &doc)
    } else if tag == "section" {
        extract_section_content(element)
    } else {
        Ok((html::text_of(element), String::new()))
    }
}

/// Escapes characters a CSS identifier can't contain literally, since
/// Sphinx anchors often include dots (`id="module.Class.method"`).
fn css_escape(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_string()
            } else {
                format!("\\{c}")
            }
        })
        .collect()
}

/// Processes Sphinx-rendered documentation pages.
pub struct SphinxStructureProcessor;

impl SphinxStructureProcessor {
    /// Constructs the Sphinx structure processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn detect_theme(&self, ctx: &ProcessorContext, base_url: &str) -> Option<&'static str> {
        let html_url = url::derive_index_url(base_url);
        let content = ctx.cache.retrieve_as_text(&html_url, "utf-8").await.ok()?;
        let lower = content.to_lowercase();
        if lower.contains("furo") {
            Some("furo")
        } else if lower.contains("alabaster") {
            Some("alabaster")
        } else if lower.contains("sphinx_rtd_theme") {
            Some("sphinx_rtd_theme")
        } else {
            None
        }
    }
}

impl Default for SphinxStructureProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StructureProcessor for SphinxStructureProcessor {
    fn name(&self) -> &str {
        "sphinx"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supported_filter_keys: vec![],
            results_limit_max: 100,
            notes: "Works with Sphinx-generated documentation sites".to_string(),
        }
    }

    async fn detect(&self, ctx: &ProcessorContext, source: &str) -> Detection {
        let base_url = url::normalize_base_url(source);
        let inventory_url = url::derive_inventory_url(&base_url);
        let has_objects_inv = ctx.cache.probe(&inventory_url).await.unwrap_or(false);
        if !has_objects_inv {
            return Detection::rejected(self.name(), crate::utils::now_seconds(), "objects.inv absent");
        }
        let searchindex_url = url::derive_searchindex_url(&base_url);
        let has_searchindex = ctx.cache.probe(&searchindex_url).await.unwrap_or(false);
        let confidence = if has_searchindex { 0.95 } else { 0.7 };
        let mut specifics = BTreeMap::new();
        if has_searchindex {
            if let Some(theme) = self.detect_theme(ctx, &base_url).await {
                specifics.insert(
                    "theme".to_string(),
                    serde_json::Value::String(theme.to_string()),
                );
            }
        }
        Detection::new(self.name(), confidence, crate::utils::now_seconds(), specifics)
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
        let theme = self.detect_theme(ctx, &base_url).await;
        let query_lower = query.to_lowercase();

        let selected: Vec<InventoryObject> = prescore_and_select(
            objects,
            &query_lower,
            results_max,
            |object| object.name.as_str(),
            |object| object.specific_str("priority"),
        )
        .into_iter()
        .cloned()
        .collect();

        let mut documents = extract_concurrently(selected, |object| {
            let base_url = &base_url;
            let query_lower = &query_lower;
            async move {
                let doc_url = url::derive_documentation_url(&base_url, &object.uri, &object.name);
                let anchor = doc_url
                    .rsplit_once('#')
                    .map(|(_, fragment)| fragment.to_string())
                    .unwrap_or_else(|| object.name.clone());
                let html_content = ctx.cache.retrieve_as_text(&doc_url, "utf-8").await.ok()?;
                let (signature, description_html) =
                    parse_documentation_html(&html_content, &anchor, theme, &doc_url).ok()?;
                let description = html::to_markdown(&description_html);
                let (score, reasons) = calculate_relevance_score(
                    query_lower,
                    &object.name,
                    object.specific_str("priority"),
                    Some(&signature),
                    Some(&description),
                );
                if score <= 0.0 {
                    tracing::debug!(object = object.name.as_str(), "below relevance threshold");
                    return None;
                }
                let snippet = extract_content_snippet(query_lower, &description, SNIPPET_MAX_CHARS);
                let mut metadata = BTreeMap::new();
                if let Some(domain) = object.specific_str("domain") {
                    metadata.insert(
                        "domain".to_string(),
                        serde_json::Value::String(domain.to_string()),
                    );
                }
                Some(ContentDocument {
                    object: object.clone(),
                    documentation_url: doc_url,
                    signature: Some(signature),
                    description: Some(description),
                    content_snippet: Some(snippet),
                    relevance_score: score,
                    match_reasons: reasons,
                    extraction_metadata: metadata,
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
    fn furo_theme_chain_tries_article_then_div() {
        assert_eq!(
            container_chain(Some("furo")),
            &["article[role=main]", "div#furo-main-content"]
        );
    }

    #[test]
    fn parses_dt_dd_definition_pair() {
        let html = r#"
            <body><div class="body">
            <dl><dt id="foo.bar">foo.bar(x)<a class="headerlink" href="#foo.bar">#</a></dt>
            <dd>Does a thing.</dd></dl>
            </div></body>
        "#;
        let (signature, description) =
            parse_documentation_html(html, "foo.bar", None, "https://x").unwrap();
        assert!(signature.contains("foo.bar(x)"));
        assert_eq!(description, "Does a thing.");
    }

    #[test]
    fn missing_container_is_content_absence() {
        // The furo chain has no `body` fallback, unlike the generic chain.
        let err =
            parse_documentation_html("<html><body>no furo markers</body></html>", "foo", Some("furo"), "https://x")
                .unwrap_err();
        assert_eq!(err.category(), "DocumentationContentAbsence");
    }
}
