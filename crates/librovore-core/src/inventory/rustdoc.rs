//! Rustdoc `all.html` inventory processor (spec §4.3 "Rustdoc").

use std::collections::BTreeMap;

use async_trait::async_trait;
use scraper::ElementRef;

use crate::error::{Error, Result};
use crate::html;
use crate::registry::{InventoryProcessor, ProcessorContext};
use crate::types::{
    Capabilities, Detection, InventoryFilters, InventoryObject, InventoryQueryDetails,
    InventoryType,
};
use crate::url;

use super::InventoryBatch;

const SUBSTANTIAL_ITEMS_THRESHOLD: usize = 50;
const MODERATE_ITEMS_THRESHOLD: usize = 10;

/// One `<li><a>` entry scraped from an `all.html` item list, paired with the
/// item kind inferred from its preceding `<h2>`.
struct RawItem {
    name: String,
    item_type: String,
    path: String,
    href: String,
    description: String,
}

/// `true` iff `doc` carries a recognizable Rustdoc marker: a `rustdoc`
/// generator meta tag, a `rustdoc-topbar` element, a `data-rustdoc-version`
/// attribute, or a `rustdoc*.css` stylesheet link. Shared with the Rustdoc
/// structure processor's `detect()`, which needs the same rigor to avoid
/// false-positiving on pages that merely mention "rustdoc" in prose.
pub(crate) fn detect_rustdoc_markers(doc: &scraper::Html) -> bool {
    if let Ok(Some(meta)) = html::select_first(doc, r#"meta[name="generator"]"#) {
        if let Some(content) = meta.value().attr("content") {
            if content.to_lowercase().contains("rustdoc") {
                return true;
            }
        }
    }
    if html::select_first(doc, "rustdoc-topbar")
        .ok()
        .flatten()
        .is_some()
    {
        return true;
    }
    if let Ok(links) = html::select_all(doc, "link[href]") {
        if links
            .iter()
            .any(|link| link.value().attr("href").is_some_and(|href| {
                href.contains("rustdoc") && href.ends_with(".css")
            }))
        {
            return true;
        }
    }
    if let Ok(all_elements) = html::select_all(doc, "*") {
        return all_elements
            .iter()
            .any(|el| el.value().attr("data-rustdoc-version").is_some());
    }
    false
}

fn extract_crate_name(doc: &scraper::Html, url_path: &str) -> String {
    if let Ok(Some(h1)) = html::select_first(doc, "h1.fqn") {
        let text = html::text_of(h1);
        if text.starts_with("List of all items in") {
            let parts: Vec<&str> = text.split_whitespace().collect();
            if parts.len() > 4 {
                return (*parts.last().unwrap_or(&"unknown")).to_string();
            }
        }
    }
    for part in url_path.trim_matches('/').split('/') {
        if !part.is_empty() && part != "all.html" {
            return part.to_string();
        }
    }
    "unknown".to_string()
}

fn parse_all_items_page(content: &str, url_path: &str) -> Result<(String, Vec<RawItem>)> {
    let doc = html::parse_document(content)?;
    let crate_name = extract_crate_name(&doc, url_path);
    let mut items = Vec::new();
    for item_list in html::select_all(&doc, "ul.all-items")? {
        let item_type = preceding_h2_text(&doc, item_list)
            .map(|text| text.to_lowercase().trim_end_matches('s').to_string())
            .unwrap_or_default();
        for li in item_list.select(&html::parse_selector("li")?) {
            let Some(link) = li.select(&html::parse_selector("a")?).next() else {
                continue;
            };
            let href = link.value().attr("href").unwrap_or_default().to_string();
            let name = html::text_of(link);
            let description = li
                .select(&html::parse_selector("span.desc")?)
                .next()
                .map(html::text_of)
                .unwrap_or_default();
            let (path, simple_name) = match name.rsplit_once("::") {
                Some((path, simple_name)) => (path.to_string(), simple_name.to_string()),
                None => (crate_name.clone(), name.clone()),
            };
            items.push(RawItem {
                name: simple_name,
                item_type: if item_type.is_empty() {
                    "unknown".to_string()
                } else {
                    item_type.clone()
                },
                path,
                href,
                description,
            });
        }
    }
    Ok((crate_name, items))
}

/// Finds the text of the nearest preceding sibling `<h2>` of `item_list`,
/// by scanning the document's `h2`/`ul.all-items` elements in source order.
fn preceding_h2_text(doc: &scraper::Html, item_list: ElementRef<'_>) -> Option<String> {
    let target_id = item_list.id();
    let mut last_h2 = None;
    for node in doc.tree.nodes() {
        if node.id() == target_id {
            return last_h2;
        }
        if let Some(element) = node.value().as_element() {
            if element.name() == "h2" {
                if let Some(element_ref) = scraper::ElementRef::wrap(node) {
                    last_h2 = Some(html::text_of(element_ref));
                }
            }
        }
    }
    None
}

fn count_valid_items(items: &[RawItem]) -> usize {
    items
        .iter()
        .filter(|item| !item.name.is_empty() && !item.item_type.is_empty())
        .count()
}

fn calculate_confidence(total: usize, valid_items: usize) -> f64 {
    if valid_items == 0 {
        return 0.0;
    }
    let item_ratio = if total == 0 {
        0.0
    } else {
        valid_items as f64 / total as f64
    };
    let base_confidence = if valid_items >= SUBSTANTIAL_ITEMS_THRESHOLD {
        0.9
    } else if valid_items >= MODERATE_ITEMS_THRESHOLD {
        0.8
    } else {
        0.7
    };
    (base_confidence * item_ratio).min(0.95)
}

/// Maps a Rustdoc item-kind string (`struct`, `fn`, `macro`, ...) to the
/// coarser role vocabulary shared across processors (spec §4.3 "Rustdoc").
fn map_item_type_to_role(item_type: &str) -> &str {
    match item_type {
        "struct" | "enum" | "trait" | "type" | "union" | "primitive" => "type",
        "fn" => "function",
        "method" => "method",
        "macro" => "macro",
        "mod" => "module",
        "const" | "static" => "constant",
        "keyword" => "keyword",
        "attr" | "derive" => "attribute",
        other => other,
    }
}

fn to_inventory_object(item: RawItem, location_url: &str) -> Result<InventoryObject> {
    let role = map_item_type_to_role(&item.item_type).to_string();
    let display_name = if item.path.is_empty() {
        item.name.clone()
    } else {
        format!("{}::{}", item.path, item.name)
    };
    let mut specifics = BTreeMap::new();
    specifics.insert(
        "item_type".to_string(),
        serde_json::Value::String(item.item_type),
    );
    specifics.insert("role".to_string(), serde_json::Value::String(role));
    specifics.insert("path".to_string(), serde_json::Value::String(item.path));
    specifics.insert(
        "description".to_string(),
        serde_json::Value::String(item.description),
    );
    let object = InventoryObject::new(item.name, item.href, InventoryType::Rustdoc, location_url)?
        .with_display_name(display_name)
        .with_specifics(specifics);
    Ok(object)
}

/// Processes Rustdoc `all.html` inventories.
pub struct RustdocInventoryProcessor;

impl RustdocInventoryProcessor {
    /// Constructs the Rustdoc inventory processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn probe_all_items_page(
        &self,
        ctx: &ProcessorContext,
        base_url: &str,
    ) -> Option<(String, Vec<RawItem>, f64, String)> {
        for path in ["all.html", "std/all.html"] {
            let candidate_url = url::join_url(base_url, path);
            let Ok(content) = ctx.cache.retrieve_as_text(&candidate_url, "utf-8").await else {
                continue;
            };
            if content.trim().is_empty() {
                continue;
            }
            let Ok(doc) = html::parse_document(&content) else {
                continue;
            };
            if !detect_rustdoc_markers(&doc) {
                continue;
            }
            let Ok((crate_name, items)) = parse_all_items_page(&content, path) else {
                continue;
            };
            let valid_items = count_valid_items(&items);
            if valid_items == 0 {
                continue;
            }
            let confidence = calculate_confidence(items.len(), valid_items);
            return Some((crate_name, items, confidence, candidate_url));
        }
        None
    }
}

impl Default for RustdocInventoryProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryProcessor for RustdocInventoryProcessor {
    fn name(&self) -> &str {
        "rustdoc"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supported_filter_keys: vec!["item_type".into(), "name".into()],
            results_limit_max: 10_000,
            notes: "Scrapes Rustdoc all.html item listing pages".to_string(),
        }
    }

    async fn detect(&self, ctx: &ProcessorContext, source: &str) -> Detection {
        let base_url = url::normalize_base_url(source);
        match self.probe_all_items_page(ctx, &base_url).await {
            Some((_, _, confidence, _)) => {
                Detection::new(self.name(), confidence, crate::utils::now_seconds(), BTreeMap::new())
                    .unwrap_or_else(|_| {
                        Detection::rejected(self.name(), crate::utils::now_seconds(), "invalid confidence")
                    })
            },
            None => Detection::rejected(self.name(), crate::utils::now_seconds(), "no all.html item listing found"),
        }
    }

    async fn filter_inventory(
        &self,
        ctx: &ProcessorContext,
        source: &str,
        filters: &InventoryFilters,
        _query: &str,
        _details: InventoryQueryDetails,
    ) -> Result<InventoryBatch> {
        let base_url = url::normalize_base_url(source);
        let Some((crate_name, items, _, location_url)) =
            self.probe_all_items_page(ctx, &base_url).await
        else {
            return Err(Error::InventoryInaccessibility {
                source: base_url,
                cause: "no all.html item listing found".to_string(),
            });
        };
        let item_type_filter = filters.role.as_deref();
        let name_filter = filters.name.as_deref().map(str::to_lowercase);
        let mut objects = Vec::new();
        for item in items {
            if item.name.is_empty() || item.item_type.is_empty() {
                continue;
            }
            if let Some(item_type_filter) = item_type_filter {
                if item.item_type != item_type_filter {
                    continue;
                }
            }
            if let Some(name_filter) = &name_filter {
                if !item.name.to_lowercase().contains(name_filter.as_str()) {
                    continue;
                }
            }
            objects.push(to_inventory_object(item, &location_url)?);
        }
        Ok(InventoryBatch {
            objects,
            project: Some(crate_name),
            version: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_item_types_to_roles() {
        assert_eq!(map_item_type_to_role("struct"), "type");
        assert_eq!(map_item_type_to_role("fn"), "function");
        assert_eq!(map_item_type_to_role("macro"), "macro");
    }

    #[test]
    fn confidence_scales_with_item_count_and_ratio() {
        assert_eq!(calculate_confidence(10, 0), 0.0);
        assert!(calculate_confidence(100, 60) > 0.8);
        assert!(calculate_confidence(10, 5) <= 0.7);
    }

    #[test]
    fn parses_all_items_page_grouping_by_preceding_heading() {
        let html = r#"
            <html><body>
            <h1 class="fqn">List of all items in crate serde</h1>
            <h2>Structs</h2>
            <ul class="all-items">
                <li><a href="struct.Foo.html">Foo</a><span class="desc">A struct</span></li>
                <li><a href="struct.Bar.html">mod::Bar</a></li>
            </ul>
            </body></html>
        "#;
        let (crate_name, items) = parse_all_items_page(html, "/serde/all.html").unwrap();
        assert_eq!(crate_name, "serde");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_type, "struct");
        assert_eq!(items[0].name, "Foo");
        assert_eq!(items[1].path, "mod");
        assert_eq!(items[1].name, "Bar");
    }

    #[test]
    fn detects_rustdoc_marker_via_generator_meta() {
        let doc = html::parse_document(
            r#"<html><head><meta name="generator" content="rustdoc"></head></html>"#,
        )
        .unwrap();
        assert!(detect_rustdoc_markers(&doc));
    }
}
