//! MkDocs inventory processor (spec §4.3 "MkDocs"). Inventory extraction
//! delegates to the Sphinx `objects.inv` parser, since mkdocstrings renders
//! Sphinx-compatible inventories; detection additionally probes `mkdocs.yml`
//! and best-effort sniffs the rendered theme.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::registry::{InventoryProcessor, ProcessorContext};
use crate::types::{Capabilities, Detection, InventoryFilters, InventoryQueryDetails};
use crate::url;

use super::sphinx::SphinxInventoryProcessor;
use super::InventoryBatch;

/// `true` iff the fetched HTML mentions a known MkDocs theme signature.
fn sniff_theme(html: &str) -> Option<&'static str> {
    let lower = html.to_lowercase();
    if lower.contains("material") || lower.contains("mkdocs-material") {
        Some("material")
    } else if lower.contains("readthedocs") {
        Some("readthedocs")
    } else {
        None
    }
}

/// Processes MkDocs documentation sources.
pub struct MkdocsInventoryProcessor {
    sphinx: SphinxInventoryProcessor,
}

impl MkdocsInventoryProcessor {
    /// Constructs the MkDocs inventory processor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sphinx: SphinxInventoryProcessor::new(),
        }
    }

    async fn detect_theme(&self, ctx: &ProcessorContext, base_url: &str) -> Option<&'static str> {
        for candidate in [
            url::join_url(base_url, ""),
            url::derive_index_url(base_url),
        ] {
            if let Ok(html) = ctx.cache.retrieve_as_text(&candidate, "utf-8").await {
                if let Some(theme) = sniff_theme(&html) {
                    return Some(theme);
                }
            }
        }
        None
    }
}

impl Default for MkdocsInventoryProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryProcessor for MkdocsInventoryProcessor {
    fn name(&self) -> &str {
        "mkdocs"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supported_filter_keys: vec!["domain".into(), "role".into(), "priority".into()],
            results_limit_max: 10_000,
            notes: "Detects MkDocs sites; delegates inventory parsing to the Sphinx objects.inv \
                    format emitted by mkdocstrings"
                .to_string(),
        }
    }

    async fn detect(&self, ctx: &ProcessorContext, source: &str) -> Detection {
        let base_url = url::normalize_base_url(source);
        let inventory_url = url::derive_inventory_url(&base_url);
        let mkdocs_yml_url = url::derive_mkdocs_yml_url(&base_url);
        let has_objects_inv = ctx.cache.probe(&inventory_url).await.unwrap_or(false);
        let has_mkdocs_yml = ctx.cache.probe(&mkdocs_yml_url).await.unwrap_or(false);
        let mut confidence = 0.0;
        if has_objects_inv {
            confidence += 0.8;
        }
        if has_mkdocs_yml {
            confidence += 0.4;
        }
        confidence = confidence.min(1.0);
        if confidence <= 0.0 {
            return Detection::rejected(
                self.name(),
                crate::utils::now_seconds(),
                "neither objects.inv nor mkdocs.yml found",
            );
        }
        let mut specifics = BTreeMap::new();
        if let Some(theme) = self.detect_theme(ctx, &base_url).await {
            specifics.insert(
                "theme".to_string(),
                serde_json::Value::String(theme.to_string()),
            );
        }
        Detection::new(self.name(), confidence, crate::utils::now_seconds(), specifics)
            .unwrap_or_else(|_| {
                Detection::rejected(self.name(), crate::utils::now_seconds(), "invalid confidence")
            })
    }

    async fn filter_inventory(
        &self,
        ctx: &ProcessorContext,
        source: &str,
        filters: &InventoryFilters,
        query: &str,
        details: InventoryQueryDetails,
    ) -> Result<InventoryBatch> {
        self.sphinx
            .filter_inventory(ctx, source, filters, query, details)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_material_theme() {
        assert_eq!(sniff_theme("<html class=\"mkdocs-material\">"), Some("material"));
        assert_eq!(sniff_theme("plain docs"), None);
    }
}
