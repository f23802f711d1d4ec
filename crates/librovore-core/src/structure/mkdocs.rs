//! MkDocs documentation page structure processor (spec §4.4 "MkDocs").
//!
//! mkdocstrings renders its API reference pages with the same `dt`/`dd`
//! definition-list markup Sphinx uses, so content extraction reuses the
//! Sphinx structure processor wholesale; detection additionally probes
//! `mkdocs.yml` and sniffs the rendered theme.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::registry::{ProcessorContext, StructureProcessor};
use crate::types::{Capabilities, ContentDocument, Detection, InventoryObject};
use crate::url;

use super::sphinx::SphinxStructureProcessor;

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

/// Processes MkDocs + mkdocstrings documentation pages.
pub struct MkdocsStructureProcessor {
    sphinx: SphinxStructureProcessor,
}

impl MkdocsStructureProcessor {
    /// Constructs the MkDocs structure processor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sphinx: SphinxStructureProcessor::new(),
        }
    }

    async fn detect_theme(&self, ctx: &ProcessorContext, base_url: &str) -> Option<&'static str> {
        for candidate in [url::join_url(base_url, ""), url::derive_index_url(base_url)] {
            if let Ok(html) = ctx.cache.retrieve_as_text(&candidate, "utf-8").await {
                if let Some(theme) = sniff_theme(&html) {
                    return Some(theme);
                }
            }
        }
        None
    }
}

impl Default for MkdocsStructureProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StructureProcessor for MkdocsStructureProcessor {
    fn name(&self) -> &str {
        "mkdocs"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supported_filter_keys: vec!["domain".into(), "role".into(), "priority".into()],
            results_limit_max: 1_000,
            notes: "Processes MkDocs sites with mkdocstrings via its Sphinx-compatible markup"
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
            specifics.insert("theme".to_string(), serde_json::Value::String(theme.to_string()));
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
        self.sphinx
            .extract_contents(ctx, source, objects, query, results_max)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_readthedocs_theme() {
        assert_eq!(sniff_theme("powered by readthedocs"), Some("readthedocs"));
    }
}
