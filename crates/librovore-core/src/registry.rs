//! The processor registry and detection cache (spec §4.2).
//!
//! Processors are registered once at startup into insertion-ordered maps;
//! the detection cache remembers, per source, each registered processor's
//! self-reported [`Detection`] for a configurable TTL, keyed by processor
//! name with the spec's confidence-then-registration-order tie-break.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::cache::CacheProxy;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{Capabilities, Detection, DetectionCacheEntry};
use crate::utils::now_seconds;

/// Shared dependencies every processor's `detect`/`filter_inventory`/
/// `extract_contents` methods draw on: the cache proxy and the cache's
/// configured user agent.
pub struct ProcessorContext {
    /// The cache proxy processors fetch probes/bodies through.
    pub cache: CacheProxy,
}

impl ProcessorContext {
    /// Constructs a context from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            cache: CacheProxy::new(&config.cache),
        }
    }
}

/// A processor that understands a particular inventory format.
#[async_trait]
pub trait InventoryProcessor: Send + Sync {
    /// This processor's unique, stable name.
    fn name(&self) -> &str;

    /// This processor's self-described capabilities.
    fn capabilities(&self) -> Capabilities;

    /// Judges whether and how well this processor can handle `source`.
    async fn detect(&self, ctx: &ProcessorContext, source: &str) -> Detection;

    /// Fetches and filters this source's inventory.
    async fn filter_inventory(
        &self,
        ctx: &ProcessorContext,
        source: &str,
        filters: &crate::types::InventoryFilters,
        query: &str,
        details: crate::types::InventoryQueryDetails,
    ) -> Result<crate::inventory::InventoryBatch>;
}

/// A processor that understands a particular renderer's page structure.
#[async_trait]
pub trait StructureProcessor: Send + Sync {
    /// This processor's unique, stable name.
    fn name(&self) -> &str;

    /// This processor's self-described capabilities.
    fn capabilities(&self) -> Capabilities;

    /// Judges whether and how well this processor can handle `source`.
    async fn detect(&self, ctx: &ProcessorContext, source: &str) -> Detection;

    /// Fetches and extracts documentation content for `objects`.
    async fn extract_contents(
        &self,
        ctx: &ProcessorContext,
        source: &str,
        objects: &[crate::types::InventoryObject],
        query: &str,
        results_max: usize,
    ) -> Result<Vec<crate::types::ContentDocument>>;
}

/// Per-source cache of processors' self-reported detections, with a
/// configurable TTL (spec §4.2).
pub struct DetectionCache {
    entries: Mutex<std::collections::HashMap<String, DetectionCacheEntry>>,
    ttl: f64,
}

impl DetectionCache {
    /// Constructs an empty detection cache with the given TTL.
    #[must_use]
    pub fn new(ttl: f64) -> Self {
        Self {
            entries: Mutex::new(std::collections::HashMap::new()),
            ttl,
        }
    }

    /// The full detection map for `source`, if fresh.
    pub async fn access_detections(&self, source: &str) -> Option<BTreeMap<String, Detection>> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(source)?;
        if entry.is_expired(now_seconds()) {
            entries.remove(source);
            return None;
        }
        Some(entry.detections.clone())
    }

    async fn store(&self, source: &str, detections: BTreeMap<String, Detection>) {
        self.entries.lock().await.insert(
            source.to_string(),
            DetectionCacheEntry {
                detections,
                timestamp: now_seconds(),
                ttl: self.ttl,
            },
        );
    }
}

/// The registry of inventory and structure processors, plus their shared
/// detection caches.
pub struct ProcessorRegistry {
    inventory_order: Vec<String>,
    inventory_processors: BTreeMap<String, Arc<dyn InventoryProcessor>>,
    structure_order: Vec<String>,
    structure_processors: BTreeMap<String, Arc<dyn StructureProcessor>>,
    inventory_detections: DetectionCache,
    structure_detections: DetectionCache,
}

impl ProcessorRegistry {
    /// An empty registry, for tests that register processors manually.
    #[must_use]
    pub fn empty(detection_ttl: f64) -> Self {
        Self {
            inventory_order: Vec::new(),
            inventory_processors: BTreeMap::new(),
            structure_order: Vec::new(),
            structure_processors: BTreeMap::new(),
            inventory_detections: DetectionCache::new(detection_ttl),
            structure_detections: DetectionCache::new(detection_ttl),
        }
    }

    /// Builds a registry with every built-in processor registered, filtered
    /// by `config.extensions` (an entry with `enabled = false` is skipped;
    /// entries naming an unknown built-in are ignored).
    #[must_use]
    pub fn with_builtins(config: &Config) -> Self {
        let mut registry = Self::empty(config.cache.detection_ttl_seconds);
        let disabled: std::collections::HashSet<&str> = config
            .extensions
            .iter()
            .filter(|entry| !entry.enabled)
            .map(|entry| entry.name.as_str())
            .collect();

        let sphinx_inventory = crate::inventory::sphinx::SphinxInventoryProcessor::new();
        let pydoctor_inventory = crate::inventory::pydoctor::PydoctorInventoryProcessor::new();
        let rustdoc_inventory = crate::inventory::rustdoc::RustdocInventoryProcessor::new();
        let mkdocs_inventory = crate::inventory::mkdocs::MkdocsInventoryProcessor::new();

        if !disabled.contains("sphinx") {
            registry.register_inventory(Arc::new(sphinx_inventory));
        }
        if !disabled.contains("pydoctor") {
            registry.register_inventory(Arc::new(pydoctor_inventory));
        }
        if !disabled.contains("rustdoc") {
            registry.register_inventory(Arc::new(rustdoc_inventory));
        }
        if !disabled.contains("mkdocs") {
            registry.register_inventory(Arc::new(mkdocs_inventory));
        }

        let sphinx_structure = crate::structure::sphinx::SphinxStructureProcessor::new();
        let pydoctor_structure = crate::structure::pydoctor::PydoctorStructureProcessor::new();
        let rustdoc_structure = crate::structure::rustdoc::RustdocStructureProcessor::new();
        let mkdocs_structure = crate::structure::mkdocs::MkdocsStructureProcessor::new();

        if !disabled.contains("sphinx") {
            registry.register_structure(Arc::new(sphinx_structure));
        }
        if !disabled.contains("pydoctor") {
            registry.register_structure(Arc::new(pydoctor_structure));
        }
        if !disabled.contains("rustdoc") {
            registry.register_structure(Arc::new(rustdoc_structure));
        }
        if !disabled.contains("mkdocs") {
            registry.register_structure(Arc::new(mkdocs_structure));
        }

        registry
    }

    /// Registers an inventory processor. Registration order is preserved
    /// for detection tie-breaks.
    pub fn register_inventory(&mut self, processor: Arc<dyn InventoryProcessor>) {
        let name = processor.name().to_string();
        self.inventory_order.push(name.clone());
        self.inventory_processors.insert(name, processor);
    }

    /// Registers a structure processor. Registration order is preserved
    /// for detection tie-breaks.
    pub fn register_structure(&mut self, processor: Arc<dyn StructureProcessor>) {
        let name = processor.name().to_string();
        self.structure_order.push(name.clone());
        self.structure_processors.insert(name, processor);
    }

    /// Every registered inventory processor's capabilities, keyed by name.
    #[must_use]
    pub fn inventory_capabilities(&self) -> BTreeMap<String, Capabilities> {
        self.inventory_processors
            .iter()
            .map(|(name, processor)| (name.clone(), processor.capabilities()))
            .collect()
    }

    /// Every registered structure processor's capabilities, keyed by name.
    #[must_use]
    pub fn structure_capabilities(&self) -> BTreeMap<String, Capabilities> {
        self.structure_processors
            .iter()
            .map(|(name, processor)| (name.clone(), processor.capabilities()))
            .collect()
    }

    fn inventory_processor_by_name(&self, name: &str) -> Result<Arc<dyn InventoryProcessor>> {
        self.inventory_processors
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ProcessorInavailability {
                subject: name.to_string(),
            })
    }

    fn structure_processor_by_name(&self, name: &str) -> Result<Arc<dyn StructureProcessor>> {
        self.structure_processors
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ProcessorInavailability {
                subject: name.to_string(),
            })
    }

    /// Runs the optimal-processor selection algorithm (spec §4.2) for
    /// inventory processors: consult the cache, otherwise detect with
    /// every registered processor, cache the map, and pick the best.
    pub async fn detect_inventory_optimal(
        &self,
        ctx: &ProcessorContext,
        source: &str,
        processor_name: Option<&str>,
    ) -> Result<(Arc<dyn InventoryProcessor>, Detection)> {
        if let Some(name) = processor_name {
            let processor = self.inventory_processor_by_name(name)?;
            let detection = processor.detect(ctx, source).await;
            return Ok((processor, detection));
        }
        let detections = self.inventory_detections(ctx, source).await;
        let best = crate::types::best_detection_of(&detections, &self.inventory_order).cloned();
        let Some(best) = best else {
            return Err(Error::ProcessorInavailability {
                subject: source.to_string(),
            });
        };
        let processor = self.inventory_processor_by_name(&best.processor)?;
        Ok((processor, best))
    }

    /// Runs the optimal-processor selection algorithm for structure
    /// processors.
    pub async fn detect_structure_optimal(
        &self,
        ctx: &ProcessorContext,
        source: &str,
        processor_name: Option<&str>,
    ) -> Result<(Arc<dyn StructureProcessor>, Detection)> {
        if let Some(name) = processor_name {
            let processor = self.structure_processor_by_name(name)?;
            let detection = processor.detect(ctx, source).await;
            return Ok((processor, detection));
        }
        let detections = self.structure_detections(ctx, source).await;
        let best = crate::types::best_detection_of(&detections, &self.structure_order).cloned();
        let Some(best) = best else {
            return Err(Error::ProcessorInavailability {
                subject: source.to_string(),
            });
        };
        let processor = self.structure_processor_by_name(&best.processor)?;
        Ok((processor, best))
    }

    /// Every registered inventory processor's detection for `source`,
    /// from the cache if fresh, otherwise freshly computed and cached.
    pub async fn inventory_detections(
        &self,
        ctx: &ProcessorContext,
        source: &str,
    ) -> BTreeMap<String, Detection> {
        if let Some(cached) = self.inventory_detections.access_detections(source).await {
            return cached;
        }
        let mut detections = BTreeMap::new();
        for (name, processor) in &self.inventory_processors {
            let detection = processor.detect(ctx, source).await;
            detections.insert(name.clone(), detection);
        }
        self.inventory_detections.store(source, detections.clone()).await;
        detections
    }

    /// Every registered structure processor's detection for `source`.
    pub async fn structure_detections(
        &self,
        ctx: &ProcessorContext,
        source: &str,
    ) -> BTreeMap<String, Detection> {
        if let Some(cached) = self.structure_detections.access_detections(source).await {
            return cached;
        }
        let mut detections = BTreeMap::new();
        for (name, processor) in &self.structure_processors {
            let detection = processor.detect(ctx, source).await;
            detections.insert(name.clone(), detection);
        }
        self.structure_detections.store(source, detections.clone()).await;
        detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InventoryQueryDetails;

    struct AlwaysRejects;

    #[async_trait]
    impl InventoryProcessor for AlwaysRejects {
        fn name(&self) -> &str {
            "rejects"
        }
        fn capabilities(&self) -> Capabilities {
            Capabilities {
                supported_filter_keys: vec![],
                results_limit_max: 0,
                notes: String::new(),
            }
        }
        async fn detect(&self, _ctx: &ProcessorContext, _source: &str) -> Detection {
            Detection::rejected(self.name(), now_seconds(), "never matches")
        }
        async fn filter_inventory(
            &self,
            _ctx: &ProcessorContext,
            _source: &str,
            _filters: &crate::types::InventoryFilters,
            _query: &str,
            _details: InventoryQueryDetails,
        ) -> Result<crate::inventory::InventoryBatch> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn unknown_named_processor_raises() {
        let registry = ProcessorRegistry::empty(3600.0);
        let config = Config::default();
        let ctx = ProcessorContext::new(&config);
        let err = registry
            .detect_inventory_optimal(&ctx, "src", Some("nonexistent"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), "ProcessorInavailability");
    }

    #[tokio::test]
    async fn no_confident_detection_raises() {
        let mut registry = ProcessorRegistry::empty(3600.0);
        registry.register_inventory(Arc::new(AlwaysRejects));
        let config = Config::default();
        let ctx = ProcessorContext::new(&config);
        let err = registry
            .detect_inventory_optimal(&ctx, "src", None)
            .await
            .unwrap_err();
        assert_eq!(err.category(), "ProcessorInavailability");
    }
}
