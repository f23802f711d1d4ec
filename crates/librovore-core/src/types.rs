//! Core data types shared across the cache proxy, processors, search engine,
//! and orchestration functions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A sum type distinguishing "no cached entry" from any legitimate value,
/// including a cached `false`, `0`, or empty collection.
///
/// Plain `Option<T>` is used everywhere else in this crate for ordinary
/// optionality; `Possession` is reserved for cache lookups and detection
/// results where a falsy value must not be mistaken for absence.
#[derive(Debug, Clone)]
pub enum Possession<T> {
    /// A value is present.
    Possessed(T),
    /// No value is present (expired, evicted, or never stored).
    Absent,
}

impl<T> Possession<T> {
    /// Returns `true` if this is [`Possession::Absent`].
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Converts to `Option<T>`, discarding the distinction from `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Possessed(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// Returns a reference to the value, if present.
    pub const fn as_ref(&self) -> Option<&T> {
        match self {
            Self::Possessed(value) => Some(value),
            Self::Absent => None,
        }
    }
}

impl<T> From<Option<T>> for Possession<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Possessed)
    }
}

/// Tag identifying the inventory format that produced an [`InventoryObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryType {
    /// Sphinx `objects.inv`.
    SphinxObjectsInv,
    /// Pydoctor `searchindex.json`.
    Pydoctor,
    /// Rustdoc `all.html`.
    Rustdoc,
    /// MkDocs + mkdocstrings (inventory delegates to Sphinx).
    Mkdocs,
}

impl InventoryType {
    /// The wire-format tag string used in JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SphinxObjectsInv => "sphinx_objects_inv",
            Self::Pydoctor => "pydoctor",
            Self::Rustdoc => "rustdoc",
            Self::Mkdocs => "mkdocs",
        }
    }
}

/// A single documented object drawn from a format-specific inventory,
/// normalized to a universal shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryObject {
    /// Primary identifier in its source namespace. Never empty.
    pub name: String,
    /// Relative path to the object's documentation page, may include `#fragment`.
    pub uri: String,
    /// Which inventory format produced this object.
    pub inventory_type: InventoryType,
    /// Absolute URL of the inventory that produced this object.
    pub location_url: String,
    /// Human-friendly display name, if different from `name`.
    pub display_name: Option<String>,
    /// Format-specific fields (`domain`/`role`/`priority` for Sphinx, etc.).
    /// Immutable after construction.
    pub specifics: BTreeMap<String, serde_json::Value>,
}

impl InventoryObject {
    /// Constructs a new object, validating the non-empty invariants.
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        inventory_type: InventoryType,
        location_url: impl Into<String>,
    ) -> Result<Self> {
        let object = Self {
            name: name.into(),
            uri: uri.into(),
            inventory_type,
            location_url: location_url.into(),
            display_name: None,
            specifics: BTreeMap::new(),
        };
        object.validate()?;
        Ok(object)
    }

    /// Attaches a display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Attaches format-specific fields.
    #[must_use]
    pub fn with_specifics(mut self, specifics: BTreeMap<String, serde_json::Value>) -> Self {
        self.specifics = specifics;
        self
    }

    /// Validates the non-empty-string invariants from the data model.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.uri.is_empty() || self.location_url.is_empty() {
            return Err(Error::InventoryInvalidity {
                source: self.location_url.clone(),
                cause: "inventory object missing required field".into(),
            });
        }
        Ok(())
    }

    /// A specifics field as a string, if present and a JSON string.
    #[must_use]
    pub fn specific_str(&self, key: &str) -> Option<&str> {
        self.specifics.get(key).and_then(serde_json::Value::as_str)
    }
}

/// An [`InventoryObject`] paired with a match score and the reasons it matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matched object.
    pub object: InventoryObject,
    /// Match score in `[0, 1]`.
    pub score: f64,
    /// Human-readable reasons for the match, in no particular order.
    pub match_reasons: Vec<String>,
}

impl SearchResult {
    /// Constructs a search result, validating score range and the inner object.
    pub fn new(object: InventoryObject, score: f64, match_reasons: Vec<String>) -> Result<Self> {
        if !(0.0..=1.0).contains(&score) {
            return Err(Error::InventoryFilterInvalidity {
                message: format!("search result score {score} out of range [0, 1]"),
            });
        }
        object.validate()?;
        Ok(Self {
            object,
            score,
            match_reasons,
        })
    }
}

/// An [`InventoryObject`] enriched with extracted documentation content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentDocument {
    /// The originating inventory object.
    pub object: InventoryObject,
    /// The absolute documentation page URL.
    pub documentation_url: String,
    /// Extracted signature text, if any.
    pub signature: Option<String>,
    /// Extracted description text (Markdown), if any.
    pub description: Option<String>,
    /// A truncated preview of the description, if requested.
    pub content_snippet: Option<String>,
    /// Relevance score computed during extraction (spec §4.4 rubric).
    pub relevance_score: f64,
    /// Human-readable reasons contributing to `relevance_score`.
    pub match_reasons: Vec<String>,
    /// Format-specific extraction metadata. Immutable after construction.
    pub extraction_metadata: BTreeMap<String, serde_json::Value>,
}

impl ContentDocument {
    /// `true` iff any of signature, description, or snippet is non-empty.
    #[must_use]
    pub fn is_meaningful(&self) -> bool {
        self.signature.as_deref().is_some_and(|s| !s.is_empty())
            || self.description.as_deref().is_some_and(|s| !s.is_empty())
            || self.content_snippet.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// A processor's self-reported judgment of whether and how well it can
/// handle a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// The name of the processor that produced this detection.
    pub processor: String,
    /// Confidence in `[0.0, 1.0]`. `0.0` means "rejects this source".
    pub confidence: f64,
    /// Unix timestamp (seconds) when this detection was produced.
    pub timestamp: f64,
    /// Processor-specific metadata gathered during detection (e.g. theme name).
    pub specifics: BTreeMap<String, serde_json::Value>,
}

impl Detection {
    /// Constructs a detection, validating the confidence range.
    pub fn new(
        processor: impl Into<String>,
        confidence: f64,
        timestamp: f64,
        specifics: BTreeMap<String, serde_json::Value>,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::DetectionConfidenceInvalidity { confidence });
        }
        Ok(Self {
            processor: processor.into(),
            confidence,
            timestamp,
            specifics,
        })
    }

    /// A rejecting detection (confidence `0.0`) for a processor that errored
    /// or declined the source.
    #[must_use]
    pub fn rejected(processor: impl Into<String>, timestamp: f64, reason: &str) -> Self {
        let mut specifics = BTreeMap::new();
        specifics.insert("error".to_string(), serde_json::Value::String(reason.into()));
        Self {
            processor: processor.into(),
            confidence: 0.0,
            timestamp,
            specifics,
        }
    }
}

/// A generic cache entry: a value-or-error plus the bookkeeping needed to
/// determine expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V, E> {
    /// The cached outcome.
    pub outcome: std::result::Result<V, E>,
    /// Unix timestamp (seconds) when this entry was stored.
    pub timestamp: f64,
    /// Time-to-live in seconds.
    pub ttl: f64,
}

impl<V, E> CacheEntry<V, E> {
    /// `true` iff `now - timestamp > ttl`.
    #[must_use]
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.timestamp > self.ttl
    }
}

/// Per-source cache entry over all registered processors' [`Detection`]s.
#[derive(Debug, Clone)]
pub struct DetectionCacheEntry {
    /// Detections keyed by processor name.
    pub detections: BTreeMap<String, Detection>,
    /// Unix timestamp (seconds) when this entry was stored.
    pub timestamp: f64,
    /// Time-to-live in seconds.
    pub ttl: f64,
}

impl DetectionCacheEntry {
    /// `true` iff `now - timestamp > ttl`.
    #[must_use]
    pub fn is_expired(&self, now: f64) -> bool {
        now - self.timestamp > self.ttl
    }

    /// The highest-confidence detection with confidence `> 0`, ties broken
    /// by the order processors appear in `registration_order`.
    #[must_use]
    pub fn best_detection(&self, registration_order: &[String]) -> Option<&Detection> {
        best_detection_of(&self.detections, registration_order)
    }
}

/// The highest-confidence detection in `detections` with confidence `> 0`,
/// ties broken by the order processors appear in `registration_order`
/// (spec §4.2 "Optimal-processor selection algorithm").
#[must_use]
pub fn best_detection_of<'a>(
    detections: &'a BTreeMap<String, Detection>,
    registration_order: &[String],
) -> Option<&'a Detection> {
    let rank = |name: &str| {
        registration_order
            .iter()
            .position(|n| n == name)
            .unwrap_or(usize::MAX)
    };
    detections
        .values()
        .filter(|d| d.confidence > 0.0)
        .min_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| rank(&a.processor).cmp(&rank(&b.processor)))
        })
}

/// How a query's `name` filter should be matched against inventory objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-insensitive full-string equality.
    Exact,
    /// Case-insensitive regular expression.
    Regex,
    /// Normalized Levenshtein-ratio-style similarity, 0-100.
    Fuzzy,
}

/// Common filters and matching behavior shared by inventory and content queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBehaviors {
    /// How the query string is matched against object names.
    pub match_mode: MatchMode,
    /// Minimum fuzzy-match ratio (0-100) to keep a candidate, when `match_mode == Fuzzy`.
    pub fuzzy_threshold: u32,
}

impl Default for SearchBehaviors {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::Fuzzy,
            fuzzy_threshold: 50,
        }
    }
}

/// Equality filters applied to inventory objects before name matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryFilters {
    /// Sphinx domain (`py`, `std`, ...).
    pub domain: Option<String>,
    /// Sphinx role (`function`, `class`, ...) or Rustdoc/Pydoctor `item_type`/`type`.
    pub role: Option<String>,
    /// Sphinx priority (`0`, `1`, `-1`).
    pub priority: Option<String>,
    /// Case-insensitive substring filter on the object name (Rustdoc).
    pub name: Option<String>,
}

/// An ordinal flag controlling how much per-object work an inventory
/// processor performs while filtering. Variants are ordered
/// `Name < Signature < Summary < Documentation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryQueryDetails {
    /// Only the name and location are required.
    Name,
    /// Include the object's signature, if cheaply available.
    Signature,
    /// Include a short summary.
    Summary,
    /// Include full documentation content.
    Documentation,
}

/// A processor's self-described capabilities, returned by `survey_processors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Filter keys this processor understands (e.g. `domain`, `role`, `priority`).
    pub supported_filter_keys: Vec<String>,
    /// Approximate maximum number of results this processor can usefully return.
    pub results_limit_max: usize,
    /// A human-readable note on typical response time or other caveats.
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn possession_distinguishes_falsy_from_absent() {
        let falsy: Possession<bool> = Possession::Possessed(false);
        let absent: Possession<bool> = Possession::Absent;
        assert!(!falsy.is_absent());
        assert!(absent.is_absent());
    }

    #[test]
    fn inventory_object_rejects_empty_fields() {
        let err =
            InventoryObject::new("", "uri", InventoryType::Rustdoc, "https://x").unwrap_err();
        assert_eq!(err.category(), "InventoryInvalidity");
    }

    #[test]
    fn detection_cache_entry_breaks_ties_by_registration_order() {
        let mut detections = BTreeMap::new();
        detections.insert(
            "b".to_string(),
            Detection::new("b", 0.9, 0.0, BTreeMap::new()).unwrap(),
        );
        detections.insert(
            "a".to_string(),
            Detection::new("a", 0.9, 0.0, BTreeMap::new()).unwrap(),
        );
        let entry = DetectionCacheEntry {
            detections,
            timestamp: 0.0,
            ttl: 3600.0,
        };
        let order = vec!["a".to_string(), "b".to_string()];
        assert_eq!(entry.best_detection(&order).unwrap().processor, "a");
    }

    #[test]
    fn search_behaviors_default_matches_original_source() {
        let behaviors = SearchBehaviors::default();
        assert_eq!(behaviors.match_mode, MatchMode::Fuzzy);
        assert_eq!(behaviors.fuzzy_threshold, 50);
    }
}
