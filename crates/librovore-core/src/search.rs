//! The unified exact/regex/fuzzy name-matching search engine (spec §4.5).

use regex::RegexBuilder;

use crate::error::{Error, Result};
use crate::types::{InventoryObject, MatchMode, SearchResult};

/// Filters `objects` by matching `query` against each object's `name`
/// according to `match_mode`, producing [`SearchResult`]s ordered by score
/// descending, ties broken by name ascending.
pub fn filter_by_name(
    objects: Vec<InventoryObject>,
    query: &str,
    match_mode: MatchMode,
    fuzzy_threshold: u32,
) -> Result<Vec<SearchResult>> {
    let mut results = match match_mode {
        MatchMode::Exact => filter_exact(objects, query)?,
        MatchMode::Regex => filter_regex(objects, query)?,
        MatchMode::Fuzzy => filter_fuzzy(objects, query, fuzzy_threshold)?,
    };
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.object.name.cmp(&b.object.name))
    });
    Ok(results)
}

fn filter_exact(objects: Vec<InventoryObject>, query: &str) -> Result<Vec<SearchResult>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let query_lower = query.to_lowercase();
    objects
        .into_iter()
        .filter(|object| object.name.to_lowercase() == query_lower)
        .map(|object| SearchResult::new(object, 1.0, vec!["exact name".to_string()]))
        .collect()
}

fn filter_regex(objects: Vec<InventoryObject>, query: &str) -> Result<Vec<SearchResult>> {
    let pattern = RegexBuilder::new(query)
        .case_insensitive(true)
        .build()
        .map_err(|err| Error::InventoryFilterInvalidity {
            message: format!("invalid regex {query:?}: {err}"),
        })?;
    objects
        .into_iter()
        .filter(|object| pattern.is_match(&object.name))
        .map(|object| SearchResult::new(object, 1.0, vec!["regex match".to_string()]))
        .collect()
}

fn filter_fuzzy(
    objects: Vec<InventoryObject>,
    query: &str,
    fuzzy_threshold: u32,
) -> Result<Vec<SearchResult>> {
    if query.is_empty() {
        return objects
            .into_iter()
            .map(|object| SearchResult::new(object, 1.0, vec!["empty query".to_string()]))
            .collect();
    }
    let query_lower = query.to_lowercase();
    let mut results = Vec::new();
    for object in objects {
        let ratio = fuzzy_ratio(&query_lower, &object.name.to_lowercase());
        if ratio < fuzzy_threshold {
            continue;
        }
        let score = f64::from(ratio) / 100.0;
        let reason = format!("fuzzy match ({ratio})");
        results.push(SearchResult::new(object, score, vec![reason])?);
    }
    Ok(results)
}

/// Normalized Levenshtein-ratio-style similarity between `a` and `b`, scaled
/// to an integer in `[0, 100]`.
#[must_use]
pub fn fuzzy_ratio(a: &str, b: &str) -> u32 {
    let ratio = strsim::normalized_levenshtein(a, b);
    (ratio * 100.0).round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InventoryType;

    fn obj(name: &str) -> InventoryObject {
        InventoryObject::new(name, "x.html", InventoryType::SphinxObjectsInv, "https://x").unwrap()
    }

    #[test]
    fn exact_empty_query_matches_nothing() {
        let results = filter_by_name(vec![obj("Foo")], "", MatchMode::Exact, 50).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn fuzzy_empty_query_matches_everything_at_full_score() {
        let results = filter_by_name(vec![obj("Foo"), obj("Bar")], "", MatchMode::Fuzzy, 50)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| (r.score - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn fuzzy_threshold_100_requires_exact_match() {
        let results =
            filter_by_name(vec![obj("DataObj"), obj("DataObjX")], "DataObj", MatchMode::Fuzzy, 100)
                .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].object.name, "DataObj");
    }

    #[test]
    fn regex_rejects_invalid_pattern() {
        let err = filter_by_name(vec![obj("Foo")], "(", MatchMode::Regex, 50).unwrap_err();
        assert_eq!(err.category(), "InventoryFilterInvalidity");
    }

    #[test]
    fn results_sorted_by_score_then_name() {
        let results =
            filter_by_name(vec![obj("zeta"), obj("alpha")], "", MatchMode::Fuzzy, 0).unwrap();
        assert_eq!(results[0].object.name, "alpha");
        assert_eq!(results[1].object.name, "zeta");
    }
}
