//! Pydoctor `searchindex.json` inventory processor (spec §4.3 "Pydoctor").

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::registry::{InventoryProcessor, ProcessorContext};
use crate::types::{
    Capabilities, Detection, InventoryFilters, InventoryObject, InventoryQueryDetails,
    InventoryType,
};
use crate::url;

use super::InventoryBatch;

/// Infers an object's kind from its qualified name (spec §4.3 "Pydoctor"):
/// no dots means a module, an uppercase-leading final segment means a class,
/// otherwise a function or method.
fn infer_object_type(qname: &str) -> &'static str {
    match qname.rsplit_once('.') {
        None => "module",
        Some((_, name)) => {
            if name.chars().next().is_some_and(char::is_uppercase) {
                "class"
            } else {
                "function"
            }
        },
    }
}

fn format_inventory_object(
    qname: &str,
    object_type: &str,
    version: Option<&str>,
    location_url: &str,
) -> Result<InventoryObject> {
    let uri = format!("{}.html", qname.replace('.', "/"));
    let mut specifics = BTreeMap::new();
    specifics.insert("type".to_string(), Value::String(object_type.to_string()));
    specifics.insert(
        "qualified_name".to_string(),
        Value::String(qname.to_string()),
    );
    if let Some(version) = version {
        specifics.insert(
            "searchindex_version".to_string(),
            Value::String(version.to_string()),
        );
    }
    let object = InventoryObject::new(qname, uri, InventoryType::Pydoctor, location_url)?
        .with_specifics(specifics);
    Ok(object)
}

/// Processes Pydoctor `searchindex.json` inventories.
pub struct PydoctorInventoryProcessor;

impl PydoctorInventoryProcessor {
    /// Constructs the Pydoctor inventory processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PydoctorInventoryProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryProcessor for PydoctorInventoryProcessor {
    fn name(&self) -> &str {
        "pydoctor"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supported_filter_keys: vec!["type".into()],
            results_limit_max: 10_000,
            notes: "Processes Pydoctor searchindex.json files from Python API docs".to_string(),
        }
    }

    async fn detect(&self, ctx: &ProcessorContext, source: &str) -> Detection {
        let base_url = url::normalize_base_url(source);
        let searchindex_url = url::derive_searchindex_url(&base_url);
        match ctx.cache.probe(&searchindex_url).await {
            Ok(true) => Detection::new(self.name(), 1.0, crate::utils::now_seconds(), BTreeMap::new())
                .unwrap_or_else(|_| {
                    Detection::rejected(self.name(), crate::utils::now_seconds(), "invalid confidence")
                }),
            Ok(false) => {
                Detection::rejected(self.name(), crate::utils::now_seconds(), "searchindex.json absent")
            },
            Err(err) => Detection::rejected(self.name(), crate::utils::now_seconds(), &err.to_string()),
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
        let searchindex_url = url::derive_searchindex_url(&base_url);
        let text = ctx
            .cache
            .retrieve_as_text(&searchindex_url, "utf-8")
            .await
            .map_err(|err| Error::InventoryInaccessibility {
                source: searchindex_url.clone(),
                cause: err.to_string(),
            })?;
        let searchindex: Value =
            serde_json::from_str(&text).map_err(|err| Error::InventoryInvalidity {
                source: searchindex_url.clone(),
                cause: err.to_string(),
            })?;
        let version = searchindex.get("version").and_then(Value::as_str);
        let type_filter = filters.role.as_deref();
        let mut objects = Vec::new();
        if let Some(field_vectors) = searchindex.get("fieldVectors").and_then(Value::as_array) {
            for entry in field_vectors {
                let Some(array) = entry.as_array() else { continue };
                let Some(field_name) = array.first().and_then(Value::as_str) else {
                    continue;
                };
                let Some(qname) = field_name.strip_prefix("qname/") else {
                    continue;
                };
                if qname.is_empty() {
                    continue;
                }
                let object_type = infer_object_type(qname);
                if let Some(type_filter) = type_filter {
                    if object_type != type_filter {
                        continue;
                    }
                }
                objects.push(format_inventory_object(
                    qname,
                    object_type,
                    version,
                    &searchindex_url,
                )?);
            }
        }
        Ok(InventoryBatch {
            objects,
            project: None,
            version: version.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_module_class_and_function() {
        assert_eq!(infer_object_type("pkg"), "module");
        assert_eq!(infer_object_type("pkg.Widget"), "class");
        assert_eq!(infer_object_type("pkg.widget.build"), "function");
    }

    #[test]
    fn formats_uri_from_dotted_qname() {
        let object = format_inventory_object("pkg.Widget", "class", Some("1.0"), "https://x").unwrap();
        assert_eq!(object.uri, "pkg/Widget.html");
        assert_eq!(object.specific_str("type"), Some("class"));
    }
}
