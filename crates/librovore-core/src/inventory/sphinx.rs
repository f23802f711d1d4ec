//! Sphinx `objects.inv` inventory processor (spec §4.3 "Sphinx").

use std::collections::BTreeMap;
use std::io::Read;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::registry::{InventoryProcessor, ProcessorContext};
use crate::types::{
    Capabilities, Detection, InventoryFilters, InventoryObject, InventoryQueryDetails,
    InventoryType,
};
use crate::url;

use super::InventoryBatch;

/// A single parsed `objects.inv` record, before filtering.
struct RawEntry {
    name: String,
    domain: String,
    role: String,
    priority: String,
    uri: String,
    dispname: String,
}

/// Parses the `objects.inv` v2 wire format: four ASCII header lines
/// followed by a zlib-compressed body of
/// `name domain:role priority uri dispname` records.
fn parse_objects_inv(bytes: &[u8]) -> Result<(Option<String>, Option<String>, Vec<RawEntry>)> {
    let header_end = find_header_end(bytes)?;
    let header = std::str::from_utf8(&bytes[..header_end]).map_err(|err| Error::InventoryInvalidity {
        source: String::new(),
        cause: format!("header is not valid UTF-8: {err}"),
    })?;
    let mut project = None;
    let mut version = None;
    for line in header.lines() {
        if let Some(value) = line.strip_prefix("# Project: ") {
            project = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("# Version: ") {
            version = Some(value.trim().to_string());
        }
    }

    let compressed = &bytes[header_end..];
    let mut decoder = flate2::read::ZlibDecoder::new(compressed);
    let mut decompressed = String::new();
    decoder
        .read_to_string(&mut decompressed)
        .map_err(|err| Error::InventoryInvalidity {
            source: String::new(),
            cause: format!("zlib inflate failed: {err}"),
        })?;

    let mut entries = Vec::new();
    for line in decompressed.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(entry) = parse_entry_line(line) {
            entries.push(entry);
        }
    }
    Ok((project, version, entries))
}

fn find_header_end(bytes: &[u8]) -> Result<usize> {
    let mut newline_count = 0;
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b'\n' {
            newline_count += 1;
            if newline_count == 4 {
                return Ok(idx + 1);
            }
        }
    }
    Err(Error::InventoryInvalidity {
        source: String::new(),
        cause: "objects.inv header is truncated (fewer than 4 lines)".to_string(),
    })
}

/// Parses one decompressed body line: `name domain:role priority uri dispname`.
fn parse_entry_line(line: &str) -> Option<RawEntry> {
    let mut parts = line.splitn(5, ' ');
    let name = parts.next()?.to_string();
    let domain_role = parts.next()?;
    let (domain, role) = domain_role.split_once(':')?;
    let priority = parts.next()?.to_string();
    let uri = parts.next()?.to_string();
    let dispname = parts.next().unwrap_or("-").to_string();
    Some(RawEntry {
        name,
        domain: domain.to_string(),
        role: role.to_string(),
        priority,
        uri,
        dispname,
    })
}

fn to_inventory_object(entry: RawEntry, location_url: &str) -> Result<InventoryObject> {
    let dispname = if entry.dispname == "-" {
        entry.name.clone()
    } else {
        entry.dispname
    };
    let mut specifics = BTreeMap::new();
    specifics.insert("domain".to_string(), serde_json::Value::String(entry.domain));
    specifics.insert("role".to_string(), serde_json::Value::String(entry.role));
    specifics.insert(
        "priority".to_string(),
        serde_json::Value::String(entry.priority),
    );
    let object = InventoryObject::new(
        entry.name,
        entry.uri,
        InventoryType::SphinxObjectsInv,
        location_url,
    )?
    .with_display_name(dispname)
    .with_specifics(specifics);
    Ok(object)
}

/// Processes Sphinx `objects.inv` inventories.
pub struct SphinxInventoryProcessor;

impl SphinxInventoryProcessor {
    /// Constructs the Sphinx inventory processor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for SphinxInventoryProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InventoryProcessor for SphinxInventoryProcessor {
    fn name(&self) -> &str {
        "sphinx"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supported_filter_keys: vec!["domain".into(), "role".into(), "priority".into()],
            results_limit_max: 10_000,
            notes: "Parses objects.inv, the Sphinx intersphinx inventory format".to_string(),
        }
    }

    async fn detect(&self, ctx: &ProcessorContext, source: &str) -> Detection {
        let base_url = url::normalize_base_url(source);
        let inventory_url = url::derive_inventory_url(&base_url);
        match ctx.cache.probe(&inventory_url).await {
            Ok(true) => {
                Detection::new(self.name(), 0.9, crate::utils::now_seconds(), BTreeMap::new())
                    .unwrap_or_else(|_| Detection::rejected(self.name(), crate::utils::now_seconds(), "invalid confidence"))
            },
            Ok(false) => Detection::rejected(self.name(), crate::utils::now_seconds(), "objects.inv absent"),
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
        let inventory_url = url::derive_inventory_url(&base_url);
        let bytes = ctx
            .cache
            .retrieve(&inventory_url)
            .await
            .map_err(|err| Error::InventoryInaccessibility {
                source: inventory_url.clone(),
                cause: err.to_string(),
            })?;
        let (project, version, entries) = parse_objects_inv(&bytes)?;
        let mut objects = Vec::new();
        for entry in entries {
            if let Some(domain) = &filters.domain {
                if &entry.domain != domain {
                    continue;
                }
            }
            if let Some(role) = &filters.role {
                if &entry.role != role {
                    continue;
                }
            }
            if let Some(priority) = &filters.priority {
                if &entry.priority != priority {
                    continue;
                }
            }
            objects.push(to_inventory_object(entry, &inventory_url)?);
        }
        Ok(InventoryBatch {
            objects,
            project,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_objects_inv(project: &str, version: &str, body: &str) -> Vec<u8> {
        let header = format!(
            "# Sphinx inventory version 2\n# Project: {project}\n# Version: {version}\n\
             # The remainder of this file is compressed using zlib.\n"
        );
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();
        let mut bytes = header.into_bytes();
        bytes.extend(compressed);
        bytes
    }

    #[test]
    fn parses_entries_and_normalizes_dispname() {
        let body = "foo.Bar py:class 1 api/$.html -\nfoo.baz py:function 1 api/$.html Foo Baz\n";
        let bytes = build_objects_inv("myproj", "1.0", body);
        let (project, version, entries) = parse_objects_inv(&bytes).unwrap();
        assert_eq!(project.as_deref(), Some("myproj"));
        assert_eq!(version.as_deref(), Some("1.0"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "foo.Bar");
        assert_eq!(entries[0].dispname, "-");
        assert_eq!(entries[1].dispname, "Foo Baz");
    }

    #[test]
    fn truncated_header_is_invalid() {
        let err = parse_objects_inv(b"only one line\n").unwrap_err();
        assert_eq!(err.category(), "InventoryInvalidity");
    }
}
