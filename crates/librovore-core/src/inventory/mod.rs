//! Format-specific inventory processors (spec §4.3): Sphinx `objects.inv`,
//! Pydoctor `searchindex.json`, Rustdoc `all.html`, and MkDocs.

/// Sphinx `objects.inv` inventory processor.
pub mod sphinx;

/// Pydoctor `searchindex.json` inventory processor.
pub mod pydoctor;

/// Rustdoc `all.html` inventory processor.
pub mod rustdoc;

/// MkDocs inventory processor (delegates to Sphinx).
pub mod mkdocs;

use crate::types::InventoryObject;

/// The result of filtering an inventory: the matching objects plus any
/// project/version metadata the format carries (spec §4.6 `query_inventory`
/// "project/version metadata, if the inventory carried it").
#[derive(Debug, Clone, Default)]
pub struct InventoryBatch {
    /// The filtered objects.
    pub objects: Vec<InventoryObject>,
    /// The inventory's declared project name, if any.
    pub project: Option<String>,
    /// The inventory's declared version, if any.
    pub version: Option<String>,
}

impl InventoryBatch {
    /// Wraps a plain object list with no project/version metadata.
    #[must_use]
    pub fn from_objects(objects: Vec<InventoryObject>) -> Self {
        Self {
            objects,
            project: None,
            version: None,
        }
    }
}
