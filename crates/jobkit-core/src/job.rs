//! Canonical job document schema.
//!
//! The job document is the single machine-executable description every
//! import format converges to: reusable geometry/image definitions
//! (`defs`), placed references to them (`items`), and ordered cut/etch
//! passes grouping items with shared feedrate and intensity.
//!
//! Geometry is referenced by integer index rather than by pointer: defs
//! and items are append-only arenas, so an index, once handed out, stays
//! valid for the life of the document and the whole structure serializes
//! trivially.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A flattened path: a chain of `[x, y]` vertices.
pub type Polyline = Vec<[f64; 2]>;

/// Document-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Head {
    /// Source resolution in dots per inch, when the reader reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dpi: Option<f64>,

    /// Tolerance used when the geometry was optimized, absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized: Option<f64>,
}

/// One reusable geometry or image definition.
///
/// A def's identity is its index in [`JobDocument::defs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Def {
    /// Boundary geometry: a set of flattened paths.
    Path { data: Vec<Polyline> },
    /// A raster region with its payload, position and size.
    Image {
        data: String,
        pos: [f64; 2],
        size: [f64; 2],
    },
}

/// A placed reference to a def, optionally tagged with the source color
/// used for pass assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub def: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One cut/etch pass: the items it covers and the machine settings they
/// share. Feedrate and intensity are carried verbatim from the source
/// annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pass {
    pub items: Vec<usize>,
    pub feedrate: String,
    pub intensity: String,
}

/// Legacy vector section produced by the DXF reader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorSection {
    pub paths: Vec<Polyline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized: Option<f64>,
}

/// The canonical job document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDocument {
    #[serde(default)]
    pub head: Head,
    #[serde(default)]
    pub defs: Vec<Def>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub passes: Vec<Pass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<VectorSection>,
}

impl JobDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a def and returns its index.
    pub fn add_def(&mut self, def: Def) -> usize {
        self.defs.push(def);
        self.defs.len() - 1
    }

    /// Appends an item and returns its index.
    pub fn add_item(&mut self, item: Item) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    /// Checks the index invariants: every item references an existing
    /// def and every pass references existing items.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (i, item) in self.items.iter().enumerate() {
            if item.def >= self.defs.len() {
                return Err(ValidationError::DefIndexOutOfRange {
                    item: i,
                    def: item.def,
                    len: self.defs.len(),
                });
            }
        }
        for (p, pass) in self.passes.iter().enumerate() {
            for &idx in &pass.items {
                if idx >= self.items.len() {
                    return Err(ValidationError::ItemIndexOutOfRange {
                        pass: p,
                        item: idx,
                        len: self.items.len(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Parses a document from its JSON wire form.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serializes the document to its JSON wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
