//! SVG document reader.
//!
//! Walks the XML tree recursively with an explicit per-tag [`Node`]
//! context (no shared mutable walk state), normalizing every supported
//! primitive through the tag reader into the path consumer. The walk
//! visits the children of every element, supported or not, so groups
//! and unknown containers pass their accumulated transform and style
//! down without emitting geometry themselves.

pub mod attribute_reader;
pub mod node;
pub mod path_reader;
pub mod tag_reader;

pub use node::Node;
pub use tag_reader::{SvgTag, SvgTagReader};

use std::collections::BTreeMap;
use std::sync::OnceLock;

use jobkit_core::Polyline;
use regex::Regex;
use svgtypes::{Length, LengthUnit};
use tracing::debug;

use crate::error::{ImportError, ImportResult};

use self::path_reader::SvgPathReader;

/// A raster region extracted from a source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub data: String,
    pub pos: [f64; 2],
    pub size: [f64; 2],
}

/// An 11-field pass annotation: pass number, feedrate, feed unit,
/// intensity, intensity unit, five color keys, and a trailing field.
/// Absent fields are empty strings.
pub type Lasertag = Vec<String>;

/// The intermediate result of one SVG parse, folded into a job
/// document by the assembler.
#[derive(Debug, Clone, Default)]
pub struct SvgParseResult {
    /// Boundary paths grouped by stroke color.
    pub boundarys: BTreeMap<String, Vec<Polyline>>,
    /// Source resolution, when determinable from the root element.
    pub dpi: Option<f64>,
    /// Pass annotations found in document text.
    pub lasertags: Vec<Lasertag>,
    /// Raster regions. Image tags are currently unsupported, so this
    /// reader leaves the list empty; the schema stays because the
    /// assembler consumes it.
    pub rasters: Vec<Raster>,
}

/// Reads one SVG document per call. The tolerance fixed at construction
/// scopes the curve flattening of everything this reader parses.
#[derive(Debug)]
pub struct SvgReader {
    tolerance: f64,
}

impl SvgReader {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Parses an SVG document into boundary paths, resolution and pass
    /// annotations. A forced resolution overrides detection.
    pub fn parse(&self, text: &str, forced_dpi: Option<f64>) -> ImportResult<SvgParseResult> {
        let doc =
            roxmltree::Document::parse(text).map_err(|e| ImportError::Svg(e.to_string()))?;
        let root = doc.root_element();
        if root.tag_name().name() != "svg" {
            return Err(ImportError::Svg(format!(
                "expected <svg> root, found <{}>",
                root.tag_name().name()
            )));
        }

        let dpi = forced_dpi.or_else(|| detect_dpi(&root));
        debug!(?dpi, "parsing svg document");

        let tag_reader = SvgTagReader::new();
        let mut path_reader = SvgPathReader::new(self.tolerance);
        let context = Node::root();
        for child in root.children().filter(|c| c.is_element()) {
            walk(&tag_reader, &mut path_reader, &child, &context)?;
        }

        Ok(SvgParseResult {
            boundarys: path_reader.into_boundarys(),
            dpi,
            lasertags: extract_lasertags(&doc),
            rasters: Vec::new(),
        })
    }
}

/// Visits one element and recurses into its children. Each child
/// derives its context from this element's node, so transforms and
/// style inherit even across unsupported tags.
fn walk(
    tags: &SvgTagReader,
    paths: &mut SvgPathReader,
    tag: &roxmltree::Node<'_, '_>,
    parent: &Node,
) -> ImportResult<()> {
    let mut node = parent.child();
    tags.read_tag(tag, &mut node, paths)?;
    for child in tag.children().filter(|c| c.is_element()) {
        walk(tags, paths, &child, &node)?;
    }
    Ok(())
}

/// Infers the document resolution in dots per inch from the root
/// element. Physical width units are related to the viewBox span;
/// pixel or unitless widths mean CSS pixels.
fn detect_dpi(root: &roxmltree::Node<'_, '_>) -> Option<f64> {
    let width: Length = root.attribute("width")?.trim().parse().ok()?;
    let inches = match width.unit {
        LengthUnit::In => width.number,
        LengthUnit::Mm => width.number / 25.4,
        LengthUnit::Cm => width.number / 2.54,
        LengthUnit::Pt => width.number / 72.0,
        LengthUnit::Pc => width.number / 6.0,
        LengthUnit::None | LengthUnit::Px => return Some(96.0),
        LengthUnit::Em | LengthUnit::Ex | LengthUnit::Percent => return None,
    };
    if inches <= 0.0 {
        return None;
    }
    let viewbox_width = root
        .attribute("viewBox")
        .and_then(|vb| vb.split_whitespace().nth(2)?.parse::<f64>().ok());
    match viewbox_width {
        Some(units) => Some(units / inches),
        // Without a viewBox one user unit is one CSS pixel.
        None => Some(96.0),
    }
}

/// Scans document text for `=pass` annotations.
///
/// One annotation maps a pass number, feedrate and intensity onto up to
/// five boundary colors, e.g. `=pass1:1200mm/min:70%:#ff0000:#00ee00`.
/// Each match yields exactly eleven fields.
fn extract_lasertags(doc: &roxmltree::Document<'_>) -> Vec<Lasertag> {
    static LASERTAG_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = LASERTAG_REGEX.get_or_init(|| {
        Regex::new(
            r"=pass(\d+):([0-9.]*)(mm/min|mm/sec)?:([0-9.]*)(%)?:?(#[0-9a-fA-F]+)?:?(#[0-9a-fA-F]+)?:?(#[0-9a-fA-F]+)?:?(#[0-9a-fA-F]+)?:?(#[0-9a-fA-F]+)?:?(#[0-9a-fA-F]+)?",
        )
        .expect("invalid regex pattern")
    });

    let mut tags = Vec::new();
    for text in doc.descendants().filter(|n| n.is_text()) {
        let Some(text) = text.text() else { continue };
        for caps in regex.captures_iter(text) {
            let tag: Lasertag = (1..=11)
                .map(|i| caps.get(i).map_or(String::new(), |m| m.as_str().to_string()))
                .collect();
            tags.push(tag);
        }
    }
    tags
}
