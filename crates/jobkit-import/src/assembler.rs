//! Job assembly.
//!
//! Routes a classified input to its reader and folds the reader's
//! output into the canonical job document: defs and items are appended
//! in reader order (never reordered or deleted), and pass programs are
//! derived from the lasertag annotations by matching their color keys
//! against item colors.

use jobkit_core::{Def, Item, JobDocument, Pass};
use tracing::{debug, warn};

use crate::classifier::{classify, JobInput, JobKind};
use crate::dxf::DxfReader;
use crate::error::ImportResult;
use crate::gcode::GcodeReader;
use crate::optimizer;
use crate::svg::{Lasertag, SvgReader};

/// Fields carried by a well-formed lasertag record.
const LASERTAG_FIELDS: usize = 11;

/// Converts a job input of any supported format into a job document.
///
/// `optimize` runs the path optimizer over vector geometry at
/// `tolerance`; the tolerance is stamped on the result so downstream
/// stages know how much deviation the geometry already carries. G-code
/// input is never optimized.
pub fn convert(input: JobInput, optimize: bool, tolerance: f64) -> ImportResult<JobDocument> {
    let kind = classify(&input)?;
    debug!(?kind, optimize, tolerance, "converting job");
    match kind {
        JobKind::Native => convert_native(input, optimize, tolerance),
        JobKind::Svg => convert_svg(&expect_text(input), optimize, tolerance),
        JobKind::Dxf => convert_dxf(&expect_text(input), optimize, tolerance),
        JobKind::Gcode => GcodeReader::new().parse(&expect_text(input)),
    }
}

/// Only called for kinds the classifier derives from text.
fn expect_text(input: JobInput) -> String {
    match input {
        JobInput::Text(text) => text,
        JobInput::Document(_) => unreachable!("non-native kind from a structured input"),
    }
}

fn convert_native(input: JobInput, optimize: bool, tolerance: f64) -> ImportResult<JobDocument> {
    let mut job = match input {
        JobInput::Document(doc) => doc,
        JobInput::Text(text) => JobDocument::from_json(&text)?,
    };
    if optimize && !job.defs.is_empty() {
        for def in &mut job.defs {
            if let Def::Path { data } = def {
                optimizer::optimize(data, tolerance);
            }
        }
        job.head.optimized = Some(tolerance);
    }
    Ok(job)
}

fn convert_svg(text: &str, optimize: bool, tolerance: f64) -> ImportResult<JobDocument> {
    let result = SvgReader::new(tolerance).parse(text, None)?;
    let mut job = JobDocument::new();

    for raster in result.rasters {
        let def = job.add_def(Def::Image {
            data: raster.data,
            pos: raster.pos,
            size: raster.size,
        });
        job.add_item(Item { def, color: None });
    }

    if let Some(dpi) = result.dpi {
        job.head.dpi = Some(dpi);
    }
    let had_boundarys = !result.boundarys.is_empty();
    for (color, mut paths) in result.boundarys {
        if optimize {
            optimizer::optimize(&mut paths, tolerance);
        }
        let def = job.add_def(Def::Path { data: paths });
        job.add_item(Item {
            def,
            color: Some(color),
        });
    }
    if optimize && had_boundarys {
        job.head.optimized = Some(tolerance);
    }

    append_passes(&mut job, result.lasertags);
    Ok(job)
}

fn convert_dxf(text: &str, optimize: bool, tolerance: f64) -> ImportResult<JobDocument> {
    let mut job = DxfReader::new(tolerance).parse(text, None)?;
    if optimize {
        if let Some(vector) = job.vector.as_mut() {
            optimizer::dxf_optimize(&mut vector.paths, tolerance);
            vector.optimized = Some(tolerance);
        }
    }
    Ok(job)
}

/// Derives the pass list from lasertag annotations.
///
/// Tags sort ascending by their pass-number field; the comparison is
/// over opaque strings, so "10" orders before "2" - an observable
/// behavior of this pipeline, kept deliberately. Each well-formed tag
/// contributes one pass covering every item whose color matches one of
/// the tag's five color fields, in item order. Colorless items never
/// match. Tags with the wrong field count are skipped.
fn append_passes(job: &mut JobDocument, mut lasertags: Vec<Lasertag>) {
    lasertags.sort_by(|a, b| a.first().cmp(&b.first()));
    for tag in lasertags {
        if tag.len() != LASERTAG_FIELDS {
            warn!(fields = tag.len(), "skipping malformed lasertag");
            continue;
        }
        let mut idxs = Vec::new();
        for color in &tag[5..10] {
            if color.is_empty() {
                continue;
            }
            for (i, item) in job.items.iter().enumerate() {
                if item.color.as_deref() == Some(color.as_str()) {
                    idxs.push(i);
                }
            }
        }
        job.passes.push(Pass {
            items: idxs,
            feedrate: tag[1].clone(),
            intensity: tag[3].clone(),
        });
    }
}
