//! # JobKit Import
//!
//! The import pipeline: detects the format of an incoming document
//! (native job JSON, SVG, DXF or G-code), routes it to the matching
//! reader, and assembles the reader's output into the canonical
//! [`JobDocument`](jobkit_core::JobDocument).
//!
//! The SVG path is the interesting one: a recursive tag walk
//! accumulates nested transforms, rewrites every supported shape into
//! the canonical path-command grammar, and flattens curves to the
//! caller's tolerance while preserving the color metadata that later
//! drives pass assignment.
//!
//! Everything is synchronous and per-conversion: readers and consumers
//! are constructed for one parse and dropped after it, so independent
//! conversions can run on separate threads without coordination.

pub mod assembler;
pub mod classifier;
pub mod dxf;
pub mod error;
pub mod gcode;
pub mod optimizer;
pub mod svg;

pub use assembler::convert;
pub use classifier::{classify, JobInput, JobKind};
pub use dxf::DxfReader;
pub use error::{ImportError, ImportResult};
pub use gcode::GcodeReader;
pub use svg::{Lasertag, Raster, SvgParseResult, SvgReader};
