//! # JobKit Core
//!
//! Core types for the JobKit import pipeline: the canonical job document
//! schema consumed by the machine-program generator, the canonical
//! path-command grammar shared by every supported drawing primitive, and
//! the 2D affine transform math used to normalize nested coordinate
//! systems.
//!
//! Everything in this crate is a plain in-memory value: no I/O, no global
//! state. Two conversions can run on separate threads without
//! coordination as long as each owns its own document.

pub mod error;
pub mod job;
pub mod path;
pub mod transform;

pub use error::ValidationError;
pub use job::{Def, Head, Item, JobDocument, Pass, Polyline, VectorSection};
pub use path::PathCommand;
pub use transform::Transform;
