//! # JobKit
//!
//! Job importer for CNC/laser controllers. Converts vector-graphics and
//! machine-control documents into one canonical, machine-executable job
//! document:
//!
//! - **SVG** - shapes and paths normalized through nested transforms,
//!   with color-tagged pass annotations
//! - **DXF** - lines, polylines, circles and arcs
//! - **G-code** - linear motion programs
//! - **native** - job documents in their JSON wire form
//!
//! ## Architecture
//!
//! JobKit is organized as a workspace:
//!
//! 1. **jobkit-core** - job document schema, canonical path grammar,
//!    transform math
//! 2. **jobkit-import** - format classifier, readers, path optimizer,
//!    job assembler
//! 3. **jobkit** - this thin CLI binary

pub use jobkit_core::{
    Def, Head, Item, JobDocument, Pass, PathCommand, Polyline, Transform, ValidationError,
    VectorSection,
};

pub use jobkit_import::{
    classify, convert, DxfReader, GcodeReader, ImportError, ImportResult, JobInput, JobKind,
    SvgParseResult, SvgReader,
};

/// Initialize logging for the application.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
