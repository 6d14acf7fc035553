//! Error types for the import pipeline.

use thiserror::Error;

/// Errors surfaced by format classification and job conversion.
///
/// Unsupported tags and malformed pass annotations are deliberately not
/// represented here: those are skip-with-diagnostic policies, and the
/// conversion continues without them.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The classifier could not sniff a known format.
    #[error("file type not recognized")]
    UnrecognizedFormat,

    /// A native job document failed to parse as JSON.
    #[error("malformed job document: {0}")]
    Json(#[from] serde_json::Error),

    /// The SVG reader failed on a structurally invalid document.
    #[error("SVG parse error: {0}")]
    Svg(String),

    /// The DXF reader failed on a structurally invalid document.
    #[error("DXF parse error: {0}")]
    Dxf(String),

    /// The G-code reader found no interpretable motion program.
    #[error("G-code parse error: {0}")]
    Gcode(String),
}

/// Result type alias for import operations.
pub type ImportResult<T> = Result<T, ImportError>;
