//! Job input format detection.
//!
//! Sniffs the leading 1024 characters of a raw document to route it to
//! the right reader. The markers are substring heuristics, not grammar
//! checks: a crafted SVG carrying `SECTION`/`HEADER` in a comment can
//! misclassify. The native check runs first so a structured document
//! whose first non-whitespace character is `{` is never mistaken for
//! anything else.

use jobkit_core::JobDocument;

use crate::error::{ImportError, ImportResult};

/// Number of leading characters inspected by the sniffer.
const SNIFF_WINDOW: usize = 1024;

/// A conversion input: an already-structured job document or raw text.
#[derive(Debug, Clone)]
pub enum JobInput {
    Document(JobDocument),
    Text(String),
}

impl From<JobDocument> for JobInput {
    fn from(doc: JobDocument) -> Self {
        JobInput::Document(doc)
    }
}

impl From<String> for JobInput {
    fn from(text: String) -> Self {
        JobInput::Text(text)
    }
}

impl From<&str> for JobInput {
    fn from(text: &str) -> Self {
        JobInput::Text(text.to_string())
    }
}

/// The detected kind of a job input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Native,
    Svg,
    Dxf,
    Gcode,
}

const GCODE_MARKERS: [&str; 8] = ["G0", "G1", "G00", "G01", "g0", "g1", "g00", "g01"];

/// Determines the kind of a job input.
///
/// Already-structured documents are native by definition. Raw text is
/// classified from its first [`SNIFF_WINDOW`] characters with leading
/// whitespace stripped; inputs matching no marker fail with
/// [`ImportError::UnrecognizedFormat`].
pub fn classify(input: &JobInput) -> ImportResult<JobKind> {
    let text = match input {
        JobInput::Document(_) => return Ok(JobKind::Native),
        JobInput::Text(text) => text,
    };

    let window_end = text
        .char_indices()
        .nth(SNIFF_WINDOW)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let header = text[..window_end].trim_start();

    if header.starts_with('{') {
        Ok(JobKind::Native)
    } else if header.contains("<?xml") && header.contains("<svg") {
        Ok(JobKind::Svg)
    } else if header.contains("SECTION") && header.contains("HEADER") {
        Ok(JobKind::Dxf)
    } else if GCODE_MARKERS.iter().any(|m| header.contains(m)) {
        Ok(JobKind::Gcode)
    } else {
        Err(ImportError::UnrecognizedFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_document_is_native() {
        let input = JobInput::from(JobDocument::new());
        assert_eq!(classify(&input).unwrap(), JobKind::Native);
    }

    #[test]
    fn brace_prefix_is_native() {
        let input = JobInput::from("  \n\t{\"defs\":[]}");
        assert_eq!(classify(&input).unwrap(), JobKind::Native);
    }

    #[test]
    fn xml_and_svg_markers_classify_as_svg() {
        let input = JobInput::from("<?xml version=\"1.0\"?>\n<svg></svg>");
        assert_eq!(classify(&input).unwrap(), JobKind::Svg);
    }

    #[test]
    fn svg_without_xml_declaration_is_not_svg() {
        let input = JobInput::from("<svg></svg>");
        assert!(matches!(
            classify(&input),
            Err(ImportError::UnrecognizedFormat)
        ));
    }

    #[test]
    fn dxf_markers_classify_as_dxf() {
        let input = JobInput::from("0\nSECTION\n2\nHEADER\n0\nENDSEC\n");
        assert_eq!(classify(&input).unwrap(), JobKind::Dxf);
    }

    #[test]
    fn motion_tokens_classify_as_gcode() {
        for text in ["G0 X1 Y1", "g1 x5", "N10 G00 Z0", "G01 X2.5 Y0"] {
            let input = JobInput::from(text);
            assert_eq!(classify(&input).unwrap(), JobKind::Gcode, "{text}");
        }
    }

    #[test]
    fn native_wins_over_incidental_markers() {
        // A native document mentioning G1 in a field must stay native.
        let input = JobInput::from("{\"note\":\"G1 SECTION HEADER <svg\"}");
        assert_eq!(classify(&input).unwrap(), JobKind::Native);
    }

    #[test]
    fn markers_outside_the_window_are_not_seen() {
        let mut text = " ".repeat(2000);
        text.push_str("<?xml <svg");
        assert!(matches!(
            classify(&JobInput::from(text)),
            Err(ImportError::UnrecognizedFormat)
        ));
    }

    #[test]
    fn unknown_input_is_rejected() {
        for text in ["", "   ", "hello world", "PNG\u{89}"] {
            assert!(matches!(
                classify(&JobInput::from(text)),
                Err(ImportError::UnrecognizedFormat)
            ));
        }
    }
}
