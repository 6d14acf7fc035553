//! Job document validation errors.

use thiserror::Error;

/// Violations of the job document's index invariants.
///
/// A well-formed document only ever references definitions and items
/// that exist: defs and items are append-only during assembly, so these
/// errors indicate a hand-edited or truncated document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An item references a def index that is not in the defs arena.
    #[error("item {item} references def {def}, but only {len} defs exist")]
    DefIndexOutOfRange { item: usize, def: usize, len: usize },

    /// A pass references an item index that is not in the items list.
    #[error("pass {pass} references item {item}, but only {len} items exist")]
    ItemIndexOutOfRange {
        pass: usize,
        item: usize,
        len: usize,
    },
}
