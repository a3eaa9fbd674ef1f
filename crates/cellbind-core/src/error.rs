//! Error types for cellbind-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cellbind-core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed coordinate label
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A range whose two ends live on different sheets
    #[error("Cross-sheet range is not allowed: {start}:{end}")]
    CrossSheetRange { start: String, end: String },

    /// Index smaller than its declared base
    #[error("Index {index} should not be less than the base {base}")]
    IndexBelowBase { index: i64, base: u32 },

    /// Sheet id out of bounds
    #[error("Sheet {0} out of bounds (count: {1})")]
    SheetOutOfBounds(usize, usize),

    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Merged region overlapping an existing one
    #[error("Cell {0} is already part of a merged region")]
    MergedCellConflict(String),
}
