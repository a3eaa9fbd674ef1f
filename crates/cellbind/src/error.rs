//! Error types for cellbind

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while compiling or invoking exports.
///
/// Every variant is terminal for the operation that raised it; none of them is transient.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed coordinate label
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Range whose ends live on different sheets
    #[error("Cross-sheet range is not allowed: {start}:{end}")]
    CrossSheetRange { start: String, end: String },

    /// Index below its base, or a translation past the sheet origin
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// The document has no worksheets
    #[error("Workbook has no worksheets")]
    EmptyWorkbook,

    /// A coordinate the document cannot resolve
    #[error("Unrecognized cell: {0}")]
    UnrecognizedCell(String),

    /// A formula operand on a different sheet than the formula
    #[error("Formula {formula} depends on {operand}, which is on another sheet")]
    UnsupportedCrossSheetDependency { formula: String, operand: String },

    /// The evaluator's entry cell has no value in the context
    #[error("Entry {0} is not defined in the context")]
    EntryNotDefined(String),

    /// The formula grammar rejected or failed to evaluate an expression
    #[error("Formula error at {cell}: {message}")]
    FormulaEvaluation { cell: String, message: String },

    /// A formula that depends on itself
    #[error("Circular dependency through {0}")]
    CircularDependency(String),

    /// Export type tag that is not recognized
    #[error("Unknown export type: {0}")]
    UnknownType(String),
}

impl Error {
    /// Errors that are fixed by changing the export spec or its arguments
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidReference(_)
                | Error::CrossSheetRange { .. }
                | Error::InvalidIndex(_)
                | Error::EmptyWorkbook
                | Error::UnrecognizedCell(_)
                | Error::EntryNotDefined(_)
                | Error::UnknownType(_)
        )
    }

    /// Errors that are fixed by changing the spreadsheet
    pub fn is_computation_error(&self) -> bool {
        !self.is_input_error()
    }

    pub(crate) fn formula(cell: impl ToString, err: cellbind_formula::FormulaError) -> Self {
        match err {
            cellbind_formula::FormulaError::CircularReference(label) => {
                Error::CircularDependency(label)
            }
            other => Error::FormulaEvaluation {
                cell: cell.to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<cellbind_core::Error> for Error {
    fn from(err: cellbind_core::Error) -> Self {
        use cellbind_core::Error as Core;
        match err {
            Core::InvalidReference(label) => Error::InvalidReference(label),
            Core::CrossSheetRange { start, end } => Error::CrossSheetRange { start, end },
            Core::IndexBelowBase { .. } => Error::InvalidIndex(err.to_string()),
            Core::SheetOutOfBounds(..) | Core::SheetNotFound(_) => {
                Error::UnrecognizedCell(err.to_string())
            }
            Core::InvalidSheetName(_)
            | Core::DuplicateSheetName(_)
            | Core::MergedCellConflict(_) => Error::InvalidReference(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellbind_formula::FormulaError;

    #[test]
    fn test_core_error_conversion() {
        let err: Error = cellbind_core::Reference::parse("A1").unwrap_err().into();
        assert!(matches!(err, Error::InvalidReference(_)));

        let err: Error = cellbind_core::Index::new(0, 1).unwrap_err().into();
        assert!(matches!(err, Error::InvalidIndex(_)));
    }

    #[test]
    fn test_error_classes() {
        assert!(Error::EmptyWorkbook.is_input_error());
        assert!(Error::UnknownType("Date".into()).is_input_error());

        let err = Error::formula("1!$A$1", FormulaError::Evaluation("boom".into()));
        assert!(err.is_computation_error());
        assert_eq!(err.to_string(), "Formula error at 1!$A$1: Evaluation error: boom");

        let err = Error::formula("1!$A$1", FormulaError::CircularReference("1!$B$1".into()));
        assert_eq!(err, Error::CircularDependency("1!$B$1".into()));
    }
}
