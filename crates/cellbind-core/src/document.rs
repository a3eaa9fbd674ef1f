//! The read-only document interface

use crate::cell::CellValue;
use crate::coord::{Reference, Sheet};

/// Read access to a spreadsheet document.
///
/// Sheets are addressed by 1-based id. `cell` returns `None` only when the coordinate cannot
/// be resolved at all (e.g. the sheet does not exist); an existing but blank cell is
/// [`CellValue::Empty`]. Members of merged regions report their master's value.
pub trait DocumentReader {
    /// Number of sheets in the document
    fn sheet_count(&self) -> usize;

    /// Id of the sheet with the given name
    fn sheet_id(&self, name: &str) -> Option<Sheet>;

    /// Cell at an absolute reference
    fn cell(&self, reference: &Reference) -> Option<CellValue>;
}

impl<T: DocumentReader + ?Sized> DocumentReader for &T {
    fn sheet_count(&self) -> usize {
        (**self).sheet_count()
    }

    fn sheet_id(&self, name: &str) -> Option<Sheet> {
        (**self).sheet_id(name)
    }

    fn cell(&self, reference: &Reference) -> Option<CellValue> {
        (**self).cell(reference)
    }
}
