//! Rectangular ranges of references

use crate::coord::{Axis, Reference};
use crate::error::{Error, Result};
use std::fmt;

/// A rectangular span between two references on one sheet.
///
/// Bounds given in reverse order are normalized so `start` is the top-left corner and
/// `end` the bottom-right one; `B2:A1` covers the same cells as `A1:B2`.
///
/// # Examples
/// ```
/// use cellbind_core::Range;
///
/// let range = Range::from_labels("1!A1", "1!C2").unwrap();
/// let cells: Vec<String> = range.to_vec().iter().map(|r| r.a1()).collect();
/// assert_eq!(cells, ["A1", "B1", "C1", "A2", "B2", "C2"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    start: Reference,
    end: Reference,
}

impl Range {
    /// Create a range, failing if the two ends live on different sheets
    pub fn new(start: Reference, end: Reference) -> Result<Self> {
        if start.sheet() != end.sheet() {
            return Err(Error::CrossSheetRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let sheet = start.sheet();
        let (start_col, end_col) = ordered(start.col_index(), end.col_index());
        let (start_row, end_row) = ordered(start.row_index(), end.row_index());

        Ok(Self {
            start: Reference::from_indices(sheet, start_col, start_row),
            end: Reference::from_indices(sheet, end_col, end_row),
        })
    }

    /// Parse both ends from reference labels
    pub fn from_labels(start: &str, end: &str) -> Result<Self> {
        Self::new(Reference::parse(start)?, Reference::parse(end)?)
    }

    /// Top-left corner
    pub fn start(&self) -> Reference {
        self.start
    }

    /// Bottom-right corner
    pub fn end(&self) -> Reference {
        self.end
    }

    /// Number of rows covered
    pub fn row_count(&self) -> u32 {
        self.end.row_index() - self.start.row_index() + 1
    }

    /// Number of columns covered
    pub fn col_count(&self) -> u32 {
        self.end.col_index() - self.start.col_index() + 1
    }

    /// Total number of cells covered
    pub fn cell_count(&self) -> u64 {
        u64::from(self.row_count()) * u64::from(self.col_count())
    }

    /// Check if a reference lies inside the range
    pub fn contains(&self, reference: &Reference) -> bool {
        reference.sheet() == self.start.sheet()
            && reference.row_index() >= self.start.row_index()
            && reference.row_index() <= self.end.row_index()
            && reference.col_index() >= self.start.col_index()
            && reference.col_index() <= self.end.col_index()
    }

    /// Iterate over every contained reference in row-major order
    pub fn iter(&self) -> RangeIter {
        RangeIter {
            range: *self,
            current_row: self.start.row_index(),
            current_col: self.start.col_index(),
            remaining: self.cell_count(),
        }
    }

    /// Every contained reference, row-major
    pub fn to_vec(&self) -> Vec<Reference> {
        self.iter().collect()
    }

    /// Contained references grouped by row
    pub fn to_table(&self) -> Vec<Vec<Reference>> {
        let sheet = self.start.sheet();
        (self.start.row_index()..=self.end.row_index())
            .map(|row| {
                (self.start.col_index()..=self.end.col_index())
                    .map(|col| Reference::from_indices(sheet, col, row))
                    .collect()
            })
            .collect()
    }

    /// Label such as `$A$1:$C$2`
    pub fn label(&self) -> String {
        format!("{}:{}", self.start.label(), self.end.label())
    }
}

fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start.sheet().label(), self.label())
    }
}

impl IntoIterator for Range {
    type Item = Reference;
    type IntoIter = RangeIter;

    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

/// Iterator over the references of a range
pub struct RangeIter {
    range: Range,
    current_row: u32,
    current_col: u32,
    remaining: u64,
}

impl Iterator for RangeIter {
    type Item = Reference;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let reference =
            Reference::from_indices(self.range.start.sheet(), self.current_col, self.current_row);
        self.remaining -= 1;

        // Move to next cell
        self.current_col += 1;
        if self.current_col > self.range.end.col_index() {
            self.current_col = self.range.start.col_index();
            self.current_row += 1;
        }

        Some(reference)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RangeIter {}
