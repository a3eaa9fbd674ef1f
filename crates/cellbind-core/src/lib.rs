//! # cellbind-core
//!
//! Core data structures for the cellbind spreadsheet compiler.
//!
//! This crate provides the fundamental types used throughout cellbind:
//! - [`Reference`], [`Range`] and [`Vector`] - Absolute coordinates and the algebra on them
//! - [`CellValue`] - Cells as reported by a document reader
//! - [`RawValue`] - Resolved cell content (literal or formula text)
//! - [`DocumentReader`] - Read access to a document
//! - [`Workbook`], [`Worksheet`] - An in-memory document
//!
//! ## Example
//!
//! ```rust
//! use cellbind_core::{CellValue, DocumentReader, Reference, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", 42.0).unwrap();
//! sheet.set_cell_formula("B1", "=A1*2").unwrap();
//!
//! let a1 = Reference::parse("1!A1").unwrap();
//! assert_eq!(workbook.cell(&a1), Some(CellValue::Number(42.0)));
//! ```

pub mod cell;
pub mod coord;
pub mod document;
pub mod error;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{date_to_serial, CellError, CellValue, RawValue, RichTextRun};
pub use coord::{
    column_to_letters, letters_to_column, Axis, Column, Index, Range, RangeIter, Reference, Row,
    Sheet, Vector,
};
pub use document::DocumentReader;
pub use error::{Error, Result};
pub use workbook::Workbook;
pub use worksheet::{MergedRegion, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
