//! Cell-related types
//!
//! This module contains:
//! - [`CellValue`] - A cell as reported by a document reader
//! - [`RawValue`] - A cell's content once resolved, as stored in a context
//! - [`CellError`] - Spreadsheet error codes (`#DIV/0!`, `#REF!`, ...)

mod value;

pub use value::{date_to_serial, CellError, CellValue, RawValue, RichTextRun};
