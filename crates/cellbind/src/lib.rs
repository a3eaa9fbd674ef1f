//! # cellbind
//!
//! Turn spreadsheet cells into a programmatic API.
//!
//! Callers declare named exports, each bound to a cell, and get back either a coerced scalar
//! or a callable that recomputes the cell's formula with substitute inputs. Compilation reads
//! only the cells the exports depend on, each exactly once, and freezes them into a
//! [`Context`] that the callables evaluate against without touching the document again.
//!
//! ## Pieces
//!
//! - [`Formula`] - formula text bound to a sheet, and the cells it reads
//! - [`ContextBuilder`] - the transitive dependency closure of a set of cells
//! - [`shared::resolve`] - per-cell text of a shared formula
//! - [`Evaluator`] / [`CompiledFunction`] - replaying a formula with overridden inputs
//! - [`Compiler`] - all of the above, driven by an [`ExportSpec`]
//!
//! ## Example
//!
//! ```rust
//! use cellbind::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", "Loan").unwrap();
//! sheet.set_cell_value("B1", 1000.0).unwrap();
//! sheet.set_cell_value("B2", 0.05).unwrap();
//! sheet.set_cell_formula("B3", "=ROUND(B1*(1+B2), 2)").unwrap();
//!
//! let spec = ExportSpec::new()
//!     .with("name", ExportEntry::text("A1"))
//!     .with("total", ExportEntry::callable("B3", ["B1", "B2"]));
//! let exports = workbook.compile(&spec).unwrap();
//!
//! assert_eq!(exports["name"].as_text(), Some("Loan"));
//! let total = exports["total"].as_callable().unwrap();
//! assert_eq!(total.invoke(&[]).unwrap(), FormulaValue::Number(1050.0));
//! assert_eq!(
//!     total.invoke(&[RawValue::Number(2000.0), RawValue::Number(0.1)]).unwrap(),
//!     FormulaValue::Number(2200.0)
//! );
//! ```

pub mod compiler;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod export;
pub mod formula;
pub mod prelude;
pub mod reader;
pub mod shared;

pub use compiler::{coerce, CompileExt, CompileOptions, Compiler, Export, Exports};
pub use context::{build_context, from_fn, CellReader, Context, ContextBuilder};
pub use error::{Error, Result};
pub use evaluator::{CompiledFunction, Evaluator, Invoke};
pub use export::{ExportEntry, ExportSpec, ExportType};
pub use formula::Formula;
pub use reader::{resolve_label, DocumentCells};

// Re-export core types
pub use cellbind_core::{
    CellError, CellValue, Column, DocumentReader, Index, Range, RawValue, Reference, RichTextRun,
    Row, Sheet, Vector, Workbook, Worksheet,
};

// Re-export formula types
pub use cellbind_formula::{FormulaError, FormulaValue};
