//! Prelude module - common imports for cellbind users
//!
//! ```rust
//! use cellbind::prelude::*;
//! ```

pub use crate::{
    // Cell types
    CellError,
    CellValue,
    // Compilation
    CompileExt,
    CompileOptions,
    CompiledFunction,
    Compiler,
    Context,
    // Error types
    Error,
    Export,
    ExportEntry,
    ExportSpec,
    ExportType,
    Exports,
    FormulaValue,
    Invoke,
    RawValue,
    // Coordinates
    Range,
    Reference,
    Result,
    // Documents
    Workbook,
    Worksheet,
};
