//! # cellbind-formula
//!
//! Formula parsing, reference visitation and evaluation for cellbind.
//!
//! This crate provides:
//! - Formula parsing (text → AST) with source spans for every reference token
//! - Reference visitation and span-exact rewriting
//! - Formula evaluation (AST → value) over a caller-supplied [`ReferenceResolver`]
//! - A small library of built-in spreadsheet functions
//!
//! ## Example
//!
//! ```rust
//! use cellbind_formula::{evaluate_formula, EvaluationContext, FormulaValue};
//!
//! let value = evaluate_formula("=ROUND(10/4, 0) & \" items\"", &EvaluationContext::simple())?;
//! assert_eq!(value, FormulaValue::String("3 items".into()));
//! # Ok::<(), cellbind_formula::FormulaError>(())
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod visit;

pub use ast::{
    BinaryOperator, CellReference, FormulaExpr, RangeReference, SheetQualifier, Span,
    UnaryOperator,
};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, evaluate_formula, EvaluationContext, FormulaValue, ReferenceResolver};
pub use parser::parse_formula;
pub use visit::{rewrite_references, visit_references};
