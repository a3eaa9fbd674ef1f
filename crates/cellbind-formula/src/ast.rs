//! Formula Abstract Syntax Tree types

use cellbind_core::{Axis, CellError, Column, Reference, Row, Sheet};
use std::fmt;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// Error literal
    Error(CellError),

    // === References ===
    /// Single cell reference
    CellRef(CellReference),
    /// Range reference
    RangeRef(RangeReference),
    /// Named range or defined name
    NameRef(String),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },

    // === Array ===
    Array(Vec<Vec<FormulaExpr>>),
}

/// Byte offsets of a token in the formula text it was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The covered slice of `text`
    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

/// Sheet qualifier written in front of a reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetQualifier {
    /// Numeric sheet id (`2!A1`)
    Id(Sheet),
    /// Sheet name, quoted or not (`Data!A1`, `'My Data'!A1`)
    Name(String),
}

impl SheetQualifier {
    /// Text to put in front of a cell label, including the `!`
    pub fn prefix(&self) -> String {
        match self {
            SheetQualifier::Id(sheet) => sheet.label(),
            SheetQualifier::Name(name) if needs_quotes(name) => {
                format!("'{}'!", name.replace('\'', "''"))
            }
            SheetQualifier::Name(name) => format!("{}!", name),
        }
    }
}

fn needs_quotes(name: &str) -> bool {
    name.is_empty()
        || name.starts_with(|c: char| c.is_ascii_digit())
        || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

impl fmt::Display for SheetQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix())
    }
}

/// Cell reference with optional sheet.
///
/// Column and row keep the `$` markers of the source text; `span` covers the whole token,
/// sheet qualifier included.
#[derive(Debug, Clone, PartialEq)]
pub struct CellReference {
    pub sheet: Option<SheetQualifier>,
    pub column: Column,
    pub row: Row,
    pub span: Span,
}

impl CellReference {
    /// Absolute reference on `sheet`, ignoring any qualifier in the token
    pub fn on_sheet(&self, sheet: Sheet) -> Reference {
        Reference::new(sheet, self.column, self.row)
    }

    /// Token text without the sheet qualifier, markers preserved (`$A1`)
    pub fn address(&self) -> String {
        address_label(&self.column, &self.row)
    }
}

/// Range reference with optional sheet.
///
/// An unqualified end shares the start's sheet. `span` covers `start:end` in full.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeReference {
    pub start: CellReference,
    pub end: CellReference,
    pub span: Span,
}

impl RangeReference {
    /// Sheet qualifier of the range, taken from whichever end carries one
    pub fn sheet(&self) -> Option<&SheetQualifier> {
        self.start.sheet.as_ref().or(self.end.sheet.as_ref())
    }
}

/// Render a column/row pair with their `$` markers
pub fn address_label(column: &Column, row: &Row) -> String {
    format!(
        "{}{}{}{}",
        if column.is_absolute() { "$" } else { "" },
        column.letters(),
        if row.is_absolute() { "$" } else { "" },
        row.number()
    )
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,

    // Range
    Range,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Percent,
}
