//! Reference visitation and rewriting
//!
//! Both entry points parse the formula afresh and take their callbacks as arguments, so no
//! state is shared between calls.

use crate::ast::{CellReference, FormulaExpr, RangeReference, Span};
use crate::error::FormulaResult;
use crate::parser::parse_formula;
use std::cell::RefCell;

/// Walk every reference of a formula in text order.
///
/// `on_cell` fires once per single-cell token, `on_range` once per range token. The two ends
/// of a range are reported only through `on_range`.
///
/// # Example
/// ```rust
/// use cellbind_formula::visit_references;
///
/// let mut cells = Vec::new();
/// let mut ranges = Vec::new();
/// visit_references(
///     "=SUM(A1:B2)+C3",
///     |cell| cells.push(cell.address()),
///     |range| ranges.push((range.start.address(), range.end.address())),
/// )
/// .unwrap();
///
/// assert_eq!(cells, ["C3"]);
/// assert_eq!(ranges, [("A1".to_string(), "B2".to_string())]);
/// ```
pub fn visit_references<C, R>(text: &str, mut on_cell: C, mut on_range: R) -> FormulaResult<()>
where
    C: FnMut(&CellReference),
    R: FnMut(&RangeReference),
{
    let expr = parse_formula(text)?;
    walk(&expr, &mut on_cell, &mut on_range);
    Ok(())
}

fn walk<C, R>(expr: &FormulaExpr, on_cell: &mut C, on_range: &mut R)
where
    C: FnMut(&CellReference),
    R: FnMut(&RangeReference),
{
    match expr {
        FormulaExpr::CellRef(cell) => on_cell(cell),
        FormulaExpr::RangeRef(range) => on_range(range),
        FormulaExpr::BinaryOp { left, right, .. } => {
            walk(left, on_cell, on_range);
            walk(right, on_cell, on_range);
        }
        FormulaExpr::UnaryOp { operand, .. } => walk(operand, on_cell, on_range),
        FormulaExpr::Function { args, .. } => {
            for arg in args {
                walk(arg, on_cell, on_range);
            }
        }
        FormulaExpr::Array(rows) => {
            for expr in rows.iter().flatten() {
                walk(expr, on_cell, on_range);
            }
        }
        FormulaExpr::Number(_)
        | FormulaExpr::String(_)
        | FormulaExpr::Boolean(_)
        | FormulaExpr::Error(_)
        | FormulaExpr::NameRef(_) => {}
    }
}

/// Rewrite the references of a formula.
///
/// Each callback returns the replacement text for the whole token (sheet qualifier
/// included), or `None` to keep it. Everything outside the replaced spans is copied
/// verbatim, so a label that occurs twice is replaced at exactly the positions where it
/// was parsed.
///
/// # Example
/// ```rust
/// use cellbind_formula::rewrite_references;
///
/// let out = rewrite_references(
///     "=A1+A1*2",
///     |cell| Some(format!("[{}]", cell.address())),
///     |_| None,
/// )
/// .unwrap();
/// assert_eq!(out, "=[A1]+[A1]*2");
/// ```
pub fn rewrite_references<C, R>(text: &str, mut on_cell: C, mut on_range: R) -> FormulaResult<String>
where
    C: FnMut(&CellReference) -> Option<String>,
    R: FnMut(&RangeReference) -> Option<String>,
{
    let edits: RefCell<Vec<(Span, String)>> = RefCell::new(Vec::new());
    visit_references(
        text,
        |cell| {
            if let Some(replacement) = on_cell(cell) {
                edits.borrow_mut().push((cell.span, replacement));
            }
        },
        |range| {
            if let Some(replacement) = on_range(range) {
                edits.borrow_mut().push((range.span, replacement));
            }
        },
    )?;

    let mut edits = edits.into_inner();
    edits.sort_by_key(|(span, _)| span.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (span, replacement) in edits {
        out.push_str(&text[cursor..span.start]);
        out.push_str(&replacement);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}
