//! Shared-formula resolution
//!
//! A shared formula is stored once on its master cell; the other members only record the
//! master's position. Each member's own formula is the master text with every relative
//! operand translated by the member's offset from the master.

use crate::error::Result;
use cellbind_core::{Axis, Column, Index, Reference, Row, Vector, MAX_COLS, MAX_ROWS};
use cellbind_formula::{ast::address_label, rewrite_references, CellReference, Span};

/// Written in place of an operand shifted off the sheet
const REF_ERROR: &str = "#REF!";

/// Rewrite the master formula `master` (anchored at `anchor`) for the member cell `target`.
///
/// Axes marked absolute with `$` stay put. Text outside reference tokens, including sheet
/// qualifiers, is kept verbatim.
///
/// # Example
/// ```rust
/// use cellbind::{shared, Reference};
///
/// let anchor = Reference::parse("1!B2").unwrap();
/// let target = Reference::parse("1!B3").unwrap();
/// assert_eq!(shared::resolve("=A1+$B$1", &anchor, &target).unwrap(), "=A2+$B$1");
/// ```
pub fn resolve(master: &str, anchor: &Reference, target: &Reference) -> Result<String> {
    let delta = Vector::between(target, anchor);
    if delta.is_zero() {
        return Ok(master.to_string());
    }

    let resolved = rewrite_references(
        master,
        |cell| {
            let shifted = shift(cell, delta)?;
            Some(render(master, cell.span, &shifted))
        },
        |range| {
            let (start, end) = match (shift(&range.start, delta), shift(&range.end, delta)) {
                (None, None) => return None,
                (start, end) => (
                    start.unwrap_or_else(|| range.start.address()),
                    end.unwrap_or_else(|| range.end.address()),
                ),
            };
            if start == REF_ERROR || end == REF_ERROR {
                return Some(REF_ERROR.to_string());
            }
            Some(format!(
                "{}{}{}",
                render(master, range.start.span, &start),
                &master[range.start.span.end..range.end.span.start],
                render(master, range.end.span, &end),
            ))
        },
    )
    .map_err(|e| crate::error::Error::formula(anchor, e))?;

    log::trace!("shared formula {} at {} resolved for {}: {}", master, anchor, target, resolved);
    Ok(resolved)
}

/// New address text for a token, `None` when nothing moves
fn shift(cell: &CellReference, delta: Vector) -> Option<String> {
    let column_moves = !cell.column.is_absolute() && delta.col_offset() != 0;
    let row_moves = !cell.row.is_absolute() && delta.row_offset() != 0;
    if !column_moves && !row_moves {
        return None;
    }

    let column = if column_moves {
        match translate(cell.column.index(), delta.col_offset(), MAX_COLS) {
            Some(index) => Column::with_absolute(index, false),
            None => return Some(REF_ERROR.to_string()),
        }
    } else {
        cell.column
    };
    let row = if row_moves {
        match translate(cell.row.index(), delta.row_offset(), MAX_ROWS) {
            Some(index) => Row::with_absolute(index, false),
            None => return Some(REF_ERROR.to_string()),
        }
    } else {
        cell.row
    };

    Some(address_label(&column, &row))
}

fn translate(index: Index, delta: i64, limit: u32) -> Option<Index> {
    index.offset(delta).ok().filter(|moved| moved.base0() < limit)
}

/// Keep the token's sheet qualifier, swap its address
fn render(text: &str, span: Span, address: &str) -> String {
    if address == REF_ERROR {
        return REF_ERROR.to_string();
    }
    let token = span.slice(text);
    let qualifier_len = token.rfind('!').map_or(0, |i| i + 1);
    format!("{}{}", &token[..qualifier_len], address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolve_at(master: &str, anchor: &str, target: &str) -> String {
        resolve(
            master,
            &Reference::parse(anchor).unwrap(),
            &Reference::parse(target).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_relative_tokens_move() {
        assert_eq!(resolve_at("=A1+B1", "1!B2", "1!B3"), "=A2+B2");
        assert_eq!(resolve_at("=A1+B1", "1!B2", "1!D2"), "=C1+D1");
    }

    #[test]
    fn test_absolute_axes_stay() {
        assert_eq!(resolve_at("=A1+$B$1", "1!B2", "1!B3"), "=A2+$B$1");
        assert_eq!(resolve_at("=$A1*A$1", "1!B2", "1!C3"), "=$A2*B$1");
    }

    #[test]
    fn test_same_cell_is_identity() {
        assert_eq!(resolve_at("=SUM( A1 : A3 )", "1!B2", "1!B2"), "=SUM( A1 : A3 )");
    }

    #[test]
    fn test_ranges_and_qualifiers() {
        assert_eq!(
            resolve_at("=SUM(A1:A3)*Data!C1", "1!B1", "1!B2"),
            "=SUM(A2:A4)*Data!C2"
        );
        assert_eq!(
            resolve_at("=SUM('My Data'!A1 : $A$3)", "1!B1", "1!B3"),
            "=SUM('My Data'!A3 : $A$3)"
        );
    }

    #[test]
    fn test_repeated_label_replaced_once_each() {
        assert_eq!(resolve_at("=A1+A1+\"A1\"", "1!A1", "1!A2"), "=A2+A2+\"A1\"");
        assert_eq!(resolve_at("=A2+A1", "1!A1", "1!A2"), "=A3+A2");
    }

    #[test]
    fn test_shift_off_sheet_is_ref_error() {
        assert_eq!(resolve_at("=A2+B1", "1!C3", "1!C2"), "=A1+#REF!");
        assert_eq!(resolve_at("=SUM(A1:A2)", "1!A2", "1!A1"), "=SUM(#REF!)");
    }
}
