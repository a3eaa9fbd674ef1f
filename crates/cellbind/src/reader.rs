//! Reading cells out of a document
//!
//! [`resolve_label`] turns the labels an export spec uses into absolute references, and
//! [`DocumentCells`] adapts a [`DocumentReader`] into the [`CellReader`] the context builder
//! consumes.

use crate::context::CellReader;
use crate::error::{Error, Result};
use crate::shared;
use cellbind_core::{CellValue, DocumentReader, RawValue, Reference, Sheet};
use cellbind_formula::{rewrite_references, CellReference, SheetQualifier};
use std::cell::RefCell;

/// Resolve a spec label to an absolute reference.
///
/// Accepted forms are `B3`, `$B$3`, `2!B3`, `Sheet2!B3` and `'My Sheet'!B3`. Unqualified
/// labels refer to the first sheet. `$` markers are accepted and ignored.
pub fn resolve_label<D: DocumentReader + ?Sized>(document: &D, label: &str) -> Result<Reference> {
    let label = label.trim();
    let (qualifier, address) = match label.rfind('!') {
        Some(i) => (Some(&label[..i]), &label[i + 1..]),
        None => (None, label),
    };

    let sheet = match qualifier {
        None => Sheet::first(),
        Some(q) if !q.is_empty() && q.bytes().all(|b| b.is_ascii_digit()) => Sheet::parse(q)?,
        Some(q) => {
            let name = unquote(q);
            document
                .sheet_id(&name)
                .ok_or_else(|| Error::UnrecognizedCell(format!("no sheet named '{}'", name)))?
        }
    };

    if sheet.id() > document.sheet_count() {
        return Err(Error::UnrecognizedCell(format!(
            "{} (document has {} sheet(s))",
            label,
            document.sheet_count()
        )));
    }

    Ok(Reference::parse_a1(sheet, address)?)
}

fn unquote(name: &str) -> String {
    match name.strip_prefix('\'').and_then(|n| n.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => name.to_string(),
    }
}

/// A [`CellReader`] over a document.
///
/// Cell kinds are flattened to raw values: hyperlinks to their text, rich text to the
/// concatenated runs, errors to their code, empty cells to null. Shared-formula members are
/// resolved against their master, and every formula is rewritten with absolute,
/// sheet-qualified operands so the result can be evaluated without the document.
pub struct DocumentCells<'d, D: ?Sized> {
    document: &'d D,
}

impl<'d, D: DocumentReader + ?Sized> DocumentCells<'d, D> {
    pub fn new(document: &'d D) -> Self {
        Self { document }
    }

    fn cell(&self, reference: &Reference) -> Result<CellValue> {
        self.document
            .cell(reference)
            .ok_or_else(|| Error::UnrecognizedCell(reference.to_string()))
    }

    /// Formula text of a cell, with shared formulas resolved
    fn formula_of(&self, reference: &Reference, value: &CellValue) -> Result<Option<String>> {
        match value {
            CellValue::Formula { text } => Ok(Some(text.clone())),
            CellValue::SharedFormula { master } => {
                let anchor = Reference::parse_a1(reference.sheet(), master)?;
                match self.cell(&anchor)? {
                    CellValue::Formula { text } => {
                        shared::resolve(&text, &anchor, reference).map(Some)
                    }
                    other => Err(Error::UnrecognizedCell(format!(
                        "shared formula master {} of {} holds {}",
                        anchor,
                        reference,
                        other.type_name()
                    ))),
                }
            }
            _ => Ok(None),
        }
    }

    /// Rewrite every operand as `<sheet id>!$COL$ROW`.
    ///
    /// An operand naming a sheet the document does not have fails with
    /// [`Error::UnsupportedCrossSheetDependency`]; the first such operand is reported.
    fn normalize(&self, text: &str, sheet: Sheet) -> Result<String> {
        let failure = RefCell::new(None);
        let qualify = |cell: &CellReference| match self.sheet_of(cell, sheet) {
            Some(sheet) => Some(cell.on_sheet(sheet)),
            None => {
                failure.borrow_mut().get_or_insert_with(|| Error::UnsupportedCrossSheetDependency {
                    formula: text.to_string(),
                    operand: format!(
                        "{}{}",
                        cell.sheet.as_ref().map(|q| q.prefix()).unwrap_or_default(),
                        cell.address()
                    ),
                });
                None
            }
        };

        let normalized = rewrite_references(
            text,
            |cell| qualify(cell).map(|reference| reference.to_string()),
            |range| {
                let start = qualify(&range.start)?;
                let end = range.end.on_sheet(start.sheet());
                Some(format!("{}:{}", start, end.label()))
            },
        )
        .map_err(|e| Error::formula(text, e))?;

        match failure.into_inner() {
            Some(error) => Err(error),
            None => Ok(normalized),
        }
    }

    fn sheet_of(&self, cell: &CellReference, sheet: Sheet) -> Option<Sheet> {
        match &cell.sheet {
            None => Some(sheet),
            Some(SheetQualifier::Id(id)) => Some(*id),
            Some(SheetQualifier::Name(name)) => self.document.sheet_id(name),
        }
    }
}

impl<'d, D: DocumentReader + ?Sized> CellReader for DocumentCells<'d, D> {
    fn read(&self, reference: &Reference) -> Result<RawValue> {
        let value = self.cell(reference)?;

        if let Some(text) = self.formula_of(reference, &value)? {
            let text = if text.starts_with('=') {
                text
            } else {
                format!("={}", text)
            };
            return Ok(RawValue::Formula(self.normalize(&text, reference.sheet())?));
        }

        Ok(match value {
            CellValue::Empty => RawValue::Null,
            CellValue::Boolean(b) => RawValue::Boolean(b),
            CellValue::Number(n) => RawValue::Number(n),
            CellValue::String(s) => RawValue::Text(s),
            CellValue::Date(dt) => RawValue::Date(dt),
            CellValue::Hyperlink { text, .. } => RawValue::Text(text),
            CellValue::RichText(runs) => {
                RawValue::Text(runs.into_iter().map(|run| run.text).collect())
            }
            CellValue::Error(e) => RawValue::Text(e.as_str().to_string()),
            CellValue::Formula { .. } | CellValue::SharedFormula { .. } => RawValue::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellbind_core::{CellError, RichTextRun, Workbook};
    use pretty_assertions::assert_eq;

    fn workbook() -> Workbook {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("My Data").unwrap();
        let sheet = wb.worksheet_mut(0).unwrap();
        sheet.set_cell_value("A1", 1.0).unwrap();
        sheet.set_cell_value("A2", CellValue::hyperlink("docs", "https://example.com")).unwrap();
        sheet
            .set_cell_value(
                "A3",
                CellValue::RichText(vec![RichTextRun::plain("ab"), RichTextRun::plain("cd")]),
            )
            .unwrap();
        sheet.set_cell_value("A4", CellError::Div0).unwrap();
        sheet.set_cell_formula("B1", "=SUM(A1:$A2)+$C$3").unwrap();
        sheet.set_shared_formula("B2", "B1").unwrap();
        sheet.set_cell_formula("C1", "='My Data'!A1*2").unwrap();
        sheet.set_cell_formula("C2", "=Missing!A1+A1").unwrap();
        sheet.set_cell_formula("C3", "=SUM('Old Data'!A1:A3)").unwrap();
        sheet.merge_cells("D1:E2").unwrap();
        sheet.set_cell_value("D1", "merged").unwrap();
        wb
    }

    fn read(wb: &Workbook, label: &str) -> Result<RawValue> {
        DocumentCells::new(wb).read(&Reference::parse(label).unwrap())
    }

    #[test]
    fn test_resolve_label_forms() {
        let wb = workbook();
        let expect = |label: &str| Reference::parse(label).unwrap();

        assert_eq!(resolve_label(&wb, "B3").unwrap(), expect("1!B3"));
        assert_eq!(resolve_label(&wb, "$B$3").unwrap(), expect("1!B3"));
        assert_eq!(resolve_label(&wb, "2!B3").unwrap(), expect("2!B3"));
        assert_eq!(resolve_label(&wb, "sheet1!B3").unwrap(), expect("1!B3"));
        assert_eq!(resolve_label(&wb, "'My Data'!B3").unwrap(), expect("2!B3"));
    }

    #[test]
    fn test_resolve_label_errors() {
        let wb = workbook();
        assert!(matches!(resolve_label(&wb, "B"), Err(Error::InvalidReference(_))));
        assert!(matches!(resolve_label(&wb, "3!B3"), Err(Error::UnrecognizedCell(_))));
        assert!(matches!(resolve_label(&wb, "Nope!B3"), Err(Error::UnrecognizedCell(_))));
    }

    #[test]
    fn test_cell_kinds() {
        let wb = workbook();
        assert_eq!(read(&wb, "1!A1").unwrap(), RawValue::Number(1.0));
        assert_eq!(read(&wb, "1!A2").unwrap(), RawValue::Text("docs".into()));
        assert_eq!(read(&wb, "1!A3").unwrap(), RawValue::Text("abcd".into()));
        assert_eq!(read(&wb, "1!A4").unwrap(), RawValue::Text("#DIV/0!".into()));
        assert_eq!(read(&wb, "1!Z99").unwrap(), RawValue::Null);
        assert_eq!(read(&wb, "1!E2").unwrap(), RawValue::Text("merged".into()));
        assert!(matches!(read(&wb, "5!A1"), Err(Error::UnrecognizedCell(_))));
    }

    #[test]
    fn test_formulas_are_normalized() {
        let wb = workbook();
        assert_eq!(
            read(&wb, "1!B1").unwrap(),
            RawValue::Formula("=SUM(1!$A$1:$A$2)+1!$C$3".into())
        );
        assert_eq!(
            read(&wb, "1!C1").unwrap(),
            RawValue::Formula("=2!$A$1*2".into())
        );
    }

    #[test]
    fn test_unknown_sheet_operand_is_rejected() {
        let wb = workbook();
        assert_eq!(
            read(&wb, "1!C2"),
            Err(Error::UnsupportedCrossSheetDependency {
                formula: "=Missing!A1+A1".into(),
                operand: "Missing!A1".into(),
            })
        );
        assert!(matches!(
            read(&wb, "1!C3"),
            Err(Error::UnsupportedCrossSheetDependency { .. })
        ));
    }

    #[test]
    fn test_shared_member_resolved_then_normalized() {
        let wb = workbook();
        assert_eq!(
            read(&wb, "1!B2").unwrap(),
            RawValue::Formula("=SUM(1!$A$2:$A$3)+1!$C$3".into())
        );
    }
}
