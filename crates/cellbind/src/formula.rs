//! Formulas bound to the sheet they live on

use crate::error::{Error, Result};
use cellbind_core::{Range, Reference, Sheet};
use cellbind_formula::{visit_references, CellReference, SheetQualifier};
use std::cell::RefCell;

/// The formula sigil
pub const SIGIL: char = '=';

/// Formula text together with the sheet that qualifies its bare operands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    text: String,
    sheet: Sheet,
}

impl Formula {
    /// True iff `text` starts with the formula sigil
    pub fn is_formula(text: &str) -> bool {
        text.starts_with(SIGIL)
    }

    /// Bind formula text to its sheet; the sigil is stripped if present
    pub fn from(text: &str, sheet: Sheet) -> Self {
        Self {
            text: text.strip_prefix(SIGIL).unwrap_or(text).to_string(),
            sheet,
        }
    }

    /// Formula body without the sigil
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sheet(&self) -> Sheet {
        self.sheet
    }

    /// Every cell the formula reads, in text order.
    ///
    /// Single-cell operands are listed as they appear and range operands are flattened
    /// row-major. Duplicates are kept. All tokens are visited before failing; the first
    /// problem found is returned.
    ///
    /// Operands must live on the formula's own sheet. A token qualified with another sheet
    /// id, or with a sheet name, fails with [`Error::UnsupportedCrossSheetDependency`].
    pub fn operand_references(&self) -> Result<Vec<Reference>> {
        let operands = RefCell::new(Vec::new());
        let errors = RefCell::new(Vec::new());

        visit_references(
            &self.text,
            |cell| match self.locate(cell) {
                Ok(reference) => operands.borrow_mut().push(reference),
                Err(e) => errors.borrow_mut().push(e),
            },
            |range| {
                let bounds = self
                    .locate(&range.start)
                    .and_then(|start| Ok((start, self.locate(&range.end)?)))
                    .and_then(|(start, end)| Ok(Range::new(start, end)?));
                match bounds {
                    Ok(range) => operands.borrow_mut().extend(range.iter()),
                    Err(e) => errors.borrow_mut().push(e),
                }
            },
        )
        .map_err(|e| Error::formula(self, e))?;

        match errors.into_inner().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(operands.into_inner()),
        }
    }

    fn locate(&self, cell: &CellReference) -> Result<Reference> {
        let same_sheet = match &cell.sheet {
            None => true,
            Some(SheetQualifier::Id(sheet)) => *sheet == self.sheet,
            Some(SheetQualifier::Name(_)) => false,
        };
        if !same_sheet {
            let qualifier = cell.sheet.as_ref().map(|q| q.prefix()).unwrap_or_default();
            return Err(Error::UnsupportedCrossSheetDependency {
                formula: self.to_string(),
                operand: format!("{}{}", qualifier, cell.address()),
            });
        }
        Ok(cell.on_sheet(self.sheet))
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", SIGIL, self.text)
    }
}
