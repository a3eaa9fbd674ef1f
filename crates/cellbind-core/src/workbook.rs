//! Workbook type - the in-memory document

use crate::cell::CellValue;
use crate::coord::{Reference, Sheet};
use crate::document::DocumentReader;
use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A workbook (spreadsheet document)
///
/// Worksheets are stored in order; the sheet at position `i` has id `i + 1` when the workbook
/// is read through [`DocumentReader`].
#[derive(Debug, Clone)]
pub struct Workbook {
    /// Worksheets in the workbook
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create a new workbook with one worksheet named `Sheet1`
    pub fn new() -> Self {
        Self {
            worksheets: vec![Worksheet::new("Sheet1")],
        }
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
        }
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by 0-based position
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by 0-based position
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name (case-insensitive)
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.sheet_index(name).map(|i| &self.worksheets[i])
    }

    /// Get a mutable worksheet by name (case-insensitive)
    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.sheet_index(name).map(move |i| &mut self.worksheets[i])
    }

    /// Get the 0-based position of a worksheet by name
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        let name_lower = name.to_lowercase();
        self.worksheets
            .iter()
            .position(|ws| ws.name().to_lowercase() == name_lower)
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Add a new worksheet with a generated name
    pub fn add_worksheet(&mut self) -> Result<usize> {
        let name = self.generate_sheet_name();
        self.add_worksheet_with_name(&name)
    }

    /// Add a new worksheet with specified name, returning its position
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name, None)?;

        let index = self.worksheets.len();
        self.worksheets.push(Worksheet::new(name));
        Ok(index)
    }

    /// Remove a worksheet by position
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        Ok(self.worksheets.remove(index))
    }

    /// Rename a worksheet
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }

        self.validate_sheet_name(new_name, Some(index))?;
        self.worksheets[index].set_name(new_name);
        Ok(())
    }

    /// Validate a sheet name, optionally excluding a sheet from the duplicate check
    fn validate_sheet_name(&self, name: &str, exclude_index: Option<usize>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        match self.sheet_index(name) {
            Some(i) if Some(i) != exclude_index => Err(Error::DuplicateSheetName(name.into())),
            _ => Ok(()),
        }
    }

    fn generate_sheet_name(&self) -> String {
        let mut n = self.worksheets.len() + 1;
        loop {
            let name = format!("Sheet{}", n);
            if self.sheet_index(&name).is_none() {
                return name;
            }
            n += 1;
        }
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentReader for Workbook {
    fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    fn sheet_id(&self, name: &str) -> Option<Sheet> {
        self.sheet_index(name)
            .and_then(|i| Sheet::from_id(i + 1).ok())
    }

    fn cell(&self, reference: &Reference) -> Option<CellValue> {
        let worksheet = self.worksheets.get(reference.sheet().id().checked_sub(1)?)?;
        Some(worksheet.get_value_at(reference.row_index(), reference.col_index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_management() {
        let mut wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.add_worksheet().unwrap(), 1);
        assert_eq!(wb.worksheet(1).unwrap().name(), "Sheet2");
        assert_eq!(wb.add_worksheet_with_name("Inputs").unwrap(), 2);

        assert!(matches!(
            wb.add_worksheet_with_name("inputs"),
            Err(Error::DuplicateSheetName(_))
        ));
        assert!(matches!(
            wb.add_worksheet_with_name("a/b"),
            Err(Error::InvalidSheetName(_))
        ));
        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb.add_worksheet_with_name(&"x".repeat(32)).is_err());

        wb.rename_worksheet(2, "Params").unwrap();
        assert!(wb.worksheet_by_name("PARAMS").is_some());
        assert!(wb.rename_worksheet(2, "Sheet1").is_err());

        wb.remove_worksheet(1).unwrap();
        assert_eq!(wb.sheet_count(), 2);
        assert!(wb.remove_worksheet(5).is_err());
    }

    #[test]
    fn test_document_reader() {
        let mut wb = Workbook::new();
        wb.add_worksheet_with_name("Data").unwrap();
        wb.worksheet_by_name_mut("Data")
            .unwrap()
            .set_cell_value("C4", 12)
            .unwrap();

        let data = wb.sheet_id("data").unwrap();
        assert_eq!(data.id(), 2);
        assert!(wb.sheet_id("Missing").is_none());

        let c4 = Reference::parse("2!C4").unwrap();
        assert_eq!(wb.cell(&c4), Some(CellValue::Number(12.0)));
        assert_eq!(
            wb.cell(&Reference::parse("1!C4").unwrap()),
            Some(CellValue::Empty)
        );
        assert_eq!(wb.cell(&Reference::parse("3!C4").unwrap()), None);
    }

    #[test]
    fn test_empty_workbook() {
        let wb = Workbook::empty();
        assert!(wb.is_empty());
        assert_eq!(DocumentReader::sheet_count(&wb), 0);
        assert_eq!(wb.cell(&Reference::parse("1!A1").unwrap()), None);
    }
}
