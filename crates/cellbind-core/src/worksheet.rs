//! Worksheet type

use ahash::AHashMap;

use crate::cell::CellValue;
use crate::coord::{column_to_letters, Reference, Sheet};
use crate::error::{Error, Result};

/// A rectangular merged region, stored by 0-based bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    first_row: u32,
    first_col: u32,
    last_row: u32,
    last_col: u32,
}

impl MergedRegion {
    /// Top-left (master) cell as `(row, col)`
    pub fn master(&self) -> (u32, u32) {
        (self.first_row, self.first_col)
    }

    /// Check if a cell lies inside the region
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.first_row && row <= self.last_row && col >= self.first_col && col <= self.last_col
    }

    fn overlaps(&self, other: &MergedRegion) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }

    /// Label such as `A1:B2`
    pub fn label(&self) -> String {
        format!(
            "{}{}:{}{}",
            column_to_letters(self.first_col),
            self.first_row + 1,
            column_to_letters(self.last_col),
            self.last_row + 1
        )
    }
}

/// A worksheet (single sheet in a workbook)
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    /// Sheet name
    name: String,
    /// Non-empty cells keyed by 0-based (row, col)
    cells: AHashMap<(u32, u32), CellValue>,
    /// Merged regions
    merged: Vec<MergedRegion>,
}

/// Parse an unqualified address into 0-based (row, col)
fn position(address: &str) -> Result<(u32, u32)> {
    let reference = Reference::parse_a1(Sheet::first(), address)?;
    Ok((reference.row_index(), reference.col_index()))
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Get the sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    // === Cell Access ===

    /// Get a cell value by address string (e.g., "A1")
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let (row, col) = position(address)?;
        Ok(self.get_value_at(row, col))
    }

    /// Get a cell value by 0-based row and column; merged members report their master's value
    pub fn get_value_at(&self, row: u32, col: u32) -> CellValue {
        let (row, col) = self
            .merged
            .iter()
            .find(|region| region.contains(row, col))
            .map(MergedRegion::master)
            .unwrap_or((row, col));

        self.cells.get(&(row, col)).cloned().unwrap_or_default()
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    // === Cell Modification ===

    /// Set a cell value by address string
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let (row, col) = position(address)?;
        self.set_cell_value_at(row, col, value);
        Ok(())
    }

    /// Set a cell value by 0-based row and column
    pub fn set_cell_value_at<V: Into<CellValue>>(&mut self, row: u32, col: u32, value: V) {
        match value.into() {
            CellValue::Empty => {
                self.cells.remove(&(row, col));
            }
            value => {
                self.cells.insert((row, col), value);
            }
        }
    }

    /// Set a cell formula by address string; the leading `=` is optional
    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        self.set_cell_value(address, CellValue::formula(formula))
    }

    /// Make a cell a member of the shared formula whose master sits at `master`
    pub fn set_shared_formula(&mut self, address: &str, master: &str) -> Result<()> {
        position(master)?;
        self.set_cell_value(
            address,
            CellValue::SharedFormula {
                master: master.trim().to_string(),
            },
        )
    }

    /// Clear a cell
    pub fn clear_cell(&mut self, address: &str) -> Result<()> {
        let (row, col) = position(address)?;
        self.cells.remove(&(row, col));
        Ok(())
    }

    // === Merged Cells ===

    /// Get merged regions
    pub fn merged_regions(&self) -> &[MergedRegion] {
        &self.merged
    }

    /// Merge a range such as `A1:B2`; the top-left cell becomes the master
    pub fn merge_cells(&mut self, range: &str) -> Result<()> {
        let (start, end) = range
            .split_once(':')
            .ok_or_else(|| Error::InvalidReference(format!("'{}'", range)))?;
        let (r1, c1) = position(start)?;
        let (r2, c2) = position(end)?;
        let region = MergedRegion {
            first_row: r1.min(r2),
            first_col: c1.min(c2),
            last_row: r1.max(r2),
            last_col: c1.max(c2),
        };

        // Check for overlap with existing merged regions
        if let Some(existing) = self.merged.iter().find(|m| m.overlaps(&region)) {
            return Err(Error::MergedCellConflict(existing.label()));
        }

        self.merged.push(region);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_values() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell_value("A1", 3).unwrap();
        ws.set_cell_value("B1", "hello").unwrap();
        ws.set_cell_formula("C1", "A1*2").unwrap();

        assert_eq!(ws.get_value("A1").unwrap(), CellValue::Number(3.0));
        assert_eq!(ws.get_value("b1").unwrap(), CellValue::string("hello"));
        assert_eq!(ws.get_value("C1").unwrap().formula_text(), Some("=A1*2"));
        assert_eq!(ws.get_value("Z99").unwrap(), CellValue::Empty);
        assert_eq!(ws.cell_count(), 3);

        ws.set_cell_value("A1", CellValue::Empty).unwrap();
        assert_eq!(ws.cell_count(), 2);
        assert!(ws.get_value("1A").is_err());
    }

    #[test]
    fn test_merged_cells_report_master() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell_value("B2", 7).unwrap();
        ws.merge_cells("B2:C3").unwrap();

        assert_eq!(ws.get_value("C3").unwrap(), CellValue::Number(7.0));
        assert_eq!(ws.get_value("B3").unwrap(), CellValue::Number(7.0));
        assert_eq!(ws.get_value("D3").unwrap(), CellValue::Empty);
        assert_eq!(ws.merged_regions()[0].label(), "B2:C3");

        assert!(matches!(
            ws.merge_cells("C3:D4"),
            Err(Error::MergedCellConflict(_))
        ));
    }

    #[test]
    fn test_shared_formula_member() {
        let mut ws = Worksheet::new("Sheet1");
        ws.set_cell_formula("B2", "=A1+B1").unwrap();
        ws.set_shared_formula("B3", "B2").unwrap();

        assert_eq!(
            ws.get_value("B3").unwrap(),
            CellValue::SharedFormula {
                master: "B2".into()
            }
        );
        assert!(ws.set_shared_formula("B4", "nope").is_err());
    }
}
