//! Absolute cell references

use crate::coord::{Axis, Column, Index, Row, Sheet, Vector};
use crate::error::{Error, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?<sheet>\d+)!(?<col>\$?[A-Za-z]+)(?<row>\$?\d+)$")
            .expect("reference label pattern is valid")
    })
}

/// An absolute cell reference: sheet, column and row.
///
/// A reference is always absolute once constructed; relative addressing is expressed with a
/// [`Vector`] applied through [`Reference::offset`]. The canonical label is
/// `<sheet id>!$<column>$<row>`, e.g. `1!$B$3`.
///
/// # Examples
/// ```
/// use cellbind_core::{Reference, Vector};
///
/// let r = Reference::parse("1!B3").unwrap();
/// assert_eq!(r.to_string(), "1!$B$3");
///
/// let moved = r.offset(Vector::new(1, -1)).unwrap();
/// assert_eq!(moved.label(), "$C$2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    sheet: Sheet,
    column: Column,
    row: Row,
}

impl Reference {
    /// Create a reference from its three axes
    pub fn new(sheet: Sheet, column: Column, row: Row) -> Self {
        Self { sheet, column, row }
    }

    /// Create a reference from 0-based column and row indices
    pub fn from_indices(sheet: Sheet, col: u32, row: u32) -> Self {
        Self::new(
            sheet,
            Column::new(Index::zero_based(col)),
            Row::new(Index::zero_based(row)),
        )
    }

    /// Parse `<sheet>!<col><row>`; `$` markers are optional and ignored
    pub fn parse(label: &str) -> Result<Self> {
        let caps = label_pattern()
            .captures(label.trim())
            .ok_or_else(|| Error::InvalidReference(format!("'{}'", label)))?;

        Ok(Self::new(
            Sheet::parse(&caps["sheet"])?,
            Column::parse(&caps["col"])?,
            Row::parse(&caps["row"])?,
        ))
    }

    /// Parse an unqualified `A1`-style address on the given sheet
    pub fn parse_a1(sheet: Sheet, address: &str) -> Result<Self> {
        let address = address.trim();
        let invalid = || Error::InvalidReference(format!("'{}'", address));
        let digits = address
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let split = match address[..digits].strip_suffix('$') {
            Some(col) => col.len(),
            None => digits,
        };
        let (col, row) = address.split_at(split);
        if col.is_empty() || col == "$" {
            return Err(invalid());
        }
        Ok(Self::new(
            sheet,
            Column::parse(col).map_err(|_| invalid())?,
            Row::parse(row).map_err(|_| invalid())?,
        ))
    }

    pub fn sheet(&self) -> Sheet {
        self.sheet
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn row(&self) -> Row {
        self.row
    }

    /// 0-based column index
    pub fn col_index(&self) -> u32 {
        self.column.index().base0()
    }

    /// 0-based row index
    pub fn row_index(&self) -> u32 {
        self.row.index().base0()
    }

    /// Translate by a vector, staying on the same sheet
    pub fn offset(&self, vector: Vector) -> Result<Self> {
        Ok(Self::new(
            self.sheet,
            Column::new(self.column.index().offset(vector.col_offset())?),
            Row::new(self.row.index().offset(vector.row_offset())?),
        ))
    }

    /// Label without the sheet qualifier, e.g. `$B$3`
    pub fn label(&self) -> String {
        format!("{}{}", self.column.label(), self.row.label())
    }

    /// Label without the sheet qualifier or `$` markers, e.g. `B3`
    pub fn a1(&self) -> String {
        format!("{}{}", self.column.letters(), self.row.number())
    }
}

impl Ord for Reference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sheet
            .cmp(&other.sheet)
            .then(self.row.cmp(&other.row))
            .then(self.column.cmp(&other.column))
    }
}

impl PartialOrd for Reference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sheet.label(), self.label())
    }
}

impl FromStr for Reference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Reference {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Reference {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::parse(&label).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_parse() {
        let r = Reference::parse("1!A1").unwrap();
        assert_eq!(r.sheet().id(), 1);
        assert_eq!(r.col_index(), 0);
        assert_eq!(r.row_index(), 0);

        let r = Reference::parse("3!$AB$12").unwrap();
        assert_eq!(r.sheet().id(), 3);
        assert_eq!(r.col_index(), 27);
        assert_eq!(r.row_index(), 11);
        assert_eq!(r.to_string(), "3!$AB$12");
        assert_eq!(r.a1(), "AB12");

        // Markers are ignored for identity
        assert_eq!(Reference::parse("1!$C2").unwrap(), Reference::parse("1!C$2").unwrap());
    }

    #[test]
    fn test_reference_parse_errors() {
        for label in ["A1", "1!", "1!A", "1!1", "x!A1", "0!A1", "1!A0", "1!A1:B2", ""] {
            assert!(
                matches!(Reference::parse(label), Err(Error::InvalidReference(_))),
                "{label} should be rejected"
            );
        }
    }

    #[test]
    fn test_reference_parse_a1() {
        let sheet = Sheet::from_id(2).unwrap();
        let r = Reference::parse_a1(sheet, "$C$4").unwrap();
        assert_eq!(r.to_string(), "2!$C$4");
        assert_eq!(Reference::parse_a1(sheet, "c4").unwrap(), r);
        assert!(Reference::parse_a1(sheet, "4").is_err());
        assert!(Reference::parse_a1(sheet, "C").is_err());
        assert!(Reference::parse_a1(sheet, "$$4").is_err());
    }

    #[test]
    fn test_reference_offset() {
        let r = Reference::parse("1!B2").unwrap();
        assert_eq!(r.offset(Vector::new(0, 1)).unwrap().to_string(), "1!$B$3");
        assert_eq!(r.offset(Vector::new(-1, -1)).unwrap().to_string(), "1!$A$1");
        assert!(r.offset(Vector::new(-2, 0)).is_err());
        // The source is untouched
        assert_eq!(r.to_string(), "1!$B$2");
    }

    #[test]
    fn test_reference_ordering_is_row_major() {
        let mut refs = vec![
            Reference::parse("1!B1").unwrap(),
            Reference::parse("1!A2").unwrap(),
            Reference::parse("1!A1").unwrap(),
        ];
        refs.sort();
        let labels: Vec<_> = refs.iter().map(|r| r.a1()).collect();
        assert_eq!(labels, vec!["A1", "B1", "A2"]);
    }

    proptest! {
        #[test]
        fn prop_label_round_trip(sheet in 1usize..64, col in 0u32..16_384, row in 0u32..1_048_576) {
            let r = Reference::from_indices(Sheet::from_id(sheet).unwrap(), col, row);
            let reparsed = Reference::parse(&r.to_string()).unwrap();
            prop_assert_eq!(reparsed, r);
        }
    }
}
