//! Column, row and sheet axes
//!
//! Each axis wraps an [`Index`] and knows how to render itself as a label:
//! - [`Column`] - base-26 letters (`A`, `Z`, `AA`, ...)
//! - [`Row`] - 1-based decimal (`1`, `2`, ...)
//! - [`Sheet`] - 1-based sheet id followed by `!`
//!
//! Columns and rows remember whether their source label carried a `$` marker. The flag is
//! informational: two axes with the same index compare equal regardless of it.

use crate::coord::Index;
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Common behaviour of a coordinate axis
pub trait Axis {
    /// Position along the axis
    fn index(&self) -> Index;

    /// Label as it appears in an absolute reference
    fn label(&self) -> String;
}

/// Convert a 0-based column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
pub fn column_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = u64::from(col) + 1;

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Convert column letters to a 0-based index (A = 0, Z = 25, AA = 26, etc.)
pub fn letters_to_column(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::InvalidReference("empty column letters".into()));
    }

    let mut col: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::InvalidReference(format!(
                "invalid column letter '{}'",
                c
            )));
        }
        col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
        if col > u64::from(MAX_COLS) {
            return Err(Error::InvalidReference(format!(
                "column '{}' exceeds the sheet width",
                letters
            )));
        }
    }

    Ok((col - 1) as u32)
}

/// Split a leading `$` marker off an axis label
fn strip_absolute(label: &str) -> (bool, &str) {
    match label.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, label),
    }
}

/// A column axis
#[derive(Debug, Clone, Copy)]
pub struct Column {
    index: Index,
    absolute: bool,
}

impl Column {
    /// Create an absolute column from an index
    pub fn new(index: Index) -> Self {
        Self {
            index,
            absolute: true,
        }
    }

    /// Create a column with an explicit absolute flag
    pub fn with_absolute(index: Index, absolute: bool) -> Self {
        Self { index, absolute }
    }

    /// Parse `A`, `$AB`, ... (case-insensitive)
    pub fn parse(label: &str) -> Result<Self> {
        let (absolute, letters) = strip_absolute(label.trim());
        let col = letters_to_column(letters)?;
        Ok(Self::with_absolute(Index::zero_based(col), absolute))
    }

    /// Whether the source label carried a `$` marker
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Column letters without a marker
    pub fn letters(&self) -> String {
        column_to_letters(self.index.base0())
    }
}

impl Axis for Column {
    fn index(&self) -> Index {
        self.index
    }

    fn label(&self) -> String {
        format!("${}", self.letters())
    }
}

/// A row axis
#[derive(Debug, Clone, Copy)]
pub struct Row {
    index: Index,
    absolute: bool,
}

impl Row {
    /// Create an absolute row from an index
    pub fn new(index: Index) -> Self {
        Self {
            index,
            absolute: true,
        }
    }

    /// Create a row with an explicit absolute flag
    pub fn with_absolute(index: Index, absolute: bool) -> Self {
        Self { index, absolute }
    }

    /// Parse `1`, `$42`, ... (1-based)
    pub fn parse(label: &str) -> Result<Self> {
        let (absolute, digits) = strip_absolute(label.trim());
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidReference(format!(
                "invalid row number '{}'",
                label
            )));
        }
        let row: i64 = digits
            .parse()
            .map_err(|_| Error::InvalidReference(format!("invalid row number '{}'", label)))?;
        if row > i64::from(MAX_ROWS) {
            return Err(Error::InvalidReference(format!(
                "row {} exceeds the sheet height",
                row
            )));
        }
        let index = Index::new(row, 1)
            .map_err(|_| Error::InvalidReference(format!("row number must be >= 1 in '{}'", label)))?;
        Ok(Self::with_absolute(index, absolute))
    }

    /// Whether the source label carried a `$` marker
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// 1-based row number
    pub fn number(&self) -> i64 {
        self.index.base1()
    }
}

impl Axis for Row {
    fn index(&self) -> Index {
        self.index
    }

    fn label(&self) -> String {
        format!("${}", self.number())
    }
}

/// A sheet axis, identified by its 1-based position in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sheet {
    index: Index,
}

impl Sheet {
    /// Create a sheet from an index
    pub fn new(index: Index) -> Self {
        Self { index }
    }

    /// Create a sheet from its 1-based id
    pub fn from_id(id: usize) -> Result<Self> {
        Ok(Self::new(Index::new(id as i64, 1)?))
    }

    /// The first sheet of a document
    pub fn first() -> Self {
        Self::new(Index::zero_based(0))
    }

    /// Parse `1`, `2!`, ...
    pub fn parse(label: &str) -> Result<Self> {
        let digits = label.trim();
        let digits = digits.strip_suffix('!').unwrap_or(digits);
        let id: i64 = digits
            .parse()
            .map_err(|_| Error::InvalidReference(format!("invalid sheet id '{}'", label)))?;
        let index = Index::new(id, 1)
            .map_err(|_| Error::InvalidReference(format!("sheet id must be >= 1 in '{}'", label)))?;
        Ok(Self::new(index))
    }

    /// 1-based sheet id
    pub fn id(&self) -> usize {
        self.index.base1() as usize
    }
}

impl Axis for Sheet {
    fn index(&self) -> Index {
        self.index
    }

    fn label(&self) -> String {
        format!("{}!", self.id())
    }
}

macro_rules! impl_axis_identity {
    ($($ty:ty),*) => {$(
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.index == other.index
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.index.hash(state);
            }
        }

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.index.cmp(&other.index)
            }
        }
    )*};
}

impl_axis_identity!(Column, Row);

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl fmt::Display for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(column_to_letters(0), "A");
        assert_eq!(column_to_letters(25), "Z");
        assert_eq!(column_to_letters(26), "AA");
        assert_eq!(column_to_letters(27), "AB");
        assert_eq!(column_to_letters(701), "ZZ");
        assert_eq!(column_to_letters(702), "AAA");
        assert_eq!(column_to_letters(16383), "XFD");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(letters_to_column("A").unwrap(), 0);
        assert_eq!(letters_to_column("AA").unwrap(), 26);
        assert_eq!(letters_to_column("aa").unwrap(), 26);
        assert_eq!(letters_to_column("XFD").unwrap(), 16383);
        assert!(letters_to_column("XFE").is_err());
        assert!(letters_to_column("").is_err());
        assert!(letters_to_column("A1").is_err());
    }

    #[test]
    fn test_column_labels() {
        let col = Column::parse("AA").unwrap();
        assert_eq!(col.index().base1(), 27);
        assert_eq!(col.label(), "$AA");
        assert!(!col.is_absolute());

        let col = Column::parse("$b").unwrap();
        assert!(col.is_absolute());
        assert_eq!(col.letters(), "B");
        assert_eq!(col, Column::parse("B").unwrap());
    }

    #[test]
    fn test_row_labels() {
        let row = Row::parse("$10").unwrap();
        assert!(row.is_absolute());
        assert_eq!(row.index().base0(), 9);
        assert_eq!(row.label(), "$10");

        assert!(Row::parse("0").is_err());
        assert!(Row::parse("").is_err());
        assert!(Row::parse("1x").is_err());
        assert!(Row::parse("1048577").is_err());
    }

    #[test]
    fn test_sheet_labels() {
        let sheet = Sheet::parse("2!").unwrap();
        assert_eq!(sheet.id(), 2);
        assert_eq!(sheet.label(), "2!");
        assert_eq!(Sheet::parse("2").unwrap(), sheet);
        assert_eq!(Sheet::first().id(), 1);

        assert!(Sheet::parse("0").is_err());
        assert!(Sheet::parse("Sheet1").is_err());
    }
}
