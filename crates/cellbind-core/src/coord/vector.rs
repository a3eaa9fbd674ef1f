//! Relative offsets between references

use crate::coord::Reference;
use crate::error::Result;

/// A (column, row) delta between two references on the same sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vector {
    col_offset: i64,
    row_offset: i64,
}

impl Vector {
    pub fn new(col_offset: i64, row_offset: i64) -> Self {
        Self {
            col_offset,
            row_offset,
        }
    }

    /// `target - pivot`
    pub fn between(target: &Reference, pivot: &Reference) -> Self {
        Self::new(
            i64::from(target.col_index()) - i64::from(pivot.col_index()),
            i64::from(target.row_index()) - i64::from(pivot.row_index()),
        )
    }

    /// `target - pivot`, both given as reference labels
    pub fn from_labels(target: &str, pivot: &str) -> Result<Self> {
        Ok(Self::between(
            &Reference::parse(target)?,
            &Reference::parse(pivot)?,
        ))
    }

    pub fn col_offset(&self) -> i64 {
        self.col_offset
    }

    pub fn row_offset(&self) -> i64 {
        self.row_offset
    }

    pub fn is_zero(&self) -> bool {
        self.col_offset == 0 && self.row_offset == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_between() {
        let v = Vector::from_labels("1!B3", "1!B2").unwrap();
        assert_eq!(v, Vector::new(0, 1));

        let v = Vector::from_labels("1!A1", "1!C4").unwrap();
        assert_eq!(v.col_offset(), -2);
        assert_eq!(v.row_offset(), -3);
    }

    #[test]
    fn test_vector_round_trip_through_offset() {
        let pivot = Reference::parse("1!D5").unwrap();
        let target = Reference::parse("1!F2").unwrap();
        let v = Vector::between(&target, &pivot);
        assert_eq!(pivot.offset(v).unwrap(), target);
        assert!(Vector::between(&pivot, &pivot).is_zero());
    }
}
