//! Base-aware integer index

use crate::error::{Error, Result};
use std::fmt;

/// A non-negative position stored 0-based internally.
///
/// Labels shown to users are 1-based (row `1`, column `A`, sheet `1`), while all arithmetic
/// happens on the 0-based value. Conversion between the two is always explicit.
///
/// # Examples
/// ```
/// use cellbind_core::Index;
///
/// let idx = Index::new(3, 1).unwrap();
/// assert_eq!(idx.base0(), 2);
/// assert_eq!(idx.base1(), 3);
/// assert!(Index::new(0, 1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Index(u32);

impl Index {
    /// Create an index from a value counted in `base`
    pub fn new(value: i64, base: u32) -> Result<Self> {
        let base0 = value - i64::from(base);
        if base0 < 0 || base0 > i64::from(u32::MAX) {
            return Err(Error::IndexBelowBase { index: value, base });
        }
        Ok(Self(base0 as u32))
    }

    /// Create an index from a 0-based value
    pub const fn zero_based(value: u32) -> Self {
        Self(value)
    }

    /// Value counted from `base`
    pub fn to_base(&self, base: u32) -> i64 {
        i64::from(self.0) + i64::from(base)
    }

    /// 0-based value
    pub fn base0(&self) -> u32 {
        self.0
    }

    /// 1-based value
    pub fn base1(&self) -> i64 {
        self.to_base(1)
    }

    /// Translate by a signed delta, failing when the result would precede the origin
    pub fn offset(&self, delta: i64) -> Result<Self> {
        Self::new(i64::from(self.0) + delta, 0)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_bases() {
        let idx = Index::new(0, 0).unwrap();
        assert_eq!(idx.base0(), 0);
        assert_eq!(idx.base1(), 1);
        assert_eq!(idx.to_base(5), 5);

        let idx = Index::new(27, 1).unwrap();
        assert_eq!(idx.base0(), 26);
    }

    #[test]
    fn test_index_below_base() {
        assert_eq!(
            Index::new(0, 1),
            Err(Error::IndexBelowBase { index: 0, base: 1 })
        );
        assert!(Index::new(-1, 0).is_err());
    }

    #[test]
    fn test_index_offset() {
        let idx = Index::zero_based(2);
        assert_eq!(idx.offset(3).unwrap().base0(), 5);
        assert_eq!(idx.offset(-2).unwrap().base0(), 0);
        assert!(idx.offset(-3).is_err());
    }
}
