//! Coordinate algebra
//!
//! Pure value types for addressing cells:
//! - [`Index`] - a position with explicit base conversion
//! - [`Column`], [`Row`], [`Sheet`] - the three [`Axis`] kinds
//! - [`Reference`] - an absolute (sheet, column, row) triple
//! - [`Vector`] - a relative (column, row) offset
//! - [`Range`] - a rectangle between two references on one sheet

mod axis;
mod index;
mod range;
mod reference;
mod vector;

pub use axis::{column_to_letters, letters_to_column, Axis, Column, Row, Sheet};
pub use index::Index;
pub use range::{Range, RangeIter};
pub use reference::Reference;
pub use vector::Vector;
