//! Cell value types

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

/// A cell as reported by a document reader.
///
/// Merged cells never show up here: readers resolve every member of a merged region to the
/// value of its master cell before handing it out.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Empty cell (no value)
    #[default]
    Empty,

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// Numeric value
    Number(f64),

    /// String value
    String(String),

    /// Date/time value
    Date(NaiveDateTime),

    /// Hyperlink; only the display text matters for computation
    Hyperlink { text: String, target: String },

    /// Rich text made of formatted runs
    RichText(Vec<RichTextRun>),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(CellError),

    /// Formula cell (e.g., "=SUM(A1:A10)")
    Formula { text: String },

    /// Member of a shared formula: the formula text lives on the master cell, `master` is
    /// the master's label on the same sheet (e.g. "B2")
    SharedFormula { master: String },
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Create a new formula value; a missing leading `=` is added
    pub fn formula<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        let text = if text.starts_with('=') {
            text
        } else {
            format!("={}", text)
        };
        CellValue::Formula { text }
    }

    /// Create a hyperlink value
    pub fn hyperlink<S: Into<String>, T: Into<String>>(text: S, target: T) -> Self {
        CellValue::Hyperlink {
            text: text.into(),
            target: target.into(),
        }
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell contains a formula (own or shared)
    pub fn is_formula(&self) -> bool {
        matches!(
            self,
            CellValue::Formula { .. } | CellValue::SharedFormula { .. }
        )
    }

    /// Get the formula text if this is a formula cell
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            CellValue::Formula { text } => Some(text),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Boolean(_) => "boolean",
            CellValue::Number(_) => "number",
            CellValue::String(_) => "string",
            CellValue::Date(_) => "date",
            CellValue::Hyperlink { .. } => "hyperlink",
            CellValue::RichText(_) => "rich_text",
            CellValue::Error(_) => "error",
            CellValue::Formula { .. } => "formula",
            CellValue::SharedFormula { .. } => "shared_formula",
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::string(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::string(s)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::Date(dt)
    }
}

impl From<CellError> for CellValue {
    fn from(e: CellError) -> Self {
        CellValue::Error(e)
    }
}

/// One formatted run of a rich text cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichTextRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl RichTextRun {
    /// Create an unformatted run
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }
}

/// Excel error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellError {
    /// #NULL! - Incorrect range operator
    Null,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
        }
    }

    /// Parse an error string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#NULL!" => Some(CellError::Null),
            "#DIV/0!" => Some(CellError::Div0),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::Na),
            _ => None,
        }
    }

    /// Numeric code used for ordering comparisons
    pub fn code(&self) -> u8 {
        match self {
            CellError::Null => 0x00,
            CellError::Div0 => 0x07,
            CellError::Value => 0x0F,
            CellError::Ref => 0x17,
            CellError::Name => 0x1D,
            CellError::Num => 0x24,
            CellError::Na => 0x2A,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The raw content of a cell once its reader-specific kind has been resolved.
///
/// This is what a context stores: either a literal or formula text (with its leading `=`).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RawValue {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    Date(NaiveDateTime),
    Formula(String),
}

impl RawValue {
    /// Classify text: a leading `=` makes it a formula
    pub fn text<S: Into<String>>(s: S) -> Self {
        let s = s.into();
        if s.starts_with('=') {
            RawValue::Formula(s)
        } else {
            RawValue::Text(s)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, RawValue::Formula(_))
    }

    /// Formula text including the leading `=`
    pub fn formula_text(&self) -> Option<&str> {
        match self {
            RawValue::Formula(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Boolean(b) => write!(f, "{}", b),
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) | RawValue::Formula(s) => f.write_str(s),
            RawValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Boolean(b)
    }
}

impl From<i32> for RawValue {
    fn from(n: i32) -> Self {
        RawValue::Number(n as f64)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n as f64)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::text(s)
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::text(s)
    }
}

impl From<NaiveDateTime> for RawValue {
    fn from(dt: NaiveDateTime) -> Self {
        RawValue::Date(dt)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Null)
    }
}

/// Excel serial number of a date in the 1900 date system.
///
/// Serial 1 is 1900-01-01. Dates from 1900-03-01 on are shifted by one day to account for the
/// non-existent 1900-02-29 that the 1900 system counts.
pub fn date_to_serial(dt: &NaiveDateTime) -> f64 {
    let date = dt.date();
    let days = match (NaiveDate::from_ymd_opt(1899, 12, 30), NaiveDate::from_ymd_opt(1900, 3, 1)) {
        (Some(epoch), Some(leap_bug)) if date >= leap_bug => (date - epoch).num_days(),
        (Some(epoch), _) => (date - epoch).num_days() - 1,
        _ => 0,
    };
    let seconds = f64::from(dt.time().num_seconds_from_midnight());
    days as f64 + seconds / 86_400.0
}
