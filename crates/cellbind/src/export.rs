//! Export declarations
//!
//! An [`ExportSpec`] maps export names to the cell each one is bound to and the type it
//! should be delivered as. It deserializes from JSON of the form
//!
//! ```json
//! {
//!   "rate":  { "cell": "Inputs!B2", "type": "Number" },
//!   "total": { "cell": "C10", "type": "Callable", "parameters": ["B2", "B3"] }
//! }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How an export is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportType {
    Number,
    Text,
    Boolean,
    Callable,
}

impl ExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Number => "Number",
            ExportType::Text => "Text",
            ExportType::Boolean => "Boolean",
            ExportType::Callable => "Callable",
        }
    }
}

impl FromStr for ExportType {
    type Err = Error;

    /// Tags are case-insensitive; `String` and `Function` are accepted as aliases
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "number" => Ok(ExportType::Number),
            "text" | "string" => Ok(ExportType::Text),
            "boolean" => Ok(ExportType::Boolean),
            "callable" | "function" => Ok(ExportType::Callable),
            _ => Err(Error::UnknownType(s.to_string())),
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One export: a cell label, an optional type tag and, for callables, parameter labels
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportEntry {
    pub cell: String,

    /// Type tag as written; checked when the spec is compiled
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<String>>,
}

impl ExportEntry {
    /// Entry without a type tag
    pub fn new(cell: impl Into<String>) -> Self {
        Self {
            cell: cell.into(),
            ..Self::default()
        }
    }

    pub fn number(cell: impl Into<String>) -> Self {
        Self::new(cell).with_type(ExportType::Number.as_str())
    }

    pub fn text(cell: impl Into<String>) -> Self {
        Self::new(cell).with_type(ExportType::Text.as_str())
    }

    pub fn boolean(cell: impl Into<String>) -> Self {
        Self::new(cell).with_type(ExportType::Boolean.as_str())
    }

    pub fn callable<I, S>(cell: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(cell)
            .with_type(ExportType::Callable.as_str())
            .with_parameters(parameters)
    }

    pub fn with_type(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    pub fn with_parameters<I, S>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters = Some(parameters.into_iter().map(Into::into).collect());
        self
    }

    /// The declared type.
    ///
    /// Without a tag, an entry with parameters is [`ExportType::Callable`] and any other
    /// entry is [`ExportType::Text`].
    pub fn export_type(&self) -> Result<ExportType> {
        match (&self.type_tag, &self.parameters) {
            (Some(tag), _) => tag.parse(),
            (None, Some(_)) => Ok(ExportType::Callable),
            (None, None) => Ok(ExportType::Text),
        }
    }

    /// Parameter labels in argument order
    pub fn parameter_labels(&self) -> &[String] {
        self.parameters.as_deref().unwrap_or_default()
    }
}

/// Export names mapped to their entries
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportSpec {
    entries: BTreeMap<String, ExportEntry>,
}

impl ExportSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an export, replacing any previous one with the same name
    pub fn insert(&mut self, name: impl Into<String>, entry: ExportEntry) -> &mut Self {
        self.entries.insert(name.into(), entry);
        self
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, entry: ExportEntry) -> Self {
        self.insert(name, entry);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ExportEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by export name
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExportEntry)> {
        self.entries.iter()
    }
}

impl<N: Into<String>> FromIterator<(N, ExportEntry)> for ExportSpec {
    fn from_iter<I: IntoIterator<Item = (N, ExportEntry)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, entry)| (name.into(), entry))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_tags() {
        assert_eq!("Number".parse::<ExportType>().unwrap(), ExportType::Number);
        assert_eq!("string".parse::<ExportType>().unwrap(), ExportType::Text);
        assert_eq!("BOOLEAN".parse::<ExportType>().unwrap(), ExportType::Boolean);
        assert_eq!("Function".parse::<ExportType>().unwrap(), ExportType::Callable);
        assert_eq!(
            "Date".parse::<ExportType>(),
            Err(Error::UnknownType("Date".into()))
        );
    }

    #[test]
    fn test_default_types() {
        assert_eq!(ExportEntry::new("A1").export_type().unwrap(), ExportType::Text);
        assert_eq!(
            ExportEntry::new("A1")
                .with_parameters(["B1"])
                .export_type()
                .unwrap(),
            ExportType::Callable
        );
        assert_eq!(
            ExportEntry::new("A1")
                .with_type("Number")
                .with_parameters(["B1"])
                .export_type()
                .unwrap(),
            ExportType::Number
        );
    }

    #[test]
    fn test_spec_from_json() {
        let spec: ExportSpec = serde_json::from_str(
            r#"{
                "rate": { "cell": "Inputs!B2", "type": "Number" },
                "total": { "cell": "C10", "type": "Callable", "parameters": ["B2", "B3"] },
                "label": { "cell": "A1" }
            }"#,
        )
        .unwrap();

        assert_eq!(spec.len(), 3);
        assert_eq!(spec.get("rate"), Some(&ExportEntry::number("Inputs!B2")));
        assert_eq!(
            spec.get("total"),
            Some(&ExportEntry::callable("C10", ["B2", "B3"]))
        );
        assert_eq!(spec.get("label").unwrap().parameter_labels(), &[] as &[String]);

        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(serde_json::from_str::<ExportSpec>(&json).unwrap(), spec);
    }
}
