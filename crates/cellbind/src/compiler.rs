//! Compiling export specs
//!
//! Compilation resolves every label of an [`ExportSpec`], builds one [`Context`] covering all
//! exported and parameter cells, then materializes each export either as a coerced scalar or
//! as a [`CompiledFunction`] over that context.
//!
//! # Example
//!
//! ```rust
//! use cellbind::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", 2.0).unwrap();
//! sheet.set_cell_value("A2", 3.0).unwrap();
//! sheet.set_cell_formula("A3", "=A1*A2").unwrap();
//!
//! let spec = ExportSpec::new()
//!     .with("width", ExportEntry::number("A1"))
//!     .with("area", ExportEntry::callable("A3", ["A1", "A2"]));
//!
//! let exports = workbook.compile(&spec).unwrap();
//! assert_eq!(exports["width"].as_number(), Some(2.0));
//!
//! let area = exports["area"].as_callable().unwrap();
//! assert_eq!(area.invoke(&[RawValue::Number(4.0)]).unwrap(), FormulaValue::Number(12.0));
//! ```

use crate::context::{Context, ContextBuilder};
use crate::error::{Error, Result};
use crate::evaluator::CompiledFunction;
use crate::export::{ExportSpec, ExportType};
use crate::reader::{resolve_label, DocumentCells};
use cellbind_core::{date_to_serial, DocumentReader, RawValue, Reference, Workbook};
use std::collections::BTreeMap;
use std::ops::Index;
use std::sync::Arc;

/// Options for compilation
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Also publish every export under its canonical cell label (`1!$C$1`)
    pub expose_cells: bool,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expose_cells(mut self, expose: bool) -> Self {
        self.expose_cells = expose;
        self
    }
}

/// A materialized export
#[derive(Debug, Clone, PartialEq)]
pub enum Export {
    Number(f64),
    Text(String),
    Boolean(bool),
    Callable(CompiledFunction),
}

impl Export {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Export::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Export::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Export::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&CompiledFunction> {
        match self {
            Export::Callable(f) => Some(f),
            _ => None,
        }
    }

    pub fn export_type(&self) -> ExportType {
        match self {
            Export::Number(_) => ExportType::Number,
            Export::Text(_) => ExportType::Text,
            Export::Boolean(_) => ExportType::Boolean,
            Export::Callable(_) => ExportType::Callable,
        }
    }
}

/// The result of a compilation: exports by name, and the context they were built from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exports {
    exports: BTreeMap<String, Export>,
    context: Arc<Context>,
}

impl Exports {
    pub fn get(&self, name: &str) -> Option<&Export> {
        self.exports.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.exports.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    /// Exports ordered by name
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Export)> {
        self.exports.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.exports.keys().map(String::as_str)
    }

    /// The context every export was materialized from
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn into_map(self) -> BTreeMap<String, Export> {
        self.exports
    }
}

impl Index<&str> for Exports {
    type Output = Export;

    /// # Panics
    /// Panics if there is no export called `name`
    fn index(&self, name: &str) -> &Export {
        match self.exports.get(name) {
            Some(export) => export,
            None => panic!("no export named '{}'", name),
        }
    }
}

/// An export with its labels resolved
struct Plan {
    name: String,
    kind: ExportType,
    cell: Reference,
    parameters: Vec<Reference>,
}

/// Compiles export specs against a document
pub struct Compiler<D> {
    document: D,
}

impl<D: DocumentReader> Compiler<D> {
    pub fn new(document: D) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Compile with default options
    pub fn compile(&self, spec: &ExportSpec) -> Result<Exports> {
        self.compile_with_options(spec, &CompileOptions::default())
    }

    /// Compile `spec`.
    ///
    /// # Errors
    /// - [`Error::EmptyWorkbook`] before anything is read, when the document has no sheets
    /// - [`Error::UnknownType`], [`Error::InvalidReference`], [`Error::UnrecognizedCell`]
    ///   for spec entries that do not resolve
    /// - any error raised while building the context
    pub fn compile_with_options(
        &self,
        spec: &ExportSpec,
        options: &CompileOptions,
    ) -> Result<Exports> {
        if self.document.sheet_count() == 0 {
            return Err(Error::EmptyWorkbook);
        }

        let plans = spec
            .iter()
            .map(|(name, entry)| -> Result<Plan> {
                Ok(Plan {
                    name: name.clone(),
                    kind: entry.export_type()?,
                    cell: resolve_label(&self.document, &entry.cell)?,
                    parameters: entry
                        .parameter_labels()
                        .iter()
                        .map(|label| resolve_label(&self.document, label))
                        .collect::<Result<_>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let roots = plans
            .iter()
            .flat_map(|plan| std::iter::once(plan.cell).chain(plan.parameters.iter().copied()));
        let builder = ContextBuilder::new(DocumentCells::new(&self.document));
        let context = Arc::new(builder.build(roots)?);

        let mut exports = BTreeMap::new();
        for plan in plans {
            let export = match plan.kind {
                ExportType::Callable => Export::Callable(CompiledFunction::new(
                    plan.cell,
                    plan.parameters,
                    Arc::clone(&context),
                )),
                scalar => {
                    let raw = context.get(&plan.cell).cloned().unwrap_or_default();
                    coerce(&raw, scalar)?
                }
            };
            log::debug!("export '{}' <- {} as {}", plan.name, plan.cell, plan.kind);

            if options.expose_cells {
                exports.insert(plan.cell.to_string(), export.clone());
            }
            exports.insert(plan.name, export);
        }

        Ok(Exports { exports, context })
    }
}

/// Coerce a raw value to a scalar export type.
///
/// - `Number`: numbers as is, dates as their 1900-system serial, text by its longest
///   leading decimal (`"12px"` is 12); anything else is `NaN`
/// - `Text`: the value's display form
/// - `Boolean`: false for null, 0, `NaN` and empty text, true otherwise
///
/// Formula cells coerce their text, not their computed value.
pub fn coerce(value: &RawValue, kind: ExportType) -> Result<Export> {
    Ok(match kind {
        ExportType::Number => Export::Number(match value {
            RawValue::Null | RawValue::Boolean(_) => f64::NAN,
            RawValue::Number(n) => *n,
            RawValue::Date(dt) => date_to_serial(dt),
            RawValue::Text(s) | RawValue::Formula(s) => parse_number(s),
        }),
        ExportType::Text => Export::Text(value.to_string()),
        ExportType::Boolean => Export::Boolean(match value {
            RawValue::Null => false,
            RawValue::Boolean(b) => *b,
            RawValue::Number(n) => *n != 0.0 && !n.is_nan(),
            RawValue::Text(s) | RawValue::Formula(s) => !s.is_empty(),
            RawValue::Date(_) => true,
        }),
        ExportType::Callable => return Err(Error::UnknownType(kind.to_string())),
    })
}

/// Parse the longest decimal prefix of `text`, after leading whitespace.
///
/// Accepts an optional sign, digits with an optional fraction, an optional exponent, or the
/// word `Infinity`.
fn parse_number(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits = |from: usize| {
        bytes[from.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if text[end..].starts_with("Infinity") {
        return if text.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let whole = digits(end);
    end += whole;
    let fraction = if bytes.get(end) == Some(&b'.') { digits(end + 1) } else { 0 };
    if whole + fraction == 0 {
        return f64::NAN;
    }
    if fraction > 0 {
        end += 1 + fraction;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent = digits(end + 1 + sign);
        if exponent > 0 {
            end += 1 + sign + exponent;
        }
    }

    text[..end].parse().unwrap_or(f64::NAN)
}

/// Extension trait for documents to compile export specs directly
pub trait CompileExt {
    fn compile(&self, spec: &ExportSpec) -> Result<Exports>;

    fn compile_with_options(&self, spec: &ExportSpec, options: &CompileOptions) -> Result<Exports>;
}

impl CompileExt for Workbook {
    fn compile(&self, spec: &ExportSpec) -> Result<Exports> {
        Compiler::new(self).compile(spec)
    }

    fn compile_with_options(&self, spec: &ExportSpec, options: &CompileOptions) -> Result<Exports> {
        Compiler::new(self).compile_with_options(spec, options)
    }
}
