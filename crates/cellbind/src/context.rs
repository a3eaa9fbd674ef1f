//! Dependency contexts
//!
//! A [`Context`] is the frozen set of raw cell contents a group of exports needs: the export
//! cells themselves plus everything their formulas read, transitively. [`ContextBuilder`]
//! discovers that set by walking formula operands through a [`CellReader`].

use crate::error::Result;
use crate::formula::Formula;
use ahash::AHashSet;
use cellbind_core::{RawValue, Reference};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw cell contents keyed by absolute reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    entries: BTreeMap<Reference, RawValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reference: &Reference) -> Option<&RawValue> {
        self.entries.get(reference)
    }

    pub fn contains(&self, reference: &Reference) -> bool {
        self.entries.contains_key(reference)
    }

    /// Insert a value, returning the previous one
    pub fn insert(&mut self, reference: Reference, value: RawValue) -> Option<RawValue> {
        self.entries.insert(reference, value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in row-major reference order
    pub fn iter(&self) -> impl Iterator<Item = (&Reference, &RawValue)> {
        self.entries.iter()
    }

    /// References present in the context
    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.entries.keys()
    }
}

impl FromIterator<(Reference, RawValue)> for Context {
    fn from_iter<I: IntoIterator<Item = (Reference, RawValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<(Reference, RawValue)> for Context {
    fn extend<I: IntoIterator<Item = (Reference, RawValue)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

/// Source of raw cell contents for the context builder.
///
/// Formula text must carry its leading `=` so the builder can recognize it. Shared formulas
/// must already be resolved to the concrete text of the cell being read.
pub trait CellReader {
    fn read(&self, reference: &Reference) -> Result<RawValue>;
}

impl<R: CellReader + ?Sized> CellReader for &R {
    fn read(&self, reference: &Reference) -> Result<RawValue> {
        (**self).read(reference)
    }
}

/// Reader backed by a closure, see [`from_fn`]
pub struct FromFn<F>(F);

/// Wrap a closure as a [`CellReader`]
pub fn from_fn<F>(read: F) -> FromFn<F>
where
    F: Fn(&Reference) -> Result<RawValue>,
{
    FromFn(read)
}

impl<F> CellReader for FromFn<F>
where
    F: Fn(&Reference) -> Result<RawValue>,
{
    fn read(&self, reference: &Reference) -> Result<RawValue> {
        (self.0)(reference)
    }
}

impl CellReader for Context {
    /// Cells missing from the context read as null
    fn read(&self, reference: &Reference) -> Result<RawValue> {
        Ok(self.get(reference).cloned().unwrap_or_default())
    }
}

/// Computes the transitive dependency closure of a set of root cells.
///
/// Every reference is fetched from the reader at most once per builder, however many
/// formulas mention it. Cycles terminate for the same reason.
///
/// # Example
/// ```rust
/// use cellbind::{Context, ContextBuilder, RawValue, Reference};
///
/// let sheet: Context = [
///     (Reference::parse("1!A1").unwrap(), RawValue::Number(2.0)),
///     (Reference::parse("1!B1").unwrap(), RawValue::text("=A1*3")),
///     (Reference::parse("1!C1").unwrap(), RawValue::Number(99.0)),
/// ]
/// .into_iter()
/// .collect();
///
/// let context = ContextBuilder::new(&sheet)
///     .build([Reference::parse("1!B1").unwrap()])
///     .unwrap();
/// assert_eq!(context.len(), 2);
/// ```
pub struct ContextBuilder<R> {
    reader: R,
    visited: AHashSet<Reference>,
    context: Context,
}

impl<R: CellReader> ContextBuilder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            visited: AHashSet::new(),
            context: Context::new(),
        }
    }

    /// Add a root and everything it depends on
    pub fn add_root(&mut self, root: Reference) -> Result<()> {
        let mut pending = vec![root];

        while let Some(reference) = pending.pop() {
            if !self.visited.insert(reference) {
                continue;
            }

            let value = self.reader.read(&reference)?;
            log::trace!("fetched {} = {:?}", reference, value);

            if let Some(text) = value.formula_text() {
                let formula = Formula::from(text, reference.sheet());
                let operands = formula.operand_references()?;
                log::debug!(
                    "{} {} reads {} operand(s)",
                    reference,
                    formula,
                    operands.len()
                );
                // Reverse so operands are fetched in text order
                pending.extend(
                    operands
                        .into_iter()
                        .rev()
                        .filter(|operand| !self.visited.contains(operand)),
                );
            }

            self.context.insert(reference, value);
        }

        Ok(())
    }

    /// Add every root, then return the finished context
    pub fn build<I>(mut self, roots: I) -> Result<Context>
    where
        I: IntoIterator<Item = Reference>,
    {
        for root in roots {
            self.add_root(root)?;
        }
        log::debug!("context built with {} cell(s)", self.context.len());
        Ok(self.context)
    }

    /// The context built so far
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn into_context(self) -> Context {
        self.context
    }
}

/// Build the context of `roots` in one call
pub fn build_context<R, I>(roots: I, reader: R) -> Result<Context>
where
    R: CellReader,
    I: IntoIterator<Item = Reference>,
{
    ContextBuilder::new(reader).build(roots)
}
