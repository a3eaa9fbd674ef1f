//! Re-evaluating formulas against a context
//!
//! The [`Evaluator`] replays the formula stored at an entry cell using only the values in a
//! [`Context`]. Parameter cells can be overridden per call; the context itself is never
//! modified, so one evaluation cannot leak into the next.

use crate::context::Context;
use crate::error::{Error, Result};
use ahash::{AHashMap, AHashSet};
use cellbind_core::{RawValue, Range, Reference, Sheet};
use cellbind_formula::{
    evaluate_formula, visit_references, CellReference, EvaluationContext, FormulaError,
    FormulaResult, FormulaValue, RangeReference, ReferenceResolver, SheetQualifier,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::sync::Arc;

/// Evaluates entry cells of a borrowed context
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'c> {
    context: &'c Context,
}

impl<'c> Evaluator<'c> {
    pub fn new(context: &'c Context) -> Self {
        Self { context }
    }

    /// Evaluate `entry`, with `args[i]` standing in for the value of `parameters[i]`.
    ///
    /// Missing arguments leave the parameter at its context value; extra arguments are
    /// ignored. A literal entry evaluates to itself.
    ///
    /// # Errors
    /// - [`Error::EntryNotDefined`] when the entry has no value
    /// - [`Error::CircularDependency`] when a formula reaches itself
    /// - [`Error::FormulaEvaluation`] when the formula cannot be parsed or evaluated
    pub fn evaluate(
        &self,
        entry: &Reference,
        parameters: &[Reference],
        args: &[RawValue],
    ) -> Result<FormulaValue> {
        let session = self.session(parameters, args);
        if args.len() > parameters.len() {
            log::debug!(
                "{} takes {} argument(s), ignoring {}",
                entry,
                parameters.len(),
                args.len() - parameters.len()
            );
        }

        if session.lookup(entry).is_none() {
            return Err(Error::EntryNotDefined(entry.to_string()));
        }
        let value = session.evaluate(entry).map_err(|e| Error::formula(entry, e));
        log::debug!("{} evaluated with {} formula(s)", entry, session.evaluated.get());
        value
    }

    fn session(&self, parameters: &[Reference], args: &[RawValue]) -> Session<'c> {
        let mut overrides = AHashMap::with_capacity(args.len());
        for (parameter, arg) in parameters.iter().zip(args) {
            log::trace!("override {} = {:?}", parameter, arg);
            overrides.insert(*parameter, arg.clone());
        }
        Session {
            context: self.context,
            overrides,
            computed: RefCell::new(AHashMap::new()),
            evaluated: Cell::new(0),
        }
    }
}

/// One evaluation: the context, its overrides and every formula computed so far.
///
/// Formulas are computed dependencies first, so an operand that is a formula is always
/// already in `computed` unless it lies on a cycle.
struct Session<'c> {
    context: &'c Context,
    overrides: AHashMap<Reference, RawValue>,
    computed: RefCell<AHashMap<Reference, FormulaResult<FormulaValue>>>,
    evaluated: Cell<usize>,
}

impl Session<'_> {
    fn lookup(&self, reference: &Reference) -> Option<&RawValue> {
        self.overrides
            .get(reference)
            .or_else(|| self.context.get(reference))
    }

    fn formula(&self, reference: &Reference) -> Option<&str> {
        match self.lookup(reference) {
            Some(RawValue::Formula(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Compute `entry` after every formula it reaches, walking the graph with an explicit
    /// stack in post-order.
    fn evaluate(&self, entry: &Reference) -> FormulaResult<FormulaValue> {
        let mut seen = AHashSet::new();
        let mut stack = vec![(*entry, false)];

        while let Some((cell, expanded)) = stack.pop() {
            if expanded {
                self.compute(&cell);
                continue;
            }
            // Seen cells are either computed or an ancestor on the current path.
            if !seen.insert(cell) {
                continue;
            }
            let Some(text) = self.formula(&cell) else {
                continue;
            };
            stack.push((cell, true));
            for operand in self.operands(&cell, text).into_iter().rev() {
                if !seen.contains(&operand) && self.formula(&operand).is_some() {
                    stack.push((operand, false));
                }
            }
        }

        self.value_of(entry)
    }

    /// Cells a formula reads, ranges expanded. Operands qualified by sheet name are left
    /// out; they fail when the formula is computed.
    fn operands(&self, reference: &Reference, text: &str) -> Vec<Reference> {
        let operands = RefCell::new(Vec::new());
        let sheet_of = |qualifier: Option<&SheetQualifier>| match qualifier {
            None => Some(reference.sheet()),
            Some(SheetQualifier::Id(sheet)) => Some(*sheet),
            Some(SheetQualifier::Name(_)) => None,
        };

        let visited = visit_references(
            text,
            |cell| {
                if let Some(sheet) = sheet_of(cell.sheet.as_ref()) {
                    operands.borrow_mut().push(cell.on_sheet(sheet));
                }
            },
            |range| {
                let Some(sheet) = sheet_of(range.sheet()) else {
                    return;
                };
                let (start, end) = (range.start.on_sheet(sheet), range.end.on_sheet(sheet));
                if let Ok(range) = Range::new(start, end) {
                    operands.borrow_mut().extend(range.iter());
                }
            },
        );
        if let Err(e) = visited {
            log::trace!("{} has no readable operands: {}", reference, e);
        }
        operands.into_inner()
    }

    fn compute(&self, reference: &Reference) {
        let Some(text) = self.formula(reference) else {
            return;
        };
        let scope = Scope {
            session: self,
            sheet: reference.sheet(),
        };
        let result = evaluate_formula(text, &EvaluationContext::new(&scope));
        self.evaluated.set(self.evaluated.get() + 1);
        self.computed.borrow_mut().insert(*reference, result);
    }

    fn value_of(&self, reference: &Reference) -> FormulaResult<FormulaValue> {
        match self.lookup(reference) {
            None => Ok(FormulaValue::Empty),
            Some(RawValue::Formula(_)) => self
                .computed
                .borrow()
                .get(reference)
                .cloned()
                .unwrap_or_else(|| Err(FormulaError::CircularReference(reference.to_string()))),
            Some(literal) => Ok(FormulaValue::from(literal)),
        }
    }
}

/// Resolves the operands of a formula living on `sheet`
struct Scope<'s, 'c> {
    session: &'s Session<'c>,
    sheet: Sheet,
}

impl Scope<'_, '_> {
    fn sheet_of(&self, qualifier: Option<&SheetQualifier>) -> FormulaResult<Sheet> {
        match qualifier {
            None => Ok(self.sheet),
            Some(SheetQualifier::Id(sheet)) => Ok(*sheet),
            Some(SheetQualifier::Name(name)) => Err(FormulaError::InvalidReference(format!(
                "sheet '{}' is not part of the context",
                name
            ))),
        }
    }
}

impl ReferenceResolver for Scope<'_, '_> {
    fn resolve_cell(&self, reference: &CellReference) -> FormulaResult<FormulaValue> {
        let sheet = self.sheet_of(reference.sheet.as_ref())?;
        self.session.value_of(&reference.on_sheet(sheet))
    }

    fn resolve_range(&self, reference: &RangeReference) -> FormulaResult<Vec<Vec<FormulaValue>>> {
        let sheet = self.sheet_of(reference.sheet())?;
        let range = Range::new(reference.start.on_sheet(sheet), reference.end.on_sheet(sheet))
            .map_err(|e| FormulaError::InvalidReference(e.to_string()))?;

        range
            .to_table()
            .iter()
            .map(|row| row.iter().map(|cell| self.session.value_of(cell)).collect())
            .collect()
    }
}

/// Something that can be called with positional arguments
pub trait Invoke {
    fn invoke(&self, args: &[RawValue]) -> Result<FormulaValue>;
}

/// A callable export: an entry cell, its parameter cells and the context they live in.
///
/// This is plain data. It serializes with serde, and a deserialized copy invokes exactly
/// like the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledFunction {
    entry: Reference,
    parameters: Vec<Reference>,
    context: Arc<Context>,
}

impl CompiledFunction {
    pub fn new(entry: Reference, parameters: Vec<Reference>, context: Arc<Context>) -> Self {
        Self {
            entry,
            parameters,
            context,
        }
    }

    pub fn entry(&self) -> &Reference {
        &self.entry
    }

    /// Parameter cells in argument order
    pub fn parameters(&self) -> &[Reference] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }
}

impl Invoke for CompiledFunction {
    fn invoke(&self, args: &[RawValue]) -> Result<FormulaValue> {
        Evaluator::new(&self.context).evaluate(&self.entry, &self.parameters, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellbind_core::CellError;
    use pretty_assertions::assert_eq;

    fn r(label: &str) -> Reference {
        Reference::parse(label).unwrap()
    }

    fn context(cells: &[(&str, RawValue)]) -> Context {
        cells.iter().map(|(l, v)| (r(l), v.clone())).collect()
    }

    #[test]
    fn test_nested_formulas() {
        let ctx = context(&[
            ("1!A1", RawValue::Number(2.0)),
            ("1!A2", RawValue::text("=A1*10")),
            ("1!A3", RawValue::text("=A2+1!$A$1")),
        ]);
        let value = Evaluator::new(&ctx).evaluate(&r("1!A3"), &[], &[]).unwrap();
        assert_eq!(value, FormulaValue::Number(22.0));
    }

    #[test]
    fn test_partial_application() {
        let ctx = context(&[
            ("1!A1", RawValue::Number(1.0)),
            ("1!B1", RawValue::Number(2.0)),
            ("1!C1", RawValue::text("=A1*B1")),
        ]);
        let eval = Evaluator::new(&ctx);
        let params = [r("1!A1"), r("1!B1")];
        assert_eq!(
            eval.evaluate(&r("1!C1"), &params, &[RawValue::Number(5.0)]).unwrap(),
            FormulaValue::Number(10.0)
        );
        assert_eq!(
            eval.evaluate(
                &r("1!C1"),
                &params,
                &[RawValue::Number(1.0), RawValue::Number(3.0), RawValue::Number(9.0)]
            )
            .unwrap(),
            FormulaValue::Number(3.0)
        );
    }

    #[test]
    fn test_override_reaches_indirect_operands() {
        let ctx = context(&[
            ("1!A1", RawValue::Number(1.0)),
            ("1!A2", RawValue::text("=A1+1")),
            ("1!A3", RawValue::text("=SUM(A1:A2)")),
        ]);
        let value = Evaluator::new(&ctx)
            .evaluate(&r("1!A3"), &[r("1!A1")], &[RawValue::Number(10.0)])
            .unwrap();
        assert_eq!(value, FormulaValue::Number(21.0));
    }

    #[test]
    fn test_literal_entry() {
        let ctx = context(&[("1!A1", RawValue::text("hello"))]);
        let eval = Evaluator::new(&ctx);
        assert_eq!(
            eval.evaluate(&r("1!A1"), &[], &[]).unwrap(),
            FormulaValue::String("hello".into())
        );
        assert_eq!(
            eval.evaluate(&r("1!A1"), &[r("1!A1")], &["bye".into()]).unwrap(),
            FormulaValue::String("bye".into())
        );
    }

    #[test]
    fn test_missing_entry() {
        let ctx = Context::new();
        assert_eq!(
            Evaluator::new(&ctx).evaluate(&r("1!A1"), &[], &[]),
            Err(Error::EntryNotDefined("1!$A$1".into()))
        );
    }

    #[test]
    fn test_cycle_detected() {
        let ctx = context(&[
            ("1!A1", RawValue::text("=B1+1")),
            ("1!B1", RawValue::text("=A1+1")),
        ]);
        assert!(matches!(
            Evaluator::new(&ctx).evaluate(&r("1!A1"), &[], &[]),
            Err(Error::CircularDependency(_))
        ));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let ctx = context(&[
            ("1!A1", RawValue::Number(3.0)),
            ("1!B1", RawValue::text("=A1")),
            ("1!C1", RawValue::text("=A1")),
            ("1!D1", RawValue::text("=B1+C1")),
        ]);
        assert_eq!(
            Evaluator::new(&ctx).evaluate(&r("1!D1"), &[], &[]).unwrap(),
            FormulaValue::Number(6.0)
        );
    }

    #[test]
    fn test_each_formula_computed_once() {
        let mut cells = vec![(r("1!A1"), RawValue::Number(1.0))];
        for row in 2..=40 {
            let formula = format!("=A{}+A{}", row - 1, row - 1);
            cells.push((r(&format!("1!A{}", row)), RawValue::text(&formula)));
        }
        let ctx: Context = cells.into_iter().collect();

        let session = Evaluator::new(&ctx).session(&[], &[]);
        let value = session.evaluate(&r("1!A40")).unwrap();
        assert_eq!(value, FormulaValue::Number(2f64.powi(39)));
        assert_eq!(session.evaluated.get(), 39);
    }

    #[test]
    fn test_override_of_formula_cell_skips_its_operands() {
        let ctx = context(&[
            ("1!A1", RawValue::text("=NOSUCH()")),
            ("1!A2", RawValue::text("=A1*2")),
        ]);
        let session = Evaluator::new(&ctx).session(&[r("1!A1")], &[RawValue::Number(4.0)]);
        assert_eq!(session.evaluate(&r("1!A2")).unwrap(), FormulaValue::Number(8.0));
        assert_eq!(session.evaluated.get(), 1);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let ctx = context(&[("1!A1", RawValue::text("=A1+1"))]);
        assert!(matches!(
            Evaluator::new(&ctx).evaluate(&r("1!A1"), &[], &[]),
            Err(Error::CircularDependency(_))
        ));
    }

    #[test]
    fn test_evaluation_failure_is_distinct() {
        let ctx = context(&[("1!A1", RawValue::text("=NOSUCH(1)"))]);
        assert!(matches!(
            Evaluator::new(&ctx).evaluate(&r("1!A1"), &[], &[]),
            Err(Error::FormulaEvaluation { .. })
        ));
    }

    #[test]
    fn test_error_values_are_values() {
        let ctx = context(&[
            ("1!A1", RawValue::Text("#DIV/0!".into())),
            ("1!A2", RawValue::text("=IFERROR(A1,0)+1")),
            ("1!A3", RawValue::text("=A1+1")),
        ]);
        let eval = Evaluator::new(&ctx);
        assert_eq!(
            eval.evaluate(&r("1!A2"), &[], &[]).unwrap(),
            FormulaValue::Number(1.0)
        );
        assert_eq!(
            eval.evaluate(&r("1!A3"), &[], &[]).unwrap(),
            FormulaValue::Error(CellError::Div0)
        );
    }

    #[test]
    fn test_compiled_function_roundtrips_through_json() {
        let ctx = Arc::new(context(&[
            ("1!A1", RawValue::Number(1.0)),
            ("1!B1", RawValue::Number(2.0)),
            ("1!C1", RawValue::text("=A1+B1")),
        ]));
        let function = CompiledFunction::new(r("1!C1"), vec![r("1!A1"), r("1!B1")], ctx);

        let json = serde_json::to_string(&function).unwrap();
        let restored: CompiledFunction = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, function);
        assert_eq!(
            restored.invoke(&[RawValue::Number(3.0), RawValue::Number(4.0)]).unwrap(),
            function.invoke(&[RawValue::Number(3.0), RawValue::Number(4.0)]).unwrap()
        );
        assert_eq!(restored.arity(), 2);
    }
}
