//! Re-evaluating contexts with overridden inputs

use cellbind::{
    CompileExt, CompiledFunction, Context, Error, Evaluator, ExportEntry, ExportSpec,
    FormulaValue, Invoke, RawValue, Reference, Workbook,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn r(label: &str) -> Reference {
    Reference::parse(label).unwrap()
}

fn sum_context() -> Context {
    [
        (r("1!A1"), RawValue::Number(1.0)),
        (r("1!B1"), RawValue::Number(2.0)),
        (r("1!C1"), RawValue::text("=A1+B1")),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_arguments_override_parameters() {
    let context = sum_context();
    let before = context.clone();
    let evaluator = Evaluator::new(&context);
    let params = [r("1!A1"), r("1!B1")];

    assert_eq!(
        evaluator.evaluate(&r("1!C1"), &params, &[]).unwrap(),
        FormulaValue::Number(3.0)
    );
    assert_eq!(
        evaluator
            .evaluate(&r("1!C1"), &params, &[RawValue::Number(3.0), RawValue::Number(4.0)])
            .unwrap(),
        FormulaValue::Number(7.0)
    );
    // Nothing from the previous call sticks
    assert_eq!(
        evaluator.evaluate(&r("1!C1"), &params, &[]).unwrap(),
        FormulaValue::Number(3.0)
    );
    assert_eq!(context, before);
}

#[test]
fn test_entry_not_defined_differs_from_evaluation_failure() {
    let mut context = sum_context();
    context.insert(r("1!D1"), RawValue::text("=A1+"));
    let evaluator = Evaluator::new(&context);

    let missing = evaluator.evaluate(&r("1!Z9"), &[], &[]).unwrap_err();
    assert!(matches!(missing, Error::EntryNotDefined(_)));
    assert!(missing.is_input_error());

    let broken = evaluator.evaluate(&r("1!D1"), &[], &[]).unwrap_err();
    assert!(matches!(broken, Error::FormulaEvaluation { .. }));
    assert!(broken.is_computation_error());
}

#[test]
fn test_range_operands_see_overrides() {
    let context: Context = [
        (r("1!A1"), RawValue::Number(1.0)),
        (r("1!A2"), RawValue::Number(2.0)),
        (r("1!A3"), RawValue::text("=A1*10")),
        (r("1!B1"), RawValue::text("=SUM(A1:A3)")),
        (r("1!B2"), RawValue::text("=COUNT(A1:A3)")),
    ]
    .into_iter()
    .collect();
    let evaluator = Evaluator::new(&context);

    assert_eq!(
        evaluator.evaluate(&r("1!B1"), &[r("1!A1")], &[RawValue::Number(2.0)]).unwrap(),
        FormulaValue::Number(24.0)
    );
    assert_eq!(
        evaluator
            .evaluate(&r("1!B2"), &[r("1!A2")], &[RawValue::text("two")])
            .unwrap(),
        FormulaValue::Number(2.0)
    );
}

#[test]
fn test_date_cells_evaluate_as_serials() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let context: Context = [
        (r("1!A1"), RawValue::Date(date)),
        (r("1!A2"), RawValue::text("=A1+1")),
    ]
    .into_iter()
    .collect();

    assert_eq!(
        Evaluator::new(&context).evaluate(&r("1!A2"), &[], &[]).unwrap(),
        FormulaValue::Number(45353.5)
    );
}

#[test]
fn test_self_reference_is_a_cycle() {
    let context: Context = [(r("1!A1"), RawValue::text("=A1+1"))].into_iter().collect();
    assert_eq!(
        Evaluator::new(&context).evaluate(&r("1!A1"), &[], &[]),
        Err(Error::CircularDependency("1!$A$1".into()))
    );
}

#[test]
fn test_overriding_a_cycle_member_breaks_it() {
    let context: Context = [
        (r("1!A1"), RawValue::text("=B1+1")),
        (r("1!B1"), RawValue::text("=A1+1")),
    ]
    .into_iter()
    .collect();
    let value = Evaluator::new(&context)
        .evaluate(&r("1!A1"), &[r("1!B1")], &[RawValue::Number(5.0)])
        .unwrap();
    assert_eq!(value, FormulaValue::Number(6.0));
}

#[test]
fn test_compiled_functions_share_a_context() {
    let context = Arc::new(sum_context());
    let add = CompiledFunction::new(r("1!C1"), vec![r("1!A1"), r("1!B1")], Arc::clone(&context));
    let echo = CompiledFunction::new(r("1!B1"), vec![r("1!B1")], Arc::clone(&context));

    assert_eq!(add.invoke(&[RawValue::Number(10.0)]).unwrap(), FormulaValue::Number(12.0));
    assert_eq!(echo.invoke(&["hi".into()]).unwrap(), FormulaValue::String("hi".into()));
    assert_eq!(Arc::strong_count(&context), 3);
}

#[test]
fn test_long_running_total_column() {
    const ROWS: u32 = 10_000;

    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    sheet.set_cell_value("A1", 1.0).unwrap();
    for row in 2..=ROWS {
        sheet
            .set_cell_formula(&format!("A{}", row), &format!("=A{}+1", row - 1))
            .unwrap();
    }

    let last = format!("A{}", ROWS);
    let spec = ExportSpec::new().with("total", ExportEntry::callable(last.as_str(), ["A1"]));
    let exports = wb.compile(&spec).unwrap();
    assert_eq!(exports.context().len(), ROWS as usize);

    let total = exports["total"].as_callable().unwrap();
    assert_eq!(total.invoke(&[]).unwrap(), FormulaValue::Number(f64::from(ROWS)));
    assert_eq!(
        total.invoke(&[RawValue::Number(5.0)]).unwrap(),
        FormulaValue::Number(f64::from(ROWS) + 4.0)
    );
}

#[test]
fn test_long_cycle_is_reported() {
    let mut context: Context = (2..=5_000)
        .map(|row| {
            let formula = format!("=A{}+1", row - 1);
            (r(&format!("1!A{}", row)), RawValue::text(formula))
        })
        .collect();
    context.insert(r("1!A1"), RawValue::text("=A5000"));

    let err = Evaluator::new(&context)
        .evaluate(&r("1!A5000"), &[], &[])
        .unwrap_err();
    assert!(matches!(err, Error::CircularDependency(_)));
}
