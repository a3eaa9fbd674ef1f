//! Information functions

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use cellbind_core::CellError;

fn classify(args: &[FormulaValue], test: fn(&FormulaValue) -> bool) -> FormulaValue {
    match &args[0] {
        FormulaValue::Array(_) => FormulaValue::Error(CellError::Value),
        value => FormulaValue::Boolean(test(value)),
    }
}

/// ISBLANK(value)
pub fn fn_isblank(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(classify(args, |v| matches!(v, FormulaValue::Empty)))
}

/// ISNUMBER(value)
pub fn fn_isnumber(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(classify(args, |v| matches!(v, FormulaValue::Number(_))))
}

/// ISTEXT(value)
pub fn fn_istext(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(classify(args, |v| matches!(v, FormulaValue::String(_))))
}

/// ISERROR(value)
pub fn fn_iserror(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(classify(args, FormulaValue::is_error))
}
