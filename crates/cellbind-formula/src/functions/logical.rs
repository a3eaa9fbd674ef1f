//! Logical functions

use super::{finish, scalar_arg};
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use cellbind_core::CellError;

fn truth(value: &FormulaValue) -> Result<bool, CellError> {
    match value {
        FormulaValue::Error(e) => Err(*e),
        other => other.as_bool().ok_or(CellError::Value),
    }
}

/// IF(condition, if_true, [if_false])
pub fn fn_if(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(scalar_arg(args, 0).and_then(truth).map(|condition| {
        if condition {
            args[1].clone()
        } else {
            args.get(2).cloned().unwrap_or(FormulaValue::Boolean(false))
        }
    }))
}

/// Truth values of every logical among the arguments; text inside ranges is skipped
fn logicals(args: &[FormulaValue]) -> Result<Vec<bool>, CellError> {
    let mut values = Vec::new();
    for arg in args {
        match arg {
            FormulaValue::Array(_) => {
                for cell in arg.scalars() {
                    match cell {
                        FormulaValue::String(_) | FormulaValue::Empty => {}
                        other => values.push(truth(other)?),
                    }
                }
            }
            other => values.push(truth(other)?),
        }
    }
    if values.is_empty() {
        Err(CellError::Value)
    } else {
        Ok(values)
    }
}

/// AND(logical, ...)
pub fn fn_and(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(logicals(args).map(|values| FormulaValue::Boolean(values.iter().all(|b| *b))))
}

/// OR(logical, ...)
pub fn fn_or(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(logicals(args).map(|values| FormulaValue::Boolean(values.iter().any(|b| *b))))
}

/// NOT(logical)
pub fn fn_not(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(
        scalar_arg(args, 0)
            .and_then(truth)
            .map(|b| FormulaValue::Boolean(!b)),
    )
}

/// IFERROR(value, fallback)
pub fn fn_iferror(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    if args[0].is_error() {
        Ok(args[1].clone())
    } else {
        Ok(args[0].clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate_formula, EvaluationContext, FormulaValue};
    use cellbind_core::CellError;

    fn eval(formula: &str) -> FormulaValue {
        evaluate_formula(formula, &EvaluationContext::simple()).unwrap()
    }

    #[test]
    fn test_if() {
        assert_eq!(eval("=IF(1>0,\"yes\",\"no\")"), FormulaValue::String("yes".into()));
        assert_eq!(eval("=IF(0,\"yes\",\"no\")"), FormulaValue::String("no".into()));
        assert_eq!(eval("=IF(FALSE,1)"), FormulaValue::Boolean(false));
        assert_eq!(eval("=IF(\"x\",1,2)"), FormulaValue::Error(CellError::Value));
    }

    #[test]
    fn test_and_or_not() {
        assert_eq!(eval("=AND(TRUE,1)"), FormulaValue::Boolean(true));
        assert_eq!(eval("=AND(TRUE,0)"), FormulaValue::Boolean(false));
        assert_eq!(eval("=OR(FALSE,0,1)"), FormulaValue::Boolean(true));
        assert_eq!(eval("=NOT(TRUE)"), FormulaValue::Boolean(false));
        assert_eq!(eval("=AND(\"x\")"), FormulaValue::Error(CellError::Value));
    }

    #[test]
    fn test_iferror() {
        assert_eq!(eval("=IFERROR(1/0,-1)"), FormulaValue::Number(-1.0));
        assert_eq!(eval("=IFERROR(5,-1)"), FormulaValue::Number(5.0));
    }
}
