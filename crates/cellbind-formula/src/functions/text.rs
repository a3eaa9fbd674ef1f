//! Text functions

use super::{finish, number_arg, scalar_arg, Outcome};
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use cellbind_core::CellError;

fn text_arg(args: &[FormulaValue], index: usize) -> Result<String, CellError> {
    scalar_arg(args, index).map(FormulaValue::as_string)
}

fn count_arg(args: &[FormulaValue]) -> Result<usize, CellError> {
    let n = number_arg(args, 1, Some(1.0))?.trunc();
    if n < 0.0 {
        Err(CellError::Value)
    } else {
        Ok(n as usize)
    }
}

/// LEN(text)
pub fn fn_len(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(text_arg(args, 0).map(|s| FormulaValue::Number(s.chars().count() as f64)))
}

/// UPPER(text)
pub fn fn_upper(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(text_arg(args, 0).map(|s| FormulaValue::String(s.to_uppercase())))
}

/// LOWER(text)
pub fn fn_lower(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(text_arg(args, 0).map(|s| FormulaValue::String(s.to_lowercase())))
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish((|| -> Outcome {
        let s = text_arg(args, 0)?;
        let n = count_arg(args)?;
        Ok(FormulaValue::String(s.chars().take(n).collect()))
    })())
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish((|| -> Outcome {
        let s = text_arg(args, 0)?;
        let n = count_arg(args)?;
        let len = s.chars().count();
        Ok(FormulaValue::String(s.chars().skip(len.saturating_sub(n)).collect()))
    })())
}

/// TRIM(text); collapses inner runs of spaces to one
pub fn fn_trim(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(text_arg(args, 0).map(|s| {
        FormulaValue::String(s.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" "))
    }))
}

/// CONCAT(text, ...) and CONCATENATE(text, ...)
pub fn fn_concat(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut out = String::new();
    for value in args.iter().flat_map(FormulaValue::scalars) {
        if let FormulaValue::Error(e) = value {
            return Ok(FormulaValue::Error(*e));
        }
        out.push_str(&value.as_string());
    }
    Ok(FormulaValue::String(out))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate_formula, EvaluationContext, FormulaValue};
    use cellbind_core::CellError;

    fn eval(formula: &str) -> FormulaValue {
        evaluate_formula(formula, &EvaluationContext::simple()).unwrap()
    }

    fn text(s: &str) -> FormulaValue {
        FormulaValue::String(s.into())
    }

    #[test]
    fn test_case_and_length() {
        assert_eq!(eval("=LEN(\"héllo\")"), FormulaValue::Number(5.0));
        assert_eq!(eval("=LEN(12.5)"), FormulaValue::Number(4.0));
        assert_eq!(eval("=UPPER(\"abc\")"), text("ABC"));
        assert_eq!(eval("=LOWER(\"ABC\")"), text("abc"));
    }

    #[test]
    fn test_slicing() {
        assert_eq!(eval("=LEFT(\"spreadsheet\",6)"), text("spread"));
        assert_eq!(eval("=LEFT(\"abc\")"), text("a"));
        assert_eq!(eval("=RIGHT(\"spreadsheet\",5)"), text("sheet"));
        assert_eq!(eval("=RIGHT(\"ab\",9)"), text("ab"));
        assert_eq!(eval("=LEFT(\"abc\",-1)"), FormulaValue::Error(CellError::Value));
    }

    #[test]
    fn test_trim_and_concat() {
        assert_eq!(eval("=TRIM(\"  a   b \")"), text("a b"));
        assert_eq!(eval("=CONCAT(\"a\",1,TRUE)"), text("a1TRUE"));
        assert_eq!(eval("=CONCATENATE(\"x\",{1,2})"), text("x12"));
        assert_eq!(eval("=CONCAT(\"a\",#REF!)"), FormulaValue::Error(CellError::Ref));
    }
}
