//! Math and aggregate functions

use super::{collect_numbers, finish, number_arg, Outcome};
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use cellbind_core::CellError;

/// SUM(value, ...)
pub fn fn_sum(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|numbers| FormulaValue::Number(numbers.iter().sum())))
}

/// AVERAGE(value, ...)
pub fn fn_average(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).and_then(|numbers| {
        if numbers.is_empty() {
            Err(CellError::Div0)
        } else {
            let sum: f64 = numbers.iter().sum();
            Ok(FormulaValue::Number(sum / numbers.len() as f64))
        }
    }))
}

/// MIN(value, ...); zero when no numbers are present
pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|numbers| {
        FormulaValue::Number(numbers.into_iter().reduce(f64::min).unwrap_or(0.0))
    }))
}

/// MAX(value, ...); zero when no numbers are present
pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|numbers| {
        FormulaValue::Number(numbers.into_iter().reduce(f64::max).unwrap_or(0.0))
    }))
}

/// COUNT(value, ...)
pub fn fn_count(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let count = args
        .iter()
        .flat_map(FormulaValue::scalars)
        .filter(|v| matches!(v, FormulaValue::Number(_)))
        .count();
    Ok(FormulaValue::Number(count as f64))
}

/// COUNTA(value, ...)
pub fn fn_counta(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let count = args
        .iter()
        .flat_map(FormulaValue::scalars)
        .filter(|v| !matches!(v, FormulaValue::Empty))
        .count();
    Ok(FormulaValue::Number(count as f64))
}

/// PRODUCT(value, ...)
pub fn fn_product(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(collect_numbers(args).map(|numbers| {
        if numbers.is_empty() {
            FormulaValue::Number(0.0)
        } else {
            FormulaValue::Number(numbers.iter().product())
        }
    }))
}

/// ABS(number)
pub fn fn_abs(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(number_arg(args, 0, None).map(|n| FormulaValue::Number(n.abs())))
}

/// ROUND(number, [digits]); halves round away from zero
pub fn fn_round(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish((|| -> Outcome {
        let number = number_arg(args, 0, None)?;
        let digits = number_arg(args, 1, Some(0.0))?.trunc() as i32;
        Ok(FormulaValue::Number(round_to(number, digits)))
    })())
}

fn round_to(number: f64, digits: i32) -> f64 {
    // Cut to 15 significant digits before rounding so 2.675 * 100 is 267.5, at any magnitude
    let nudge = |x: f64| format!("{:.14e}", x).parse::<f64>().unwrap_or(x).round();
    if digits >= 0 {
        let factor = 10f64.powi(digits);
        nudge(number * factor) / factor
    } else {
        let factor = 10f64.powi(-digits);
        nudge(number / factor) * factor
    }
}

/// INT(number); rounds toward negative infinity
pub fn fn_int(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(number_arg(args, 0, None).map(|n| FormulaValue::Number(n.floor())))
}

/// MOD(number, divisor); the result takes the divisor's sign
pub fn fn_mod(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish((|| -> Outcome {
        let number = number_arg(args, 0, None)?;
        let divisor = number_arg(args, 1, None)?;
        if divisor == 0.0 {
            return Err(CellError::Div0);
        }
        Ok(FormulaValue::Number(number - divisor * (number / divisor).floor()))
    })())
}

/// POWER(number, power)
pub fn fn_power(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish((|| -> Outcome {
        let base = number_arg(args, 0, None)?;
        let exponent = number_arg(args, 1, None)?;
        if base == 0.0 && exponent < 0.0 {
            return Err(CellError::Div0);
        }
        let result = base.powf(exponent);
        if result.is_finite() {
            Ok(FormulaValue::Number(result))
        } else {
            Err(CellError::Num)
        }
    })())
}

/// SQRT(number)
pub fn fn_sqrt(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    finish(number_arg(args, 0, None).and_then(|n| {
        if n < 0.0 {
            Err(CellError::Num)
        } else {
            Ok(FormulaValue::Number(n.sqrt()))
        }
    }))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{evaluate_formula, EvaluationContext, FormulaValue};
    use cellbind_core::CellError;

    fn eval(formula: &str) -> FormulaValue {
        evaluate_formula(formula, &EvaluationContext::simple()).unwrap()
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(eval("=SUM(1,2,3)"), FormulaValue::Number(6.0));
        assert_eq!(eval("=SUM({1,2;3,4})"), FormulaValue::Number(10.0));
        assert_eq!(eval("=AVERAGE(2,4)"), FormulaValue::Number(3.0));
        assert_eq!(eval("=MIN(4,-1,7)"), FormulaValue::Number(-1.0));
        assert_eq!(eval("=MAX(4,-1,7)"), FormulaValue::Number(7.0));
        assert_eq!(eval("=COUNT(1,\"a\",TRUE,2)"), FormulaValue::Number(2.0));
        assert_eq!(eval("=COUNTA(1,\"a\",TRUE)"), FormulaValue::Number(3.0));
        assert_eq!(eval("=PRODUCT(2,3,4)"), FormulaValue::Number(24.0));
    }

    #[test]
    fn test_aggregate_errors() {
        assert_eq!(eval("=AVERAGE(\"x\")"), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=SUM(1,#N/A)"), FormulaValue::Error(CellError::Na));
    }

    #[test]
    fn test_scalar_math() {
        assert_eq!(eval("=ABS(-3)"), FormulaValue::Number(3.0));
        assert_eq!(eval("=ROUND(2.675,2)"), FormulaValue::Number(2.68));
        assert_eq!(eval("=ROUND(-2.5)"), FormulaValue::Number(-3.0));
        assert_eq!(eval("=ROUND(1234,-2)"), FormulaValue::Number(1200.0));
        assert_eq!(eval("=ROUND(1234567.895,2)"), FormulaValue::Number(1234567.9));
        assert_eq!(eval("=ROUND(0.285,2)"), FormulaValue::Number(0.29));
        assert_eq!(eval("=ROUND(1000000000000000.25,0)"), FormulaValue::Number(1e15));
        assert_eq!(eval("=ROUND(-1234567.895,2)"), FormulaValue::Number(-1234567.9));
        assert_eq!(eval("=INT(-1.5)"), FormulaValue::Number(-2.0));
        assert_eq!(eval("=MOD(-3,2)"), FormulaValue::Number(1.0));
        assert_eq!(eval("=MOD(1,0)"), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=POWER(2,10)"), FormulaValue::Number(1024.0));
        assert_eq!(eval("=SQRT(16)"), FormulaValue::Number(4.0));
        assert_eq!(eval("=SQRT(-1)"), FormulaValue::Error(CellError::Num));
        assert_eq!(eval("=ABS(\"x\")"), FormulaValue::Error(CellError::Value));
    }
}
