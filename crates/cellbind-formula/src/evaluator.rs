//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values. Cell and range references are handed to a
//! [`ReferenceResolver`] supplied by the caller through an [`EvaluationContext`].

use crate::ast::{BinaryOperator, CellReference, FormulaExpr, RangeReference, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::parser::parse_formula;
use cellbind_core::{date_to_serial, CellError, RawValue};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),
    Array(Vec<Vec<FormulaValue>>),
    Empty,
}

impl FormulaValue {
    /// Convert to number, if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            FormulaValue::String(s) => s.trim().parse().ok(),
            FormulaValue::Empty => Some(0.0),
            FormulaValue::Error(_) | FormulaValue::Array(_) => None,
        }
    }

    /// Force conversion to number for arithmetic
    pub fn to_number(&self) -> FormulaResult<f64> {
        self.as_number()
            .ok_or_else(|| FormulaError::Evaluation(format!("Cannot convert {:?} to number", self)))
    }

    /// Convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(*n != 0.0),
            FormulaValue::Empty => Some(false),
            FormulaValue::String(s) if s.eq_ignore_ascii_case("TRUE") => Some(true),
            FormulaValue::String(s) if s.eq_ignore_ascii_case("FALSE") => Some(false),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Empty => String::new(),
            FormulaValue::Array(_) => CellError::Value.to_string(),
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Every scalar of the value; arrays are flattened row by row
    pub fn scalars(&self) -> Box<dyn Iterator<Item = &FormulaValue> + '_> {
        match self {
            FormulaValue::Array(rows) => Box::new(rows.iter().flatten()),
            scalar => Box::new(std::iter::once(scalar)),
        }
    }
}

/// Integral values print without a fraction, like a spreadsheet does
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<bool> for FormulaValue {
    fn from(b: bool) -> Self {
        FormulaValue::Boolean(b)
    }
}

impl From<&str> for FormulaValue {
    fn from(s: &str) -> Self {
        FormulaValue::String(s.to_string())
    }
}

/// Literal content of a cell. Formula text is kept as a string; evaluating it is the
/// resolver's job.
impl From<&RawValue> for FormulaValue {
    fn from(value: &RawValue) -> Self {
        match value {
            RawValue::Null => FormulaValue::Empty,
            RawValue::Boolean(b) => FormulaValue::Boolean(*b),
            RawValue::Number(n) => FormulaValue::Number(*n),
            RawValue::Text(s) => match CellError::from_str(s) {
                Some(e) => FormulaValue::Error(e),
                None => FormulaValue::String(s.clone()),
            },
            RawValue::Date(dt) => FormulaValue::Number(date_to_serial(dt)),
            RawValue::Formula(text) => FormulaValue::String(text.clone()),
        }
    }
}

/// Supplies values for the references a formula mentions
pub trait ReferenceResolver {
    /// Value of a single cell
    fn resolve_cell(&self, reference: &CellReference) -> FormulaResult<FormulaValue>;

    /// Values of a rectangular range, one inner vector per row
    fn resolve_range(&self, reference: &RangeReference) -> FormulaResult<Vec<Vec<FormulaValue>>>;
}

/// Context for formula evaluation
#[derive(Clone, Copy, Default)]
pub struct EvaluationContext<'a> {
    /// Source of reference values; without one every reference is empty
    resolver: Option<&'a dyn ReferenceResolver>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context that resolves references through `resolver`
    pub fn new(resolver: &'a dyn ReferenceResolver) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    /// Create a context without a resolver (for constant formulas and tests)
    pub fn simple() -> Self {
        Self { resolver: None }
    }

    /// Get a cell value
    pub fn get_cell_value(&self, reference: &CellReference) -> FormulaResult<FormulaValue> {
        match self.resolver {
            Some(resolver) => resolver.resolve_cell(reference),
            None => Ok(FormulaValue::Empty),
        }
    }

    /// Get a range of cell values as an array
    pub fn get_range_values(&self, reference: &RangeReference) -> FormulaResult<FormulaValue> {
        match self.resolver {
            Some(resolver) => resolver.resolve_range(reference).map(FormulaValue::Array),
            None => Ok(FormulaValue::Array(vec![])),
        }
    }
}

/// Parse and evaluate formula text in one step
pub fn evaluate_formula(text: &str, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let expr = parse_formula(text)?;
    evaluate(&expr, ctx)
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::String(s) => Ok(FormulaValue::String(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),
        FormulaExpr::Error(e) => Ok(FormulaValue::Error(*e)),

        // === References ===
        FormulaExpr::CellRef(cell_ref) => ctx.get_cell_value(cell_ref),
        FormulaExpr::RangeRef(range_ref) => ctx.get_range_values(range_ref),
        FormulaExpr::NameRef(_) => Ok(FormulaValue::Error(CellError::Name)),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),
        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),

        // === Arrays ===
        FormulaExpr::Array(rows) => {
            let mut result_rows = Vec::with_capacity(rows.len());
            for row in rows {
                let values = row
                    .iter()
                    .map(|expr| evaluate(expr, ctx))
                    .collect::<FormulaResult<Vec<_>>>()?;
                result_rows.push(values);
            }
            Ok(FormulaValue::Array(result_rows))
        }
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;

    // Propagate errors
    if let Some(e) = left_val.get_error().or_else(|| right_val.get_error()) {
        return Ok(FormulaValue::Error(e));
    }

    let arithmetic = |f: fn(f64, f64) -> f64| -> FormulaValue {
        match (left_val.as_number(), right_val.as_number()) {
            (Some(l), Some(r)) => {
                let result = f(l, r);
                if result.is_finite() {
                    FormulaValue::Number(result)
                } else {
                    FormulaValue::Error(CellError::Num)
                }
            }
            _ => FormulaValue::Error(CellError::Value),
        }
    };
    let ordering = || compare_values(&left_val, &right_val);

    let value = match op {
        BinaryOperator::Add => arithmetic(|l, r| l + r),
        BinaryOperator::Subtract => arithmetic(|l, r| l - r),
        BinaryOperator::Multiply => arithmetic(|l, r| l * r),
        BinaryOperator::Divide => match right_val.as_number() {
            Some(r) if r == 0.0 => FormulaValue::Error(CellError::Div0),
            _ => arithmetic(|l, r| l / r),
        },
        BinaryOperator::Power => arithmetic(f64::powf),

        BinaryOperator::Equal => FormulaValue::Boolean(ordering() == Ordering::Equal),
        BinaryOperator::NotEqual => FormulaValue::Boolean(ordering() != Ordering::Equal),
        BinaryOperator::LessThan => FormulaValue::Boolean(ordering() == Ordering::Less),
        BinaryOperator::LessEqual => FormulaValue::Boolean(ordering() != Ordering::Greater),
        BinaryOperator::GreaterThan => FormulaValue::Boolean(ordering() == Ordering::Greater),
        BinaryOperator::GreaterEqual => FormulaValue::Boolean(ordering() != Ordering::Less),

        BinaryOperator::Concat => {
            FormulaValue::String(left_val.as_string() + &right_val.as_string())
        }

        BinaryOperator::Range => {
            return Err(FormulaError::Evaluation(
                "Range operator needs cell references on both sides".into(),
            ))
        }
    };

    Ok(value)
}

/// Compare two values for ordering (spreadsheet-style comparison)
///
/// Numbers sort before text, text before booleans; text compares case-insensitively. An
/// empty cell takes the type of the other side: zero, empty text or FALSE.
fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Ordering {
    fn rank(value: &FormulaValue) -> u8 {
        match value {
            FormulaValue::Number(_) | FormulaValue::Empty => 0,
            FormulaValue::String(_) => 1,
            FormulaValue::Boolean(_) => 2,
            FormulaValue::Error(_) => 3,
            FormulaValue::Array(_) => 4,
        }
    }

    match (left, right) {
        (FormulaValue::String(l), FormulaValue::String(r)) => {
            l.to_lowercase().cmp(&r.to_lowercase())
        }
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => l.cmp(r),
        (FormulaValue::Error(l), FormulaValue::Error(r)) => l.code().cmp(&r.code()),
        (FormulaValue::Empty, FormulaValue::String(_)) => {
            compare_values(&FormulaValue::String(String::new()), right)
        }
        (FormulaValue::String(_), FormulaValue::Empty) => {
            compare_values(left, &FormulaValue::String(String::new()))
        }
        (FormulaValue::Empty, FormulaValue::Boolean(r)) => false.cmp(r),
        (FormulaValue::Boolean(l), FormulaValue::Empty) => l.cmp(&false),
        (l, r) if rank(l) == 0 && rank(r) == 0 => {
            let l = l.as_number().unwrap_or(0.0);
            let r = r.as_number().unwrap_or(0.0);
            l.partial_cmp(&r).unwrap_or(Ordering::Equal)
        }
        (l, r) => rank(l).cmp(&rank(r)),
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let val = evaluate(operand, ctx)?;

    if let Some(e) = val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    let n = match val.as_number() {
        Some(n) => n,
        None => return Ok(FormulaValue::Error(CellError::Value)),
    };

    Ok(FormulaValue::Number(match op {
        UnaryOperator::Negate => -n,
        UnaryOperator::Percent => n / 100.0,
    }))
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let func = get_function_registry()
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    let evaluated_args = args
        .iter()
        .map(|arg| evaluate(arg, ctx))
        .collect::<FormulaResult<Vec<_>>>()?;

    (func.implementation)(&evaluated_args, ctx)
}
