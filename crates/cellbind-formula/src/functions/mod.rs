//! Built-in spreadsheet functions

pub mod info;
pub mod logical;
pub mod math;
pub mod text;

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use ahash::AHashMap;
use cellbind_core::CellError;

/// Function implementation signature
pub type FunctionImpl = fn(&[FormulaValue], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    pub const fn new(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            implementation,
        }
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_text_functions();
        registry.register_info_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Register a function, replacing any previous definition of the same name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef::new("SUM", 1, None, math::fn_sum));
        self.register(FunctionDef::new("AVERAGE", 1, None, math::fn_average));
        self.register(FunctionDef::new("MIN", 1, None, math::fn_min));
        self.register(FunctionDef::new("MAX", 1, None, math::fn_max));
        self.register(FunctionDef::new("COUNT", 1, None, math::fn_count));
        self.register(FunctionDef::new("COUNTA", 1, None, math::fn_counta));
        self.register(FunctionDef::new("PRODUCT", 1, None, math::fn_product));
        self.register(FunctionDef::new("ABS", 1, Some(1), math::fn_abs));
        self.register(FunctionDef::new("ROUND", 1, Some(2), math::fn_round));
        self.register(FunctionDef::new("INT", 1, Some(1), math::fn_int));
        self.register(FunctionDef::new("MOD", 2, Some(2), math::fn_mod));
        self.register(FunctionDef::new("POWER", 2, Some(2), math::fn_power));
        self.register(FunctionDef::new("SQRT", 1, Some(1), math::fn_sqrt));
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef::new("IF", 2, Some(3), logical::fn_if));
        self.register(FunctionDef::new("AND", 1, None, logical::fn_and));
        self.register(FunctionDef::new("OR", 1, None, logical::fn_or));
        self.register(FunctionDef::new("NOT", 1, Some(1), logical::fn_not));
        self.register(FunctionDef::new("IFERROR", 2, Some(2), logical::fn_iferror));
    }

    fn register_text_functions(&mut self) {
        self.register(FunctionDef::new("LEN", 1, Some(1), text::fn_len));
        self.register(FunctionDef::new("UPPER", 1, Some(1), text::fn_upper));
        self.register(FunctionDef::new("LOWER", 1, Some(1), text::fn_lower));
        self.register(FunctionDef::new("LEFT", 1, Some(2), text::fn_left));
        self.register(FunctionDef::new("RIGHT", 1, Some(2), text::fn_right));
        self.register(FunctionDef::new("TRIM", 1, Some(1), text::fn_trim));
        self.register(FunctionDef::new("CONCAT", 1, None, text::fn_concat));
        self.register(FunctionDef::new("CONCATENATE", 1, None, text::fn_concat));
    }

    fn register_info_functions(&mut self) {
        self.register(FunctionDef::new("ISNUMBER", 1, Some(1), info::fn_isnumber));
        self.register(FunctionDef::new("ISTEXT", 1, Some(1), info::fn_istext));
        self.register(FunctionDef::new("ISBLANK", 1, Some(1), info::fn_isblank));
        self.register(FunctionDef::new("ISERROR", 1, Some(1), info::fn_iserror));
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a function body: a value, or a spreadsheet error to return as a value
pub(crate) type Outcome = Result<FormulaValue, CellError>;

/// Turn an [`Outcome`] into the evaluator's result type
pub(crate) fn finish(outcome: Outcome) -> FormulaResult<FormulaValue> {
    Ok(outcome.unwrap_or_else(FormulaValue::Error))
}

/// Numeric argument at `index`; empty counts as zero, missing falls back to `default`
pub(crate) fn number_arg(
    args: &[FormulaValue],
    index: usize,
    default: Option<f64>,
) -> Result<f64, CellError> {
    match args.get(index) {
        None => default.ok_or(CellError::Value),
        Some(FormulaValue::Error(e)) => Err(*e),
        Some(value) => value.as_number().ok_or(CellError::Value),
    }
}

/// Scalar argument at `index`; arrays are rejected and errors propagate
pub(crate) fn scalar_arg(args: &[FormulaValue], index: usize) -> Result<&FormulaValue, CellError> {
    match args.get(index) {
        Some(FormulaValue::Error(e)) => Err(*e),
        Some(FormulaValue::Array(_)) | None => Err(CellError::Value),
        Some(value) => Ok(value),
    }
}

/// Every number among the arguments, ranges flattened; other kinds are skipped and the
/// first error wins
pub(crate) fn collect_numbers(args: &[FormulaValue]) -> Result<Vec<f64>, CellError> {
    let mut numbers = Vec::new();
    for value in args.iter().flat_map(FormulaValue::scalars) {
        match value {
            FormulaValue::Number(n) => numbers.push(*n),
            FormulaValue::Error(e) => return Err(*e),
            _ => {}
        }
    }
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup_is_case_insensitive() {
        let registry = FunctionRegistry::new();
        assert!(registry.get("sum").is_some());
        assert!(registry.get("Concatenate").is_some());
        assert!(registry.get("VLOOKUP").is_none());
        assert_eq!(registry.len(), 30);
    }

    #[test]
    fn test_collect_numbers_flattens_arrays() {
        let args = vec![
            FormulaValue::Number(1.0),
            FormulaValue::Array(vec![
                vec![FormulaValue::Number(2.0), FormulaValue::String("x".into())],
                vec![FormulaValue::Empty, FormulaValue::Number(3.0)],
            ]),
        ];
        assert_eq!(collect_numbers(&args), Ok(vec![1.0, 2.0, 3.0]));

        let with_error = vec![FormulaValue::Error(CellError::Na)];
        assert_eq!(collect_numbers(&with_error), Err(CellError::Na));
    }
}
