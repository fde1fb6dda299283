//! Built-in formula functions

pub mod conversion;
pub mod math;

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::FormulaValue;
use std::collections::HashMap;

/// Function implementation signature
pub type FunctionImpl = fn(&[FormulaValue]) -> FormulaResult<f64>;

/// Function definition
pub struct FunctionDef {
    /// Function name (lowercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register_math_functions();
        registry.register_trig_functions();
        registry.register_conversion_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_lowercase())
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_lowercase(), def);
    }

    /// Names of all registered functions
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.functions.keys().map(String::as_str)
    }

    fn register_math_functions(&mut self) {
        // MIN
        self.register(FunctionDef {
            name: "min",
            min_args: 1,
            max_args: None,
            implementation: math::fn_min,
        });

        // MAX
        self.register(FunctionDef {
            name: "max",
            min_args: 1,
            max_args: None,
            implementation: math::fn_max,
        });

        // ROUND
        self.register(FunctionDef {
            name: "round",
            min_args: 1,
            max_args: Some(2),
            implementation: math::fn_round,
        });

        // FLOOR
        self.register(FunctionDef {
            name: "floor",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_floor,
        });

        // CEIL
        self.register(FunctionDef {
            name: "ceil",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_ceil,
        });

        // ABS
        self.register(FunctionDef {
            name: "abs",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_abs,
        });

        // SQRT
        self.register(FunctionDef {
            name: "sqrt",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_sqrt,
        });

        // POW
        self.register(FunctionDef {
            name: "pow",
            min_args: 2,
            max_args: Some(2),
            implementation: math::fn_pow,
        });

        // EXP
        self.register(FunctionDef {
            name: "exp",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_exp,
        });

        // LOG (natural log, optional base)
        self.register(FunctionDef {
            name: "log",
            min_args: 1,
            max_args: Some(2),
            implementation: math::fn_log,
        });
    }

    fn register_trig_functions(&mut self) {
        let unary: [(&'static str, FunctionImpl); 6] = [
            ("sin", math::fn_sin),
            ("cos", math::fn_cos),
            ("tan", math::fn_tan),
            ("asin", math::fn_asin),
            ("acos", math::fn_acos),
            ("atan", math::fn_atan),
        ];

        for (name, implementation) in unary {
            self.register(FunctionDef {
                name,
                min_args: 1,
                max_args: Some(1),
                implementation,
            });
        }
    }

    fn register_conversion_functions(&mut self) {
        // CONVERT(value, "from", "to")
        self.register(FunctionDef {
            name: "convert",
            min_args: 3,
            max_args: Some(3),
            implementation: conversion::fn_convert,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch argument `index` as a number
pub(crate) fn number_arg(args: &[FormulaValue], index: usize, function: &str) -> FormulaResult<f64> {
    match args.get(index) {
        Some(FormulaValue::Number(n)) => Ok(*n),
        Some(FormulaValue::Text(s)) => Err(FormulaError::Argument(format!(
            "{} expects a number for argument {}, got \"{}\"",
            function,
            index + 1,
            s
        ))),
        None => Err(FormulaError::Argument(format!(
            "{} is missing argument {}",
            function,
            index + 1
        ))),
    }
}

/// Fetch argument `index` as text
pub(crate) fn text_arg<'a>(
    args: &'a [FormulaValue],
    index: usize,
    function: &str,
) -> FormulaResult<&'a str> {
    match args.get(index) {
        Some(FormulaValue::Text(s)) => Ok(s),
        _ => Err(FormulaError::Argument(format!(
            "{} expects a quoted unit for argument {}",
            function,
            index + 1
        ))),
    }
}
