//! Formula evaluator
//!
//! Evaluates formula ASTs to produce numbers.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator, VariableRef};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::parser::parse_formula;
use dosekit_core::resolver::resolve_segments;
use dosekit_core::VariableContext;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// What to do when a formula reads a variable the context does not have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingVariablePolicy {
    /// Treat the variable as 0 (tolerant, for one-off calculations)
    SubstituteZero,
    /// Fail with [`FormulaError::UndefinedVariable`] (strict)
    #[default]
    Error,
}

/// Argument values passed to built-in functions
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Text(String),
}

impl FormulaValue {
    /// Convert to number, if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Text(_) => None,
        }
    }

    /// Get the text, if this is a string literal
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormulaValue::Text(s) => Some(s),
            FormulaValue::Number(_) => None,
        }
    }
}

/// Context for formula evaluation
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    /// Variables visible to the formula
    pub variables: &'a VariableContext,
    /// Fallback values for paths missing from `variables`
    pub defaults: Option<&'a VariableContext>,
    /// Handling of variables found in neither
    pub policy: MissingVariablePolicy,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(variables: &'a VariableContext, policy: MissingVariablePolicy) -> Self {
        Self {
            variables,
            defaults: None,
            policy,
        }
    }

    /// Strict context: missing variables are errors
    pub fn strict(variables: &'a VariableContext) -> Self {
        Self::new(variables, MissingVariablePolicy::Error)
    }

    /// Tolerant context: missing variables are 0
    pub fn tolerant(variables: &'a VariableContext) -> Self {
        Self::new(variables, MissingVariablePolicy::SubstituteZero)
    }

    /// Attach a defaults context
    pub fn with_defaults(mut self, defaults: Option<&'a VariableContext>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Look up a variable and coerce it to a number
    pub fn lookup(&self, var: &VariableRef) -> FormulaResult<f64> {
        match resolve_segments(&var.segments, self.variables, self.defaults) {
            Some(value) => Ok(value.to_number()),
            None => match self.policy {
                MissingVariablePolicy::SubstituteZero => Ok(0.0),
                MissingVariablePolicy::Error => {
                    Err(FormulaError::UndefinedVariable(var.path.clone()))
                }
            },
        }
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<f64> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(*n),
        FormulaExpr::String(s) => Err(FormulaError::Evaluation(format!(
            "Text \"{}\" cannot be used as a number",
            s
        ))),

        // === References ===
        FormulaExpr::Variable(var) => ctx.lookup(var),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => {
            let n = evaluate(operand, ctx)?;
            match op {
                UnaryOperator::Negate => Ok(-n),
            }
        }

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a binary operation
///
/// Division by zero and overflow follow IEEE-754 (`Infinity`, `NaN`).
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<f64> {
    let l = evaluate(left, ctx)?;
    let r = evaluate(right, ctx)?;

    Ok(match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => l / r,
        BinaryOperator::Power => l.powf(r),
    })
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<f64> {
    let registry = get_function_registry();

    let func = registry
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

    // Evaluate arguments; string literals pass through as text
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        let value = match arg {
            FormulaExpr::String(s) => FormulaValue::Text(s.clone()),
            other => FormulaValue::Number(evaluate(other, ctx)?),
        };
        evaluated_args.push(value);
    }

    // Call the function
    (func.implementation)(&evaluated_args)
}

/// Parse and evaluate an expression against a context
///
/// With [`MissingVariablePolicy::SubstituteZero`] every failure (syntax
/// errors, unknown functions, bad arguments) yields `Ok(0.0)`; with
/// [`MissingVariablePolicy::Error`] failures are returned.
pub fn evaluate_expression(
    expression: &str,
    context: &VariableContext,
    policy: MissingVariablePolicy,
) -> FormulaResult<f64> {
    evaluate_with_defaults(expression, context, None, policy)
}

/// [`evaluate_expression`] with a defaults context
pub fn evaluate_with_defaults(
    expression: &str,
    context: &VariableContext,
    defaults: Option<&VariableContext>,
    policy: MissingVariablePolicy,
) -> FormulaResult<f64> {
    let ctx = EvaluationContext::new(context, policy).with_defaults(defaults);
    let result = parse_formula(expression).and_then(|ast| evaluate(&ast, &ctx));

    match (result, policy) {
        (Err(e), MissingVariablePolicy::SubstituteZero) => {
            log::debug!("Tolerant evaluation of '{}' fell back to 0: {}", expression, e);
            Ok(0.0)
        }
        (result, _) => result,
    }
}

/// Tolerant one-shot evaluation: never fails, missing variables are 0
pub fn evaluate_tolerant(expression: &str, context: &VariableContext) -> f64 {
    evaluate_expression(expression, context, MissingVariablePolicy::SubstituteZero)
        .unwrap_or(0.0)
}
