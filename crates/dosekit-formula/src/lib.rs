//! # dosekit-formula
//!
//! Formula parser and evaluator for dosekit.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Formula evaluation (AST → number) with a strict or tolerant
//!   [`MissingVariablePolicy`]
//! - The built-in function library (`min`, `max`, `round`, `sqrt`, trig, ...)
//! - Unit conversion between clinical units
//! - Dependency tracking between named formulas
//!
//! The grammar is a pure arithmetic language: literals, variable paths,
//! `+ - * / ^`, parentheses and calls to the fixed function library. There is
//! no assignment, no control flow and no access to anything but the context.
//!
//! ## Example
//!
//! ```rust
//! use dosekit_core::VariableContext;
//! use dosekit_formula::{evaluate_expression, MissingVariablePolicy};
//!
//! let context = VariableContext::new().with("weight", 70);
//! let dose = evaluate_expression("weight * 2", &context, MissingVariablePolicy::Error).unwrap();
//! assert_eq!(dose, 140.0);
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod units;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator, VariableRef};
pub use dependency::{DependencyGraph, EvaluationOrder};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    evaluate, evaluate_expression, evaluate_tolerant, evaluate_with_defaults, EvaluationContext,
    FormulaValue, MissingVariablePolicy,
};
pub use parser::parse_formula;
pub use units::{convert_unit, unit_category, UnitCategory};
