//! # dosekit
//!
//! A formula engine for clinical dose calculations.
//!
//! Dosekit evaluates arithmetic formulas such as `weight * 15` or
//! `min(weight * 2.5, 200)` against a nested context of patient values.
//!
//! ## Features
//!
//! - Dotted and indexed variable paths (`patient.weight`, `doses[0]`)
//! - A fixed function library (`min`, `max`, `round`, `sqrt`, trig, ...)
//! - Unit conversion between clinical units (`convert(weight, "kg", "lb")`)
//! - Strict or tolerant handling of missing variables
//! - Batches of named formulas that reference each other, evaluated in
//!   dependency order with circular reference detection
//! - A per-engine result cache
//!
//! ## Example
//!
//! ```rust
//! use dosekit::prelude::*;
//!
//! let context = VariableContext::from_json_str(r#"{"patient": {"weight": 20}}"#).unwrap();
//!
//! let mut engine = FormulaEngine::new();
//! let results = engine.calculate_batch(
//!     [
//!         ("daily", "patient.weight * 50"),
//!         ("perDose", "round(daily / 3)"),
//!     ],
//!     &context,
//! );
//!
//! assert_eq!(results["daily"].value, Some(1000.0));
//! assert_eq!(results["perDose"].value, Some(333.0));
//! ```

pub mod cache;
pub mod engine;
pub mod prelude;
pub mod shared;

// Re-export engine types
pub use cache::{Fingerprint, ResultCache};
pub use engine::{CalculateOptions, CalculationResult, EngineOptions, FormulaEngine};
pub use shared::SharedFormulaEngine;

// Re-export core types
pub use dosekit_core::{
    extract_variables, merge_contexts, parse_path, resolve, root_identifier, validate_variables,
    Error, PathSegment, Result, ValidationReport, VariableContext, VariableValue,
};

// Re-export formula types
pub use dosekit_formula::{
    convert_unit, evaluate, evaluate_expression, evaluate_tolerant, evaluate_with_defaults,
    parse_formula, unit_category, EvaluationContext, FormulaError, FormulaExpr, FormulaResult,
    MissingVariablePolicy, UnitCategory,
};
