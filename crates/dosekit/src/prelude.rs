//! Prelude module - common imports for dosekit users
//!
//! ```rust
//! use dosekit::prelude::*;
//! ```

pub use crate::{
    // Engine types
    CalculateOptions,
    CalculationResult,
    EngineOptions,
    FormulaEngine,
    SharedFormulaEngine,

    // Context types
    VariableContext,
    VariableValue,

    // Free functions
    convert_unit,
    evaluate_expression,
    extract_variables,
    merge_contexts,
    resolve,
    validate_variables,

    // Error types
    FormulaError,
    MissingVariablePolicy,
};
