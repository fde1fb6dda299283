//! # dosekit-core
//!
//! Core data structures for the dosekit formula engine.
//!
//! This crate provides the fundamental types used throughout dosekit:
//! - [`VariableValue`] - A value found in a patient/clinical context
//! - [`VariableContext`] - A nested name → value mapping
//! - [`PathSegment`] and [`parse_path`] - Dotted/indexed paths into a context
//! - [`resolve`], [`validate_variables`], [`merge_contexts`] - Variable resolution
//! - [`extract_variables`] - Variable references used by a formula
//!
//! ## Example
//!
//! ```rust
//! use dosekit_core::{resolve, VariableContext, VariableValue};
//!
//! let context = VariableContext::from_json_str(r#"{"patient": {"weight": 70}}"#).unwrap();
//!
//! assert_eq!(
//!     resolve("patient.weight", &context, None),
//!     Some(&VariableValue::Number(70.0))
//! );
//! assert_eq!(resolve("patient.height", &context, None), None);
//! ```

pub mod context;
pub mod error;
pub mod path;
pub mod resolver;
pub mod value;
pub mod variables;

// Re-exports for convenience
pub use context::VariableContext;
pub use error::{Error, Result};
pub use path::{parse_path, root_identifier, PathSegment};
pub use resolver::{merge_contexts, resolve, resolve_segments, validate_variables, ValidationReport};
pub use value::VariableValue;
pub use variables::{extract_variables, is_known_function, KNOWN_FUNCTIONS, RESERVED_WORDS};
