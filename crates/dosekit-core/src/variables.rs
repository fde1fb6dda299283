//! Variable reference extraction
//!
//! Finds the context paths a formula reads, without parsing it. Calls to the
//! built-in function library, numeric literals, string literals and reserved
//! words are not variables.

use lazy_regex::regex;
use std::collections::BTreeSet;

/// Function names callable from formulas
pub const KNOWN_FUNCTIONS: &[&str] = &[
    "min", "max", "round", "floor", "ceil", "abs", "sqrt", "pow", "exp", "log", "sin", "cos",
    "tan", "asin", "acos", "atan", "convert",
];

/// Identifiers that are never variables
pub const RESERVED_WORDS: &[&str] = &[
    "true",
    "false",
    "null",
    "undefined",
    "PI",
    "E",
    "Infinity",
    "NaN",
];

/// Check whether `name` is a built-in function (case-insensitive)
pub fn is_known_function(name: &str) -> bool {
    KNOWN_FUNCTIONS
        .iter()
        .any(|f| f.eq_ignore_ascii_case(name))
}

/// Extract the variable paths referenced by a formula
///
/// # Examples
/// ```
/// use dosekit_core::extract_variables;
///
/// let vars = extract_variables("min(weight, maxWeight) + round(height)");
/// assert!(vars.contains("weight"));
/// assert!(vars.contains("maxWeight"));
/// assert!(vars.contains("height"));
/// assert!(!vars.contains("min"));
/// ```
pub fn extract_variables(formula: &str) -> BTreeSet<String> {
    // Alternatives are tried left to right at each position, so literals are
    // consumed whole before the identifier branch can match inside them.
    let tokens = regex!(
        r#""[^"]*"|'[^']*'|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?|(?P<ident>[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*|\[\d+\])*)(?P<call>\s*\()?"#
    );

    let mut variables = BTreeSet::new();
    for caps in tokens.captures_iter(formula) {
        let Some(ident) = caps.name("ident") else {
            continue;
        };
        let ident = ident.as_str();

        if caps.name("call").is_some() && is_known_function(ident) {
            continue;
        }
        if RESERVED_WORDS.contains(&ident) {
            continue;
        }

        variables.insert(ident.to_string());
    }

    variables
}
