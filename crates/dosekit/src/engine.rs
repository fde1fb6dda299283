//! Formula calculation engine
//!
//! Evaluates single expressions and batches of named formulas that may refer
//! to each other by name, with dependency ordering, circular reference
//! detection and a per-engine result cache.
//!
//! # Example
//!
//! ```rust
//! use dosekit::prelude::*;
//!
//! let mut engine = FormulaEngine::new();
//! let context = VariableContext::new().with("weight", 70);
//!
//! let result = engine.calculate("weight * 2", &context, &CalculateOptions::default());
//! assert_eq!(result.value, Some(140.0));
//! assert!(!result.cached);
//!
//! let again = engine.calculate("weight * 2", &context, &CalculateOptions::default());
//! assert!(again.cached);
//! ```

use crate::cache::{Fingerprint, ResultCache};
use dosekit_core::{extract_variables, root_identifier, VariableContext};
use dosekit_formula::{
    evaluate_with_defaults, DependencyGraph, FormulaError, MissingVariablePolicy,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Options for a formula engine
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Store and reuse results (default: true)
    pub cache_enabled: bool,
    /// Values used for any variable missing from a request's context
    pub defaults: VariableContext,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            defaults: VariableContext::new(),
        }
    }
}

/// Options for a single calculation
#[derive(Debug, Clone, Copy)]
pub struct CalculateOptions {
    /// Read and write the engine's cache for this call (default: true)
    pub use_cache: bool,
}

impl Default for CalculateOptions {
    fn default() -> Self {
        Self { use_cache: true }
    }
}

impl CalculateOptions {
    /// Skip the cache entirely for this call
    pub fn uncached() -> Self {
        Self { use_cache: false }
    }
}

/// Outcome of one calculation
///
/// Exactly one of `value` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// The computed number
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<f64>,
    /// Why no number could be computed
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    /// Whether this result came from the cache
    #[serde(default)]
    pub cached: bool,
}

impl CalculationResult {
    /// A successful, freshly computed result
    pub fn success(value: f64) -> Self {
        Self {
            value: Some(value),
            error: None,
            cached: false,
        }
    }

    /// A failed result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            value: None,
            error: Some(message.into()),
            cached: false,
        }
    }

    /// Whether a value was computed
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl From<Result<f64, FormulaError>> for CalculationResult {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Formula engine
///
/// Owns its result cache; nothing is shared between engines.
#[derive(Debug, Default)]
pub struct FormulaEngine {
    options: EngineOptions,
    cache: ResultCache,
}

impl FormulaEngine {
    /// Create an engine with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom options
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            cache: ResultCache::new(),
        }
    }

    /// Engine options
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Evaluate one expression in strict mode
    ///
    /// Errors (syntax, undefined variables, unit mismatches) are reported in
    /// the result, never returned as `Err`. Identical expression and context
    /// contents hit the cache.
    pub fn calculate(
        &mut self,
        expression: &str,
        context: &VariableContext,
        options: &CalculateOptions,
    ) -> CalculationResult {
        let use_cache = self.options.cache_enabled && options.use_cache;

        let key = use_cache.then(|| Fingerprint::new(expression, context));
        if let Some(hit) = key.as_ref().and_then(|key| self.cache.get(key)) {
            log::debug!("Cache hit for '{}'", expression);
            return hit;
        }

        let defaults = (!self.options.defaults.is_empty()).then_some(&self.options.defaults);
        let result = CalculationResult::from(evaluate_with_defaults(
            expression,
            context,
            defaults,
            MissingVariablePolicy::Error,
        ));

        if let Some(key) = key {
            self.cache.insert(key, result.clone());
        }

        result
    }

    /// Evaluate a set of named formulas that may reference each other by name
    ///
    /// Formulas run in dependency order; each one sees the context plus the
    /// values of every formula it depends on. Formulas that are part of a
    /// cycle, or depend on one, fail with a circular dependency error. A
    /// failing formula never prevents independent formulas from succeeding.
    pub fn calculate_batch<I, K, V>(
        &mut self,
        formulas: I,
        context: &VariableContext,
    ) -> BTreeMap<String, CalculationResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let formulas: BTreeMap<String, String> = formulas
            .into_iter()
            .map(|(name, expression)| (name.into(), expression.into()))
            .collect();

        let graph = build_dependency_graph(&formulas);
        let order = graph.evaluation_order();
        log::trace!("Batch evaluation order: {:?}", order.order);

        let mut results: BTreeMap<String, CalculationResult> = BTreeMap::new();

        if !order.is_complete() {
            let (cycle, downstream): (Vec<&String>, Vec<&String>) = order
                .unresolved
                .iter()
                .partition(|name| graph.is_in_cycle(name));
            log::warn!(
                "Circular dependency among formulas: {}",
                order.unresolved.join(", ")
            );

            let message =
                FormulaError::CircularReference(cycle.iter().map(|name| name.to_string()).collect())
                    .to_string();
            for name in cycle {
                results.insert(name.clone(), CalculationResult::failure(message.clone()));
            }
            // Name the first unresolved precedent
            for name in downstream {
                let blocked_by = graph
                    .get_precedents(name)
                    .find(|precedent| order.unresolved.iter().any(|n| n == precedent));
                let result = match blocked_by {
                    Some(precedent) => CalculationResult::failure(format!(
                        "Dependency '{}' failed: {}",
                        precedent, message
                    )),
                    None => CalculationResult::failure(message.clone()),
                };
                results.insert(name.clone(), result);
            }
        }

        let mut scope = context.clone();
        let options = CalculateOptions::default();

        for name in order.order {
            let expression = match formulas.get(&name) {
                Some(expression) => expression,
                None => continue,
            };

            let failed_dependency = graph.get_precedents(&name).find_map(|dependency| {
                results
                    .get(dependency)
                    .and_then(|result| result.error.as_ref())
                    .map(|error| (dependency, error))
            });

            let result = match failed_dependency {
                Some((dependency, error)) => CalculationResult::failure(format!(
                    "Dependency '{}' failed: {}",
                    dependency, error
                )),
                None => self.calculate(expression, &scope, &options),
            };

            if let Some(value) = result.value {
                scope.insert(name.clone(), value);
            }
            results.insert(name, result);
        }

        results
    }

    /// Drop every cached result
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of cached results
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

/// Edges run from a formula to every sibling whose name is the root of one
/// of its variable references
fn build_dependency_graph(formulas: &BTreeMap<String, String>) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    for (name, expression) in formulas {
        graph.add_node(name.as_str());

        for variable in extract_variables(expression) {
            let root = root_identifier(&variable);
            if formulas.contains_key(root) {
                graph.add_dependency(root, name.as_str());
            }
        }
    }

    graph
}
