//! WebAssembly bindings for dosekit
//!
//! This module provides wasm-bindgen-based WebAssembly bindings for the dosekit
//! formula engine, allowing JavaScript/TypeScript code to evaluate dosing
//! formulas against plain JS objects.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use dosekit::{
    CalculateOptions, EngineOptions, FormulaEngine as CoreFormulaEngine, MissingVariablePolicy,
};
use dosekit_core::VariableContext;

// =============================================================================
// Conversion helpers
// =============================================================================

fn to_js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// Plain objects rather than JS `Map`s for maps
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(to_js_error)
}

/// `null`/`undefined` mean an empty context
fn js_to_context(value: JsValue) -> Result<VariableContext, JsError> {
    if value.is_null() || value.is_undefined() {
        return Ok(VariableContext::new());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsError::new(&format!("Context must be a plain object: {}", e)))
}

fn js_to_optional_context(value: JsValue) -> Result<Option<VariableContext>, JsError> {
    if value.is_null() || value.is_undefined() {
        Ok(None)
    } else {
        js_to_context(value).map(Some)
    }
}

// =============================================================================
// FormulaEngine - JavaScript wrapper for the engine
// =============================================================================

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct EngineConfig {
    cache_enabled: Option<bool>,
    defaults: Option<VariableContext>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct CalculateConfig {
    use_cache: Option<bool>,
}

/// Formula engine with its own result cache.
#[wasm_bindgen]
pub struct FormulaEngine {
    inner: CoreFormulaEngine,
}

#[wasm_bindgen]
impl FormulaEngine {
    /// Create an engine; `options` is `{ cacheEnabled?, defaults? }`
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<FormulaEngine, JsError> {
        let config: EngineConfig = if options.is_null() || options.is_undefined() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(to_js_error)?
        };

        let defaults = EngineOptions::default();
        Ok(Self {
            inner: CoreFormulaEngine::with_options(EngineOptions {
                cache_enabled: config.cache_enabled.unwrap_or(defaults.cache_enabled),
                defaults: config.defaults.unwrap_or(defaults.defaults),
            }),
        })
    }

    /// Evaluate one expression in strict mode; returns `{ value?, error?, cached }`
    pub fn calculate(
        &mut self,
        expression: &str,
        context: JsValue,
        options: JsValue,
    ) -> Result<JsValue, JsError> {
        let context = js_to_context(context)?;
        let config: CalculateConfig = if options.is_null() || options.is_undefined() {
            CalculateConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(to_js_error)?
        };

        let options = CalculateOptions {
            use_cache: config.use_cache.unwrap_or(true),
        };
        to_js(&self.inner.calculate(expression, &context, &options))
    }

    /// Evaluate an object of named formulas; returns an object of results
    #[wasm_bindgen(js_name = calculateBatch)]
    pub fn calculate_batch(&mut self, formulas: JsValue, context: JsValue) -> Result<JsValue, JsError> {
        let formulas: std::collections::BTreeMap<String, String> =
            serde_wasm_bindgen::from_value(formulas)
                .map_err(|e| JsError::new(&format!("Formulas must map names to strings: {}", e)))?;
        let context = js_to_context(context)?;

        to_js(&self.inner.calculate_batch(formulas, &context))
    }

    #[wasm_bindgen(js_name = clearCache)]
    pub fn clear_cache(&mut self) {
        self.inner.clear_cache();
    }

    #[wasm_bindgen(js_name = cacheSize)]
    pub fn cache_size(&self) -> usize {
        self.inner.cache_size()
    }
}

// =============================================================================
// Free functions
// =============================================================================

/// Value at `path`, or `undefined`
#[wasm_bindgen]
pub fn resolve(path: &str, context: JsValue, defaults: JsValue) -> Result<JsValue, JsError> {
    let context = js_to_context(context)?;
    let defaults = js_to_optional_context(defaults)?;

    match dosekit::resolve(path, &context, defaults.as_ref()) {
        Some(value) => to_js(value),
        None => Ok(JsValue::UNDEFINED),
    }
}

/// Variable paths an expression reads, sorted
#[wasm_bindgen(js_name = extractVariables)]
pub fn extract_variables(formula: &str) -> Vec<String> {
    dosekit::extract_variables(formula).into_iter().collect()
}

/// `{ isValid, missing }` for the given paths
#[wasm_bindgen(js_name = validateVariables)]
pub fn validate_variables(
    paths: Vec<String>,
    context: JsValue,
    defaults: JsValue,
) -> Result<JsValue, JsError> {
    let context = js_to_context(context)?;
    let defaults = js_to_optional_context(defaults)?;

    to_js(&dosekit::validate_variables(&paths, &context, defaults.as_ref()))
}

/// Deep-merge an array of contexts, later entries winning
#[wasm_bindgen(js_name = mergeContexts)]
pub fn merge_contexts(contexts: js_sys::Array) -> Result<JsValue, JsError> {
    let contexts = contexts
        .iter()
        .map(js_to_context)
        .collect::<Result<Vec<_>, _>>()?;

    to_js(&dosekit::merge_contexts(&contexts))
}

#[wasm_bindgen(js_name = convertUnit)]
pub fn convert_unit(value: f64, from: &str, to: &str) -> Result<f64, JsError> {
    dosekit::convert_unit(value, from, to).map_err(to_js_error)
}

/// Tolerant evaluation: missing variables and errors give 0
#[wasm_bindgen]
pub fn evaluate(expression: &str, context: JsValue) -> Result<f64, JsError> {
    let context = js_to_context(context)?;
    Ok(
        dosekit::evaluate_expression(expression, &context, MissingVariablePolicy::SubstituteZero)
            .unwrap_or(0.0),
    )
}

#[wasm_bindgen(start)]
pub fn init() {}
