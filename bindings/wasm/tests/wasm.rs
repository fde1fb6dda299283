//! WASM binding tests
//!
//! Run with: wasm-pack test --node

#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

use dosekit_wasm::*;

fn object(json: &[(&str, JsValue)]) -> JsValue {
    let obj = js_sys::Object::new();
    for (key, value) in json {
        js_sys::Reflect::set(&obj, &JsValue::from_str(key), value).unwrap();
    }
    obj.into()
}

fn get(value: &JsValue, key: &str) -> JsValue {
    js_sys::Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

// =============================================================================
// Engine Tests
// =============================================================================

#[wasm_bindgen_test]
fn test_calculate_and_cache() {
    let mut engine = FormulaEngine::new(JsValue::UNDEFINED).unwrap();
    let context = object(&[("weight", JsValue::from_f64(70.0))]);

    let first = engine
        .calculate("weight * 2", context.clone(), JsValue::UNDEFINED)
        .unwrap();
    assert_eq!(get(&first, "value").as_f64(), Some(140.0));
    assert_eq!(get(&first, "cached").as_bool(), Some(false));

    let second = engine
        .calculate("weight * 2", context, JsValue::UNDEFINED)
        .unwrap();
    assert_eq!(get(&second, "cached").as_bool(), Some(true));
    assert_eq!(engine.cache_size(), 1);

    engine.clear_cache();
    assert_eq!(engine.cache_size(), 0);
}

#[wasm_bindgen_test]
fn test_calculate_error() {
    let mut engine = FormulaEngine::new(JsValue::NULL).unwrap();
    let result = engine
        .calculate("unknownVar * 2", JsValue::NULL, JsValue::UNDEFINED)
        .unwrap();

    assert!(get(&result, "value").is_undefined());
    assert!(get(&result, "error").as_string().unwrap().contains("unknownVar"));
}

#[wasm_bindgen_test]
fn test_calculate_batch() {
    let mut engine = FormulaEngine::new(JsValue::UNDEFINED).unwrap();
    let formulas = object(&[
        ("base", JsValue::from_str("100")),
        ("double", JsValue::from_str("base * 2")),
        ("a", JsValue::from_str("b + 1")),
        ("b", JsValue::from_str("a + 1")),
    ]);

    let results = engine.calculate_batch(formulas, JsValue::UNDEFINED).unwrap();
    assert_eq!(get(&get(&results, "double"), "value").as_f64(), Some(200.0));
    assert!(get(&get(&results, "a"), "error")
        .as_string()
        .unwrap()
        .contains("Circular"));
}

// =============================================================================
// Free Function Tests
// =============================================================================

#[wasm_bindgen_test]
fn test_resolve() {
    let patient = object(&[("weight", JsValue::from_f64(70.0))]);
    let context = object(&[("patient", patient)]);

    assert_eq!(
        resolve("patient.weight", context.clone(), JsValue::UNDEFINED)
            .unwrap()
            .as_f64(),
        Some(70.0)
    );
    assert!(resolve("patient.height", context, JsValue::UNDEFINED)
        .unwrap()
        .is_undefined());
}

#[wasm_bindgen_test]
fn test_extract_and_validate() {
    let vars = extract_variables("min(weight, maxWeight) + round(height)");
    assert_eq!(vars, vec!["height", "maxWeight", "weight"]);

    let context = object(&[("weight", JsValue::from_f64(70.0))]);
    let report = validate_variables(vars, context, JsValue::UNDEFINED).unwrap();
    assert_eq!(get(&report, "isValid").as_bool(), Some(false));
}

#[wasm_bindgen_test]
fn test_merge_contexts() {
    let contexts = js_sys::Array::new();
    contexts.push(&object(&[("a", JsValue::from_f64(1.0))]));
    contexts.push(&object(&[("a", JsValue::from_f64(2.0))]));

    let merged = merge_contexts(contexts).unwrap();
    assert_eq!(get(&merged, "a").as_f64(), Some(2.0));
}

#[wasm_bindgen_test]
fn test_convert_and_evaluate() {
    assert_eq!(convert_unit(1.0, "kg", "g").unwrap(), 1000.0);
    assert_eq!(convert_unit(100.0, "unknown", "kg").unwrap(), 100.0);
    assert!(convert_unit(100.0, "kg", "cm").is_err());

    assert_eq!(evaluate("missing * 10", JsValue::UNDEFINED).unwrap(), 0.0);
}
