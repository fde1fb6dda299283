//! Tests for variable resolution, expression evaluation and batch calculation

use dosekit::prelude::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;

fn ctx(json: &str) -> VariableContext {
    VariableContext::from_json_str(json).unwrap()
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Test nested and indexed resolution
#[test]
fn test_resolve_paths() {
    let context = ctx(r#"{"patient": {"weight": 70}, "values": [10, 20, 30]}"#);

    assert_eq!(
        resolve("patient.weight", &context, None),
        Some(&VariableValue::Number(70.0))
    );
    assert_eq!(
        resolve("values[1]", &context, None),
        Some(&VariableValue::Number(20.0))
    );
    assert_eq!(resolve("values[5]", &context, None), None);
    assert_eq!(resolve("values[-1]", &context, None), None);
    assert_eq!(resolve("patient.height", &context, None), None);
}

/// Test fallback to a defaults context
#[test]
fn test_resolve_with_defaults() {
    let context = ctx(r#"{"patient": {"weight": 70}}"#);
    let defaults = ctx(r#"{"patient": {"height": 170}}"#);

    assert_eq!(
        resolve("patient.height", &context, Some(&defaults)),
        Some(&VariableValue::Number(170.0))
    );
    assert_eq!(
        resolve("patient.weight", &context, Some(&defaults)),
        Some(&VariableValue::Number(70.0))
    );
}

/// Test variable extraction
#[test]
fn test_extract_variables() {
    assert_eq!(
        extract_variables("weight * height + age"),
        set(&["age", "height", "weight"])
    );
    assert_eq!(
        extract_variables("min(weight, maxWeight) + round(height)"),
        set(&["height", "maxWeight", "weight"])
    );
    assert_eq!(
        extract_variables("patient.weight * doses[0]"),
        set(&["doses[0]", "patient.weight"])
    );
}

/// Test validation reporting
#[test]
fn test_validate_variables() {
    let context = ctx(r#"{"weight": 70}"#);
    let vars = extract_variables("weight * height");
    let report = validate_variables(&vars, &context, None);

    assert!(!report.is_valid);
    assert_eq!(report.missing, vec!["height".to_string()]);

    let report = validate_variables(["weight"], &context, None);
    assert!(report.is_valid);
    assert!(report.missing.is_empty());
}

/// Test deep merging of contexts
#[test]
fn test_merge_contexts() {
    let base = ctx(r#"{"values": [1, 2, 3], "patient": {"weight": 70, "age": 40}}"#);
    let overlay = ctx(r#"{"values": [4, 5], "patient": {"weight": 72}}"#);

    let merged = merge_contexts([&base, &overlay]);
    assert_eq!(merged, ctx(r#"{"values": [4, 5], "patient": {"weight": 72, "age": 40}}"#));
}

/// Test tolerant and strict evaluation
#[test]
fn test_evaluation_modes() {
    let context = ctx(r#"{"weight": 70}"#);

    assert_eq!(
        evaluate_expression("weight * 2", &context, MissingVariablePolicy::SubstituteZero).unwrap(),
        140.0
    );
    assert_eq!(
        evaluate_expression(
            "missing * 10",
            &VariableContext::new(),
            MissingVariablePolicy::SubstituteZero
        )
        .unwrap(),
        0.0
    );

    let err = evaluate_expression("unknownVar * 2", &context, MissingVariablePolicy::Error)
        .unwrap_err();
    assert!(err.to_string().contains("unknownVar"));
}

/// Test that pathologically nested input is reported, not fatal
#[test]
fn test_deeply_nested_formula() {
    let formula = format!("{}weight{}", "(".repeat(1000), ")".repeat(1000));
    let context = ctx(r#"{"weight": 70}"#);

    let mut engine = FormulaEngine::new();
    let result = engine.calculate(&formula, &context, &CalculateOptions::default());
    assert!(result.error.unwrap().contains("nested too deeply"));

    assert_eq!(
        evaluate_expression(&formula, &context, MissingVariablePolicy::SubstituteZero).unwrap(),
        0.0
    );
}

/// Test unit conversion
#[test]
fn test_convert_unit() {
    assert_eq!(convert_unit(1.0, "kg", "g").unwrap(), 1000.0);

    let err = convert_unit(100.0, "kg", "cm").unwrap_err();
    assert!(err.to_string().contains("Incompatible"));

    assert_eq!(convert_unit(100.0, "unknown", "kg").unwrap(), 100.0);
}

/// Test strict calculation through the engine
#[test]
fn test_calculate() {
    let mut engine = FormulaEngine::new();
    let options = CalculateOptions::default();

    let result = engine.calculate("weight * 2", &ctx(r#"{"weight": 70}"#), &options);
    assert_eq!(result, CalculationResult::success(140.0));

    let result = engine.calculate("unknownVar * 2", &VariableContext::new(), &options);
    assert_eq!(result.value, None);
    assert!(result.error.unwrap().contains("unknownVar"));

    let result = engine.calculate("1 +* 2", &VariableContext::new(), &options);
    assert!(!result.is_ok());

    let result = engine.calculate("convert(100, \"kg\", \"cm\")", &VariableContext::new(), &options);
    assert!(result.error.unwrap().contains("Incompatible"));
}

/// Test engine defaults
#[test]
fn test_engine_defaults() {
    let mut engine = FormulaEngine::with_options(EngineOptions {
        defaults: ctx(r#"{"patient": {"height": 170}}"#),
        ..EngineOptions::default()
    });

    let result = engine.calculate(
        "patient.weight + patient.height",
        &ctx(r#"{"patient": {"weight": 70}}"#),
        &CalculateOptions::default(),
    );
    assert_eq!(result.value, Some(240.0));
}

/// Test result caching
#[test]
fn test_cache_hits_and_misses() {
    let mut engine = FormulaEngine::new();
    let options = CalculateOptions::default();
    let context = ctx(r#"{"weight": 70, "age": 40}"#);

    let first = engine.calculate("weight * 2", &context, &options);
    assert!(!first.cached);

    let second = engine.calculate("weight * 2", &context, &options);
    assert!(second.cached);
    assert_eq!(second.value, first.value);
    assert_eq!(engine.cache_size(), 1);

    let changed = ctx(r#"{"weight": 71, "age": 40}"#);
    let third = engine.calculate("weight * 2", &changed, &options);
    assert!(!third.cached);
    assert_eq!(third.value, Some(142.0));
    assert_eq!(engine.cache_size(), 2);

    engine.clear_cache();
    assert_eq!(engine.cache_size(), 0);
    assert!(!engine.calculate("weight * 2", &context, &options).cached);
}

/// Test that errors are cached like values
#[test]
fn test_errors_are_cached() {
    let mut engine = FormulaEngine::new();
    let options = CalculateOptions::default();

    let first = engine.calculate("nope * 2", &VariableContext::new(), &options);
    let second = engine.calculate("nope * 2", &VariableContext::new(), &options);

    assert!(second.cached);
    assert_eq!(second.error, first.error);
}

/// Test per-call cache bypass
#[test]
fn test_uncached_calculation() {
    let mut engine = FormulaEngine::new();
    let context = ctx(r#"{"weight": 70}"#);

    engine.calculate("weight * 2", &context, &CalculateOptions::uncached());
    assert_eq!(engine.cache_size(), 0);

    engine.calculate("weight * 2", &context, &CalculateOptions::default());
    let bypass = engine.calculate("weight * 2", &context, &CalculateOptions::uncached());
    assert!(!bypass.cached);
    assert_eq!(bypass.value, Some(140.0));
}

/// Test that non-finite context values never share a cache entry
#[test]
fn test_cache_distinguishes_non_finite_values() {
    let mut engine = FormulaEngine::new();
    let options = CalculateOptions::default();
    let with_x = |x: VariableValue| VariableContext::new().with("x", x);

    let pos = engine.calculate("x + 1", &with_x(f64::INFINITY.into()), &options);
    assert_eq!(pos.value, Some(f64::INFINITY));
    assert!(!pos.cached);

    let neg = engine.calculate("x + 1", &with_x(f64::NEG_INFINITY.into()), &options);
    assert_eq!(neg.value, Some(f64::NEG_INFINITY));
    assert!(!neg.cached);

    let nan = engine.calculate("x + 1", &with_x(f64::NAN.into()), &options);
    assert!(nan.value.unwrap().is_nan());
    assert!(!nan.cached);

    let null = engine.calculate("x + 1", &with_x(VariableValue::Null), &options);
    assert_eq!(null.value, Some(1.0));
    assert!(!null.cached);

    assert_eq!(engine.cache_size(), 4);
    assert!(engine.calculate("x + 1", &with_x(f64::NEG_INFINITY.into()), &options).cached);
}

/// Test that an infinite sibling result feeds the next batch's cache key
#[test]
fn test_batch_infinite_sibling_is_not_reused() {
    let mut engine = FormulaEngine::new();

    let first = engine.calculate_batch([("a", "1/0"), ("b", "a * 2")], &VariableContext::new());
    assert_eq!(first["b"].value, Some(f64::INFINITY));

    let second = engine.calculate_batch([("a", "-1/0"), ("b", "a * 2")], &VariableContext::new());
    assert_eq!(second["a"].value, Some(f64::NEG_INFINITY));
    assert_eq!(second["b"].value, Some(f64::NEG_INFINITY));
    assert!(!second["b"].cached);
}

/// Test batch evaluation in dependency order
#[test]
fn test_batch_dependency_order() {
    let mut engine = FormulaEngine::new();
    let results = engine.calculate_batch(
        [
            ("sum", "double + triple"),
            ("double", "base * 2"),
            ("triple", "base * 3"),
            ("base", "100"),
        ],
        &VariableContext::new(),
    );

    assert_eq!(results["base"].value, Some(100.0));
    assert_eq!(results["double"].value, Some(200.0));
    assert_eq!(results["triple"].value, Some(300.0));
    assert_eq!(results["sum"].value, Some(500.0));
}

/// Test batch formulas mixing context variables and siblings
#[test]
fn test_batch_with_context() {
    let mut engine = FormulaEngine::new();
    let context = ctx(r#"{"patient": {"weight": 20}, "maxDose": 900}"#);

    let results = engine.calculate_batch(
        [
            ("daily", "patient.weight * 50"),
            ("capped", "min(daily, maxDose)"),
            ("perDose", "round(capped / 3)"),
        ],
        &context,
    );

    assert_eq!(results["daily"].value, Some(1000.0));
    assert_eq!(results["capped"].value, Some(900.0));
    assert_eq!(results["perDose"].value, Some(300.0));
}

/// Test circular dependency detection
#[test]
fn test_batch_circular() {
    let mut engine = FormulaEngine::new();
    let results = engine.calculate_batch(
        [("a", "b + 1"), ("b", "a + 1"), ("c", "a * 2"), ("d", "5")],
        &VariableContext::new(),
    );

    for name in ["a", "b", "c"] {
        let error = results[name].error.as_deref().unwrap();
        assert!(error.contains("Circular"), "{}: {}", name, error);
    }
    assert_eq!(results["d"].value, Some(5.0));
}

/// Test that formulas downstream of a cycle are told which precedent failed
#[test]
fn test_batch_cycle_members_and_dependents() {
    let mut engine = FormulaEngine::new();
    let results = engine.calculate_batch(
        [("a", "b + 1"), ("b", "a + 1"), ("c", "a * 2"), ("e", "c + 1")],
        &VariableContext::new(),
    );

    let cycle = "Circular dependency detected: a, b";
    assert_eq!(results["a"].error.as_deref(), Some(cycle));
    assert_eq!(results["b"].error.as_deref(), Some(cycle));
    assert_eq!(
        results["c"].error.as_deref(),
        Some("Dependency 'a' failed: Circular dependency detected: a, b")
    );
    assert_eq!(
        results["e"].error.as_deref(),
        Some("Dependency 'c' failed: Circular dependency detected: a, b")
    );
}

/// Test self-referencing formula
#[test]
fn test_batch_self_reference() {
    let mut engine = FormulaEngine::new();
    let results = engine.calculate_batch([("x", "x + 1")], &ctx(r#"{"x": 1}"#));

    assert!(results["x"].error.as_deref().unwrap().contains("Circular"));
}

/// Test that a failing formula does not affect independent siblings
#[test]
fn test_batch_failure_isolation() {
    let mut engine = FormulaEngine::new();
    let results = engine.calculate_batch(
        [
            ("broken", "missing * 2"),
            ("dependent", "broken + 1"),
            ("fine", "2 + 2"),
        ],
        &VariableContext::new(),
    );

    assert!(results["broken"].error.as_deref().unwrap().contains("missing"));
    assert!(results["dependent"].error.as_deref().unwrap().contains("broken"));
    assert_eq!(results["fine"].value, Some(4.0));
    assert_eq!(results.len(), 3);
}

/// Test that batch evaluation shares the engine's cache
#[test]
fn test_batch_uses_cache() {
    let mut engine = FormulaEngine::new();
    let formulas = [("base", "100"), ("double", "base * 2")];

    let first = engine.calculate_batch(formulas, &VariableContext::new());
    assert!(!first["double"].cached);

    let second = engine.calculate_batch(formulas, &VariableContext::new());
    assert!(second["base"].cached);
    assert!(second["double"].cached);
    assert_eq!(second["double"].value, Some(200.0));
}

/// Test the shared engine from async code
#[tokio::test]
async fn test_shared_engine() {
    let engine = SharedFormulaEngine::from(FormulaEngine::new());
    let context = ctx(r#"{"weight": 70}"#);

    let first = engine
        .calculate("weight * 2", &context, &CalculateOptions::default())
        .await;
    assert_eq!(first.value, Some(140.0));

    let clone = engine.clone();
    let second = clone
        .calculate("weight * 2", &context, &CalculateOptions::default())
        .await;
    assert!(second.cached);
    assert_eq!(engine.cache_size(), 1);

    let results = engine
        .calculate_batch([("a", "weight + 1"), ("b", "a * 2")], &context)
        .await;
    assert_eq!(results["b"].value, Some(142.0));

    engine.clear_cache();
    assert_eq!(clone.cache_size(), 0);
}

/// Test the shared engine across tasks
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shared_engine_across_tasks() {
    let engine = SharedFormulaEngine::default();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let context = VariableContext::new().with("dose", i);
                engine
                    .calculate("dose * 10", &context, &CalculateOptions::default())
                    .await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap();
        assert_eq!(result.value, Some(i as f64 * 10.0));
    }
    assert_eq!(engine.cache_size(), 4);
}
