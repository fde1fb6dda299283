//! Dosekit CLI - clinical formula evaluation tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dosekit::prelude::*;
use dosekit::evaluate_with_defaults;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dosekit")]
#[command(author, version, about = "Clinical dosing formula evaluation tool")]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one expression and print the result as JSON
    Eval {
        /// Expression, e.g. "patient.weight * 15"
        expression: String,

        /// JSON file with the variable context
        #[arg(short, long)]
        context: Option<PathBuf>,

        /// JSON file with fallback values for missing variables
        #[arg(short, long)]
        defaults: Option<PathBuf>,

        /// Treat missing variables and errors as 0 instead of failing
        #[arg(short, long)]
        tolerant: bool,
    },

    /// Evaluate a JSON object of named formulas in dependency order
    Batch {
        /// JSON file mapping formula names to expressions
        formulas: PathBuf,

        /// JSON file with the variable context
        #[arg(short, long)]
        context: Option<PathBuf>,
    },

    /// List the variables an expression reads
    #[command(alias = "variables")]
    Vars {
        /// Expression to inspect
        expression: String,

        /// JSON file to check the variables against
        #[arg(short, long)]
        context: Option<PathBuf>,
    },

    /// Convert a value between units
    Convert {
        /// Value to convert
        #[arg(allow_negative_numbers = true)]
        value: f64,

        /// Source unit (kg, g, lb, mL, mg/dL, ...)
        from: String,

        /// Target unit
        to: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Eval {
            expression,
            context,
            defaults,
            tolerant,
        } => eval(&expression, context.as_deref(), defaults.as_deref(), tolerant),
        Commands::Batch { formulas, context } => batch(&formulas, context.as_deref()),
        Commands::Vars {
            expression,
            context,
        } => vars(&expression, context.as_deref()),
        Commands::Convert { value, from, to } => convert(value, &from, &to),
    }
}

/// Read a JSON context file; a missing path means an empty context
fn load_context(path: Option<&Path>) -> Result<VariableContext> {
    let Some(path) = path else {
        return Ok(VariableContext::new());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    VariableContext::from_json_str(&text)
        .with_context(|| format!("Invalid context in '{}'", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    writeln!(io::stdout(), "{}", text).context("Failed to write to stdout")
}

/// JSON for one result; `Infinity`, `-Infinity` and `NaN` values are
/// written as strings so they cannot be mistaken for a failure
fn result_json(result: &CalculationResult) -> Result<serde_json::Value> {
    let mut json = serde_json::to_value(result).context("Failed to serialize result")?;
    if let Some(value) = result.value.filter(|v| !v.is_finite()) {
        let text = if value.is_nan() {
            "NaN"
        } else if value > 0.0 {
            "Infinity"
        } else {
            "-Infinity"
        };
        json["value"] = serde_json::Value::from(text);
    }
    Ok(json)
}

fn eval(
    expression: &str,
    context: Option<&Path>,
    defaults: Option<&Path>,
    tolerant: bool,
) -> Result<()> {
    let context = load_context(context)?;
    let defaults = load_context(defaults)?;

    let result = if tolerant {
        let value = evaluate_with_defaults(
            expression,
            &context,
            Some(&defaults),
            MissingVariablePolicy::SubstituteZero,
        )
        .unwrap_or(0.0);
        CalculationResult::success(value)
    } else {
        let mut engine = FormulaEngine::with_options(EngineOptions {
            defaults,
            ..EngineOptions::default()
        });
        engine.calculate(expression, &context, &CalculateOptions::default())
    };

    print_json(&result_json(&result)?)
}

fn batch(formulas: &Path, context: Option<&Path>) -> Result<()> {
    let text = std::fs::read_to_string(formulas)
        .with_context(|| format!("Failed to read '{}'", formulas.display()))?;
    let formulas: BTreeMap<String, String> = serde_json::from_str(&text).with_context(|| {
        format!(
            "'{}' must be a JSON object of name/expression strings",
            formulas.display()
        )
    })?;
    let context = load_context(context)?;

    let mut engine = FormulaEngine::new();
    let results = engine.calculate_batch(formulas, &context);

    let failures = results.values().filter(|r| !r.is_ok()).count();
    if failures > 0 {
        log::info!("{} of {} formulas failed", failures, results.len());
    }

    let results = results
        .iter()
        .map(|(name, result)| Ok((name.as_str(), result_json(result)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    print_json(&results)
}

fn vars(expression: &str, context: Option<&Path>) -> Result<()> {
    let variables = extract_variables(expression);
    let mut stdout = io::stdout().lock();

    match context {
        Some(path) => {
            let context = load_context(Some(path))?;
            let report = validate_variables(&variables, &context, None);
            for variable in &variables {
                let status = if report.missing.contains(variable) {
                    "missing"
                } else {
                    "ok"
                };
                writeln!(stdout, "{}\t{}", variable, status)?;
            }
        }
        None => {
            for variable in &variables {
                writeln!(stdout, "{}", variable)?;
            }
        }
    }

    Ok(())
}

fn convert(value: f64, from: &str, to: &str) -> Result<()> {
    let converted = convert_unit(value, from, to)
        .with_context(|| format!("Cannot convert {} {} to {}", value, from, to))?;
    writeln!(io::stdout(), "{}", converted).context("Failed to write to stdout")
}
