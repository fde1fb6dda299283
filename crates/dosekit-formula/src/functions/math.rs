//! Math functions
//!
//! Semantics follow the browser's `Math` object: NaN propagates, and
//! out-of-domain inputs (`sqrt(-1)`, `log(0)`) produce NaN/-Infinity rather
//! than errors.

use super::number_arg;
use crate::error::FormulaResult;
use crate::evaluator::FormulaValue;

fn numbers(args: &[FormulaValue], function: &str) -> FormulaResult<Vec<f64>> {
    (0..args.len())
        .map(|i| number_arg(args, i, function))
        .collect()
}

/// MIN(a, b, ...) - Smallest argument; NaN if any argument is NaN
pub fn fn_min(args: &[FormulaValue]) -> FormulaResult<f64> {
    let values = numbers(args, "min")?;
    if values.iter().any(|n| n.is_nan()) {
        return Ok(f64::NAN);
    }
    Ok(values.into_iter().fold(f64::INFINITY, f64::min))
}

/// MAX(a, b, ...) - Largest argument; NaN if any argument is NaN
pub fn fn_max(args: &[FormulaValue]) -> FormulaResult<f64> {
    let values = numbers(args, "max")?;
    if values.iter().any(|n| n.is_nan()) {
        return Ok(f64::NAN);
    }
    Ok(values.into_iter().fold(f64::NEG_INFINITY, f64::max))
}

/// ROUND(number, [digits]) - Rounds to the given number of decimal places
///
/// Ties round toward positive infinity: round(2.5) = 3, round(-2.5) = -2.
/// Negative digits round to the left of the decimal point.
pub fn fn_round(args: &[FormulaValue]) -> FormulaResult<f64> {
    let number = number_arg(args, 0, "round")?;
    let digits = match args.get(1) {
        Some(_) => number_arg(args, 1, "round")?.trunc() as i32,
        None => 0,
    };

    if digits == 0 {
        return Ok(round_half_up(number));
    }

    let multiplier = 10_f64.powi(digits);
    Ok(round_half_up(number * multiplier) / multiplier)
}

/// Compares the fractional part instead of adding 0.5, which can itself
/// round up (0.49999999999999994 + 0.5 == 1.0)
fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// FLOOR(number) - Largest integer less than or equal to number
pub fn fn_floor(args: &[FormulaValue]) -> FormulaResult<f64> {
    Ok(number_arg(args, 0, "floor")?.floor())
}

/// CEIL(number) - Smallest integer greater than or equal to number
pub fn fn_ceil(args: &[FormulaValue]) -> FormulaResult<f64> {
    Ok(number_arg(args, 0, "ceil")?.ceil())
}

/// ABS(number) - Absolute value
pub fn fn_abs(args: &[FormulaValue]) -> FormulaResult<f64> {
    Ok(number_arg(args, 0, "abs")?.abs())
}

/// SQRT(number) - Square root; NaN for negative numbers
pub fn fn_sqrt(args: &[FormulaValue]) -> FormulaResult<f64> {
    Ok(number_arg(args, 0, "sqrt")?.sqrt())
}

/// POW(base, exponent)
pub fn fn_pow(args: &[FormulaValue]) -> FormulaResult<f64> {
    let base = number_arg(args, 0, "pow")?;
    let exponent = number_arg(args, 1, "pow")?;
    Ok(base.powf(exponent))
}

/// EXP(number) - e raised to number
pub fn fn_exp(args: &[FormulaValue]) -> FormulaResult<f64> {
    Ok(number_arg(args, 0, "exp")?.exp())
}

/// LOG(number, [base]) - Natural logarithm, or logarithm in `base`
pub fn fn_log(args: &[FormulaValue]) -> FormulaResult<f64> {
    let number = number_arg(args, 0, "log")?;
    match args.get(1) {
        Some(_) => Ok(number.log(number_arg(args, 1, "log")?)),
        None => Ok(number.ln()),
    }
}

/// SIN(radians)
pub fn fn_sin(args: &[FormulaValue]) -> FormulaResult<f64> {
    Ok(number_arg(args, 0, "sin")?.sin())
}

/// COS(radians)
pub fn fn_cos(args: &[FormulaValue]) -> FormulaResult<f64> {
    Ok(number_arg(args, 0, "cos")?.cos())
}

/// TAN(radians)
pub fn fn_tan(args: &[FormulaValue]) -> FormulaResult<f64> {
    Ok(number_arg(args, 0, "tan")?.tan())
}

/// ASIN(number) - Result in radians
pub fn fn_asin(args: &[FormulaValue]) -> FormulaResult<f64> {
    Ok(number_arg(args, 0, "asin")?.asin())
}

/// ACOS(number) - Result in radians
pub fn fn_acos(args: &[FormulaValue]) -> FormulaResult<f64> {
    Ok(number_arg(args, 0, "acos")?.acos())
}

/// ATAN(number) - Result in radians
pub fn fn_atan(args: &[FormulaValue]) -> FormulaResult<f64> {
    Ok(number_arg(args, 0, "atan")?.atan())
}
