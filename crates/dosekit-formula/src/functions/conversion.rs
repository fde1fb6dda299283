//! Unit conversion function

use super::{number_arg, text_arg};
use crate::error::FormulaResult;
use crate::evaluator::FormulaValue;
use crate::units::convert_unit;

/// CONVERT(value, "from", "to") - Converts value between units of the same category
pub fn fn_convert(args: &[FormulaValue]) -> FormulaResult<f64> {
    let value = number_arg(args, 0, "convert")?;
    let from = text_arg(args, 1, "convert")?;
    let to = text_arg(args, 2, "convert")?;
    convert_unit(value, from, to)
}
