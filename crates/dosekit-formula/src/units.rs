//! Unit conversion
//!
//! A fixed table of clinical units. Each unit belongs to one [`UnitCategory`]
//! and carries a factor to the category's base unit; conversion goes
//! `value * from.factor / to.factor`.

use crate::error::{FormulaError, FormulaResult};
use std::fmt;

/// Physical quantity a unit measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitCategory {
    /// Mass; base unit `g`
    Weight,
    /// Volume; base unit `mL`
    Volume,
    /// Mass per volume; base unit `g/L`
    MassConcentration,
    /// Amount per volume; base unit `mmol/L`
    MolarConcentration,
    /// Length; base unit `cm`
    Length,
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitCategory::Weight => "weight",
            UnitCategory::Volume => "volume",
            UnitCategory::MassConcentration => "mass concentration",
            UnitCategory::MolarConcentration => "molar concentration",
            UnitCategory::Length => "length",
        };
        f.write_str(name)
    }
}

struct UnitDef {
    symbol: &'static str,
    category: UnitCategory,
    factor: f64,
}

const fn unit(symbol: &'static str, category: UnitCategory, factor: f64) -> UnitDef {
    UnitDef {
        symbol,
        category,
        factor,
    }
}

// mEq/L equals mmol/L for monovalent ions
static UNITS: &[UnitDef] = &[
    unit("g", UnitCategory::Weight, 1.0),
    unit("kg", UnitCategory::Weight, 1000.0),
    unit("mg", UnitCategory::Weight, 0.001),
    unit("lb", UnitCategory::Weight, 453.592_37),
    unit("mL", UnitCategory::Volume, 1.0),
    unit("dL", UnitCategory::Volume, 100.0),
    unit("L", UnitCategory::Volume, 1000.0),
    unit("g/L", UnitCategory::MassConcentration, 1.0),
    unit("mg/dL", UnitCategory::MassConcentration, 0.01),
    unit("mmol/L", UnitCategory::MolarConcentration, 1.0),
    unit("mEq/L", UnitCategory::MolarConcentration, 1.0),
    unit("cm", UnitCategory::Length, 1.0),
    unit("mm", UnitCategory::Length, 0.1),
    unit("m", UnitCategory::Length, 100.0),
    unit("in", UnitCategory::Length, 2.54),
];

/// Exact symbol first, then a case-insensitive match (`ml`, `KG`)
///
/// Only single-case spellings fall back, and only onto exactly one unit.
/// Mixed case is meaningful: `mM` is millimolar, not `mm`.
fn lookup(symbol: &str) -> Option<&'static UnitDef> {
    let symbol = symbol.trim();
    if let Some(unit) = UNITS.iter().find(|u| u.symbol == symbol) {
        return Some(unit);
    }

    let has_lower = symbol.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = symbol.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return None;
    }

    let mut candidates = UNITS
        .iter()
        .filter(|u| u.symbol.eq_ignore_ascii_case(symbol));
    match (candidates.next(), candidates.next()) {
        (Some(unit), None) => Some(unit),
        _ => None,
    }
}

/// Category of a unit symbol, if the unit is known
pub fn unit_category(symbol: &str) -> Option<UnitCategory> {
    lookup(symbol).map(|u| u.category)
}

/// Convert `value` from one unit to another
///
/// Identical symbols are the identity. Units in different categories fail
/// with [`FormulaError::IncompatibleUnits`]. An unknown symbol on either
/// side leaves `value` unchanged.
///
/// # Example
///
/// ```rust
/// use dosekit_formula::convert_unit;
///
/// assert_eq!(convert_unit(1.0, "kg", "g").unwrap(), 1000.0);
/// assert!(convert_unit(100.0, "kg", "cm").is_err());
/// assert_eq!(convert_unit(100.0, "unknown", "kg").unwrap(), 100.0);
/// ```
pub fn convert_unit(value: f64, from: &str, to: &str) -> FormulaResult<f64> {
    if from == to {
        return Ok(value);
    }

    let (Some(source), Some(target)) = (lookup(from), lookup(to)) else {
        return Ok(value);
    };

    if source.category != target.category {
        return Err(FormulaError::IncompatibleUnits {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    Ok(value * source.factor / target.factor)
}
