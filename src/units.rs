//! Unit normalization into the three canonical domains: grams, millilitres
//! and discrete counts.

use serde::{Deserialize, Serialize};

const WEIGHT_TO_GRAMS: &[(&str, f64)] = &[
    ("g", 1.0),
    ("gram", 1.0),
    ("grams", 1.0),
    ("gr", 1.0),
    ("kg", 1000.0),
    ("kilogram", 1000.0),
    ("kilograms", 1000.0),
    ("mg", 0.001),
    ("milligram", 0.001),
    ("milligrams", 0.001),
    ("lb", 453.59237),
    ("lbs", 453.59237),
    ("pound", 453.59237),
    ("pounds", 453.59237),
    ("oz", 28.349523125),
    ("ounce", 28.349523125),
    ("ounces", 28.349523125),
];

const VOLUME_TO_ML: &[(&str, f64)] = &[
    ("ml", 1.0),
    ("milliliter", 1.0),
    ("milliliters", 1.0),
    ("millilitre", 1.0),
    ("millilitres", 1.0),
    ("cl", 10.0),
    ("dl", 100.0),
    ("l", 1000.0),
    ("liter", 1000.0),
    ("liters", 1000.0),
    ("litre", 1000.0),
    ("litres", 1000.0),
    ("cup", 236.588),
    ("cups", 236.588),
    ("tbsp", 14.7868),
    ("tablespoon", 14.7868),
    ("tablespoons", 14.7868),
    ("tsp", 4.92892),
    ("teaspoon", 4.92892),
    ("teaspoons", 4.92892),
    ("fl oz", 29.5735),
    ("floz", 29.5735),
    ("fluid ounce", 29.5735),
    ("fluid ounces", 29.5735),
    ("pint", 473.176),
    ("pints", 473.176),
    ("pt", 473.176),
    ("quart", 946.353),
    ("quarts", 946.353),
    ("qt", 946.353),
    ("gallon", 3785.41),
    ("gallons", 3785.41),
    ("gal", 3785.41),
];

const COUNT_SYNONYMS: &[&str] = &[
    "", "each", "ea", "unit", "units", "piece", "pieces", "pc", "pcs", "count", "ct", "item",
    "items", "whole", "x",
];

/// Canonical bucket a quantity is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitDomain {
    Grams,
    Milliliters,
    Count,
}

impl UnitDomain {
    pub fn suffix(&self) -> &'static str {
        match self {
            UnitDomain::Grams => "g",
            UnitDomain::Milliliters => "ml",
            UnitDomain::Count => "count",
        }
    }
}

/// A magnitude in exactly one canonical domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measure {
    pub domain: UnitDomain,
    pub value: f64,
}

impl Measure {
    pub fn new(domain: UnitDomain, value: f64) -> Self {
        Self { domain, value }
    }

    pub fn grams(value: f64) -> Self {
        Self::new(UnitDomain::Grams, value)
    }

    pub fn milliliters(value: f64) -> Self {
        Self::new(UnitDomain::Milliliters, value)
    }

    pub fn count(value: f64) -> Self {
        Self::new(UnitDomain::Count, value)
    }
}

/// Outcome of normalizing a (quantity, unit) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub measure: Measure,
    /// `false` when the unit string matched nothing and fell back to count.
    pub recognized: bool,
}

/// Lowercase, drop periods and collapse whitespace, so "oz.", "tbsp." and
/// "fl. oz" resolve.
pub fn normalize_unit(unit: &str) -> String {
    unit.replace('.', "").split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

pub fn convert(quantity: f64, unit: &str) -> Conversion {
    let key = normalize_unit(unit);

    if COUNT_SYNONYMS.contains(&key.as_str()) {
        return Conversion { measure: Measure::count(quantity), recognized: true };
    }
    if let Some((_, factor)) = WEIGHT_TO_GRAMS.iter().find(|(name, _)| *name == key) {
        return Conversion { measure: Measure::grams(quantity * factor), recognized: true };
    }
    if let Some((_, factor)) = VOLUME_TO_ML.iter().find(|(name, _)| *name == key) {
        return Conversion { measure: Measure::milliliters(quantity * factor), recognized: true };
    }

    Conversion { measure: Measure::count(quantity), recognized: false }
}
