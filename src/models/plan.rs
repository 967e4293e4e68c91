//! Plan output shapes exchanged with collaborators.
//!
//! Every amount-bearing record stores its magnitude in exactly one of the
//! `_g` / `_ml` / `_count` fields. Records built by the core go through the
//! `Measure`-taking constructors, which guarantee that.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::units::{Measure, UnitDomain};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Macros {
    #[serde(default)]
    pub kcal: Option<f64>,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub carb_g: Option<f64>,
    #[serde(default)]
    pub fat_g: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct IngredientRequirement {
    #[serde(default)]
    pub ingredient_id: Option<u64>,
    pub name: String,
    #[serde(default, alias = "qty_g", skip_serializing_if = "Option::is_none")]
    pub quantity_g: Option<f64>,
    #[serde(default, alias = "qty_ml", skip_serializing_if = "Option::is_none")]
    pub quantity_ml: Option<f64>,
    #[serde(default, alias = "qty_count", skip_serializing_if = "Option::is_none")]
    pub quantity_count: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl IngredientRequirement {
    pub fn new(ingredient_id: Option<u64>, name: impl Into<String>, needed: Measure) -> Self {
        let (quantity_g, quantity_ml, quantity_count) = split_measure(needed);
        Self {
            ingredient_id,
            name: name.into(),
            quantity_g,
            quantity_ml,
            quantity_count,
            optional: false,
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// The needed amount: the first populated, positive field in
    /// grams / millilitres / count order.
    pub fn needed(&self) -> Option<Measure> {
        join_measure(self.quantity_g, self.quantity_ml, self.quantity_count)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InventoryDelta {
    pub ingredient_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_ml: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_count: Option<f64>,
}

impl InventoryDelta {
    pub fn new(ingredient_id: u64, used: Measure) -> Self {
        let (use_g, use_ml, use_count) = split_measure(used);
        Self { ingredient_id, use_g, use_ml, use_count }
    }

    pub fn used(&self) -> Option<Measure> {
        join_measure(self.use_g, self.use_ml, self.use_count)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallReason {
    NotInInventory,
    InsufficientStock,
}

impl ShortfallReason {
    pub fn as_str(&self) -> &str {
        match self {
            ShortfallReason::NotInInventory => "not_in_inventory",
            ShortfallReason::InsufficientStock => "insufficient_stock",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShoppingShortfall {
    #[serde(default)]
    pub ingredient_id: Option<u64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_ml: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_count: Option<f64>,
    #[serde(default)]
    pub reason: Option<ShortfallReason>,
}

impl ShoppingShortfall {
    pub fn new(
        ingredient_id: Option<u64>,
        name: impl Into<String>,
        missing: Measure,
        reason: ShortfallReason,
    ) -> Self {
        let (need_g, need_ml, need_count) = split_measure(missing);
        Self {
            ingredient_id,
            name: name.into(),
            need_g,
            need_ml,
            need_count,
            reason: Some(reason),
        }
    }

    pub fn missing(&self) -> Option<Measure> {
        join_measure(self.need_g, self.need_ml, self.need_count)
    }
}

/// A single dinner proposal.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PlanCandidate {
    pub title: String,
    #[serde(default, alias = "estimated_time_min")]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub ingredients_required: Vec<IngredientRequirement>,
    #[serde(default)]
    pub inventory_deltas: Vec<InventoryDelta>,
    #[serde(default)]
    pub shopping_shortfall: Vec<ShoppingShortfall>,
    #[serde(default)]
    pub macros_per_serving: Option<Macros>,
    #[serde(default)]
    pub diagnostics: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Plan {
    pub date: NaiveDate,
    #[serde(default)]
    pub candidates: Vec<PlanCandidate>,
}

fn split_measure(measure: Measure) -> (Option<f64>, Option<f64>, Option<f64>) {
    match measure.domain {
        UnitDomain::Grams => (Some(measure.value), None, None),
        UnitDomain::Milliliters => (None, Some(measure.value), None),
        UnitDomain::Count => (None, None, Some(measure.value)),
    }
}

fn join_measure(grams: Option<f64>, ml: Option<f64>, count: Option<f64>) -> Option<Measure> {
    [
        (UnitDomain::Grams, grams),
        (UnitDomain::Milliliters, ml),
        (UnitDomain::Count, count),
    ]
    .into_iter()
    .find_map(|(domain, value)| match value {
        Some(v) if v.is_finite() && v > 0.0 => Some(Measure::new(domain, v)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_reads_wire_aliases() -> anyhow::Result<()> {
        let requirement: IngredientRequirement =
            serde_json::from_str(r#"{"name": "Vegetable Broth", "qty_ml": 250}"#)?;
        assert_eq!(requirement.needed(), Some(Measure::milliliters(250.0)));
        assert_eq!(requirement.ingredient_id, None);
        assert!(!requirement.optional);
        Ok(())
    }

    #[test]
    fn test_needed_skips_non_positive_fields() {
        let requirement = IngredientRequirement {
            name: "lemon".to_string(),
            quantity_g: Some(0.0),
            quantity_count: Some(2.0),
            ..Default::default()
        };
        assert_eq!(requirement.needed(), Some(Measure::count(2.0)));

        let empty = IngredientRequirement { name: "salt".to_string(), ..Default::default() };
        assert_eq!(empty.needed(), None);
    }

    #[test]
    fn test_constructed_records_populate_one_field() -> anyhow::Result<()> {
        let shortfall = ShoppingShortfall::new(
            None,
            "lemon",
            Measure::count(2.0),
            ShortfallReason::NotInInventory,
        );
        assert_eq!(shortfall.need_g, None);
        assert_eq!(shortfall.need_ml, None);
        assert_eq!(shortfall.need_count, Some(2.0));

        let value = serde_json::to_value(&shortfall)?;
        assert_eq!(value["reason"], "not_in_inventory");
        assert!(value.get("need_g").is_none());

        let delta = InventoryDelta::new(2, Measure::milliliters(250.0));
        assert_eq!(delta.used(), Some(Measure::milliliters(250.0)));
        assert_eq!(delta.use_g, None);
        Ok(())
    }

    #[test]
    fn test_candidate_accepts_legacy_time_field() -> anyhow::Result<()> {
        let candidate: PlanCandidate =
            serde_json::from_str(r#"{"title": "Braised Chicken", "estimated_time_min": 40}"#)?;
        assert_eq!(candidate.estimated_minutes, Some(40));
        assert!(candidate.macros_per_serving.is_none());
        Ok(())
    }
}
