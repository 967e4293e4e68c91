//! Planning context handed to the core by its collaborators.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Preferences {
    #[serde(default)]
    pub diet: Option<String>,
    #[serde(default, alias = "max_time_min")]
    pub max_prep_minutes: Option<u32>,
    #[serde(default)]
    pub allergens: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecentMeal {
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub rating: Option<u8>,
}

/// Item currently in the household pantry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InventoryItem {
    pub id: u64,
    pub name: String,
    #[serde(alias = "qty")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub best_before: Option<NaiveDate>,
}

/// Prepared leftovers, tracked apart from inventory and without an id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LeftoverItem {
    pub name: String,
    #[serde(alias = "qty")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub best_before: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Constraints {
    #[serde(default)]
    pub attendees: Option<u32>,
    #[serde(default)]
    pub time_window: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlanningContext {
    pub date: NaiveDate,
    #[serde(default)]
    pub prefs: Preferences,
    #[serde(default)]
    pub recent_meals: Vec<RecentMeal>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub leftovers: Vec<LeftoverItem>,
    #[serde(default)]
    pub constraints: Constraints,
}

impl PlanningContext {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            prefs: Preferences::default(),
            recent_meals: Vec::new(),
            inventory: Vec::new(),
            leftovers: Vec::new(),
            constraints: Constraints::default(),
        }
    }

    /// Reject inputs the core treats as programmer errors.
    ///
    /// Negative or non-positive stock is not an error (it is dropped as "no
    /// stock"), but NaN and infinities are, as is a zero attendee count.
    pub fn validate(&self) -> Result<()> {
        if self.constraints.attendees == Some(0) {
            return Err(PlannerError::InvalidInput(
                "attendee count must be at least 1".to_string(),
            ));
        }
        if let Some(item) = self.inventory.iter().find(|item| !item.quantity.is_finite()) {
            return Err(PlannerError::InvalidInput(format!(
                "inventory item '{}' has a non-finite quantity",
                item.name
            )));
        }
        if let Some(item) = self.leftovers.iter().find(|item| !item.quantity.is_finite()) {
            return Err(PlannerError::InvalidInput(format!(
                "leftover '{}' has a non-finite quantity",
                item.name
            )));
        }
        Ok(())
    }
}
