//! Collaborators that supply the planning context, and the assembler that
//! turns their answers plus caller overrides into a [`PlanningContext`].

pub mod snapshot;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::DEFAULT_RECENT_MEAL_LIMIT;
use crate::error::Result;
use crate::models::{InventoryItem, LeftoverItem, PlanningContext, Preferences, RecentMeal};

pub use snapshot::{load_inventory_csv, SnapshotStore};

pub trait InventoryProvider {
    fn inventory(&self) -> Result<Vec<InventoryItem>>;
}

pub trait LeftoverProvider {
    fn leftovers(&self) -> Result<Vec<LeftoverItem>>;
}

pub trait MealHistoryProvider {
    /// Most recent meals first, at most `limit` of them.
    fn recent_meals(&self, limit: usize) -> Result<Vec<RecentMeal>>;
}

pub trait PreferencesProvider {
    fn preferences(&self) -> Result<Preferences>;
}

/// Per-request adjustments layered over what the providers report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextOverrides {
    pub attendees: Option<u32>,
    pub time_window: Option<String>,
    pub recent_meal_limit: Option<usize>,
    pub diet: Option<String>,
    pub allergens: Option<Vec<String>>,
    pub max_prep_minutes: Option<u32>,
}

impl ContextOverrides {
    /// Meal-history window, never below one.
    pub fn meal_limit(&self, default_limit: usize) -> usize {
        self.recent_meal_limit.unwrap_or(default_limit).max(1)
    }

    /// Apply the preference and constraint overrides in place.
    ///
    /// A blank diet clears the preference; allergens are trimmed and blank
    /// entries dropped.
    pub fn apply_to(&self, context: &mut PlanningContext) {
        if let Some(attendees) = self.attendees {
            context.constraints.attendees = Some(attendees);
        }
        if let Some(window) = &self.time_window {
            context.constraints.time_window = Some(window.clone());
        }
        if let Some(diet) = &self.diet {
            let diet = diet.trim();
            context.prefs.diet = (!diet.is_empty()).then(|| diet.to_string());
        }
        if let Some(allergens) = &self.allergens {
            context.prefs.allergens = allergens
                .iter()
                .map(|allergen| allergen.trim())
                .filter(|allergen| !allergen.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(minutes) = self.max_prep_minutes {
            context.prefs.max_prep_minutes = Some(minutes);
        }
    }
}

pub struct ContextAssembler<'a> {
    inventory: &'a dyn InventoryProvider,
    leftovers: &'a dyn LeftoverProvider,
    history: &'a dyn MealHistoryProvider,
    preferences: &'a dyn PreferencesProvider,
    default_meal_limit: usize,
}

impl<'a> ContextAssembler<'a> {
    pub fn new(
        inventory: &'a dyn InventoryProvider,
        leftovers: &'a dyn LeftoverProvider,
        history: &'a dyn MealHistoryProvider,
        preferences: &'a dyn PreferencesProvider,
    ) -> Self {
        Self {
            inventory,
            leftovers,
            history,
            preferences,
            default_meal_limit: DEFAULT_RECENT_MEAL_LIMIT,
        }
    }

    pub fn with_default_meal_limit(mut self, limit: usize) -> Self {
        self.default_meal_limit = limit;
        self
    }

    /// Gather a validated context for `date`.
    pub fn assemble(&self, date: NaiveDate, overrides: &ContextOverrides) -> Result<PlanningContext> {
        let limit = overrides.meal_limit(self.default_meal_limit);
        let mut context = PlanningContext {
            date,
            prefs: self.preferences.preferences()?,
            recent_meals: self.history.recent_meals(limit)?,
            inventory: self.inventory.inventory()?,
            leftovers: self.leftovers.leftovers()?,
            constraints: Default::default(),
        };
        overrides.apply_to(&mut context);
        context.validate()?;

        debug!(
            date = %date,
            inventory = context.inventory.len(),
            leftovers = context.leftovers.len(),
            recent_meals = context.recent_meals.len(),
            "assembled planning context"
        );
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlannerError;

    fn store() -> SnapshotStore {
        SnapshotStore {
            inventory: vec![InventoryItem {
                id: 1,
                name: "tofu".to_string(),
                quantity: 400.0,
                unit: "g".to_string(),
                best_before: None,
            }],
            leftovers: Vec::new(),
            meals: (1..=5)
                .map(|day| RecentMeal {
                    date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
                    title: format!("Meal {}", day),
                    rating: None,
                })
                .collect(),
            preferences: Preferences {
                diet: Some("vegan".to_string()),
                max_prep_minutes: Some(30),
                allergens: vec!["sesame".to_string()],
            },
        }
    }

    fn assembler(store: &SnapshotStore) -> ContextAssembler<'_> {
        ContextAssembler::new(store, store, store, store)
    }

    #[test]
    fn test_assemble_without_overrides() -> anyhow::Result<()> {
        let store = store();
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let context = assembler(&store).assemble(date, &ContextOverrides::default())?;
        assert_eq!(context.date, date);
        assert_eq!(context.prefs, store.preferences);
        assert_eq!(context.inventory.len(), 1);
        assert_eq!(context.recent_meals.len(), 5);
        assert_eq!(context.recent_meals[0].title, "Meal 5");
        Ok(())
    }

    #[test]
    fn test_overrides_replace_preferences_and_constraints() -> anyhow::Result<()> {
        let store = store();
        let overrides = ContextOverrides {
            attendees: Some(4),
            time_window: Some("18:00-19:00".to_string()),
            recent_meal_limit: Some(2),
            diet: Some("  ".to_string()),
            allergens: Some(vec![" peanut ".to_string(), "".to_string()]),
            max_prep_minutes: Some(60),
        };
        let context = assembler(&store).assemble(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), &overrides)?;
        assert_eq!(context.constraints.attendees, Some(4));
        assert_eq!(context.constraints.time_window.as_deref(), Some("18:00-19:00"));
        assert_eq!(context.prefs.diet, None);
        assert_eq!(context.prefs.allergens, vec!["peanut".to_string()]);
        assert_eq!(context.prefs.max_prep_minutes, Some(60));
        assert_eq!(context.recent_meals.len(), 2);
        Ok(())
    }

    #[test]
    fn test_meal_limit_never_below_one() {
        let overrides = ContextOverrides { recent_meal_limit: Some(0), ..Default::default() };
        assert_eq!(overrides.meal_limit(14), 1);
        assert_eq!(ContextOverrides::default().meal_limit(14), 14);
    }

    #[test]
    fn test_zero_attendee_override_is_rejected() {
        let store = store();
        let overrides = ContextOverrides { attendees: Some(0), ..Default::default() };
        let result = assembler(&store).assemble(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(), &overrides);
        assert!(matches!(result, Err(PlannerError::InvalidInput(_))));
    }
}
