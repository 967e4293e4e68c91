use tracing::debug;

use crate::catalog::RecipeDefinition;
use crate::config::SHORTFALL_EPSILON;
use crate::models::{
    IngredientRequirement, InventoryDelta, PlanCandidate, PlanningContext, ShoppingShortfall,
    ShortfallReason,
};
use crate::planner::matching::{available_grams, normalize_name, InventoryIndex};
use crate::units::Measure;

/// Turn a ranked recipe into a draft candidate by matching each ingredient
/// against the inventory index.
///
/// Recipes state gram amounts, and stock is read as its raw quantity here;
/// unit-aware usage is settled later by the reconciler. Macros are left
/// unset and diagnostics empty.
pub fn build_candidate(
    recipe: &RecipeDefinition,
    context: &PlanningContext,
    inventory: &InventoryIndex<'_>,
) -> PlanCandidate {
    let servings = context.constraints.attendees.unwrap_or(recipe.servings);
    let mut requirements = Vec::with_capacity(recipe.ingredients.len());
    let mut deltas = Vec::new();
    let mut shortfalls = Vec::new();

    for ingredient in &recipe.ingredients {
        let needed = ingredient.quantity_g.max(0.0);
        match inventory.resolve(&normalize_name(&ingredient.name)) {
            Some(item) => {
                let available = available_grams(item);
                let use_amount = available.min(needed);
                requirements.push(
                    IngredientRequirement::new(Some(item.id), item.name.clone(), Measure::grams(needed))
                        .optional(ingredient.optional),
                );
                if use_amount > 0.0 {
                    deltas.push(InventoryDelta::new(item.id, Measure::grams(use_amount)));
                }
                let residual = needed - use_amount;
                if residual > SHORTFALL_EPSILON {
                    shortfalls.push(ShoppingShortfall::new(
                        Some(item.id),
                        item.name.clone(),
                        Measure::grams(residual),
                        ShortfallReason::InsufficientStock,
                    ));
                }
            }
            None => {
                requirements.push(
                    IngredientRequirement::new(None, ingredient.name.clone(), Measure::grams(needed))
                        .optional(ingredient.optional),
                );
                if !ingredient.optional && needed > SHORTFALL_EPSILON {
                    shortfalls.push(ShoppingShortfall::new(
                        None,
                        ingredient.name.clone(),
                        Measure::grams(needed),
                        ShortfallReason::NotInInventory,
                    ));
                }
            }
        }
    }

    debug!(
        recipe = %recipe.title,
        deltas = deltas.len(),
        shortfalls = shortfalls.len(),
        "built candidate"
    );

    PlanCandidate {
        title: recipe.title.clone(),
        estimated_minutes: Some(recipe.estimated_minutes),
        servings: Some(servings),
        steps: recipe.steps.clone(),
        ingredients_required: requirements,
        inventory_deltas: deltas,
        shopping_shortfall: shortfalls,
        macros_per_serving: None,
        diagnostics: Vec::new(),
    }
}
