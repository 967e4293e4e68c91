pub mod context;
pub mod plan;

pub use context::{Constraints, InventoryItem, LeftoverItem, PlanningContext, Preferences, RecentMeal};
pub use plan::{
    IngredientRequirement, InventoryDelta, Macros, Plan, PlanCandidate, ShoppingShortfall,
    ShortfallReason,
};
