pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod models;
pub mod planner;
pub mod providers;
pub mod reconcile;
pub mod units;

pub use catalog::{RecipeCatalog, RecipeDefinition};
pub use error::{PlannerError, Result};
pub use models::{Plan, PlanCandidate, PlanningContext};
pub use planner::{generate_plan, rank_recipes, MealPlanner};
pub use reconcile::{reconcile, InventoryReconciler};
