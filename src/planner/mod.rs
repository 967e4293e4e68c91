//! Rule-based dinner planning: rank the catalog, draft candidates for the
//! best recipes, then hand the draft to the reconciler.

pub mod candidate;
pub mod engine;
pub mod matching;
pub mod rules;

use tracing::{info, warn};

use crate::catalog::RecipeCatalog;
use crate::config::Settings;
use crate::llm::PlanGenerator;
use crate::models::{IngredientRequirement, Plan, PlanCandidate, PlanningContext, ShoppingShortfall, ShortfallReason};
use crate::reconcile::InventoryReconciler;
use crate::units::Measure;

pub use candidate::build_candidate;
pub use engine::{ConstraintEngine, ConstraintEvaluation};
pub use matching::{build_inventory_index, normalize_name};
pub use rules::{ConstraintRule, RuleResult};

pub const PLACEHOLDER_TITLE: &str = "Pantry Pasta";
const PLACEHOLDER_MINUTES: u32 = 25;
const PLACEHOLDER_SERVINGS: u32 = 2;

/// Candidate used when nothing ranks and the pantry is empty.
fn placeholder_candidate(context: &PlanningContext) -> PlanCandidate {
    let pasta = Measure::grams(300.0);
    let tomatoes = Measure::grams(400.0);
    PlanCandidate {
        title: PLACEHOLDER_TITLE.to_string(),
        estimated_minutes: Some(context.prefs.max_prep_minutes.unwrap_or(PLACEHOLDER_MINUTES)),
        servings: Some(context.constraints.attendees.unwrap_or(PLACEHOLDER_SERVINGS)),
        steps: vec![
            "Boil pasta until al dente.".to_string(),
            "Sauté garlic in olive oil, add canned tomatoes.".to_string(),
            "Combine pasta with sauce and serve with herbs.".to_string(),
        ],
        ingredients_required: vec![
            IngredientRequirement::new(None, "pasta", pasta),
            IngredientRequirement::new(None, "canned tomatoes", tomatoes),
        ],
        inventory_deltas: Vec::new(),
        shopping_shortfall: vec![
            ShoppingShortfall::new(None, "pasta", pasta, ShortfallReason::NotInInventory),
            ShoppingShortfall::new(None, "canned tomatoes", tomatoes, ShortfallReason::NotInInventory),
        ],
        macros_per_serving: None,
        diagnostics: Vec::new(),
    }
}

/// Owns the injected catalog and the pieces that run over it.
#[derive(Debug, Clone)]
pub struct MealPlanner {
    catalog: RecipeCatalog,
    engine: ConstraintEngine,
    reconciler: InventoryReconciler,
    top_candidates: usize,
}

impl MealPlanner {
    pub fn new(catalog: RecipeCatalog) -> Self {
        Self::from_settings(catalog, &Settings::default())
    }

    pub fn from_settings(catalog: RecipeCatalog, settings: &Settings) -> Self {
        Self {
            catalog,
            engine: ConstraintEngine::with_default_max_minutes(settings.default_max_prep_minutes),
            reconciler: InventoryReconciler::from_settings(settings),
            top_candidates: settings.top_candidates.max(1),
        }
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn rank_recipes(&self, context: &PlanningContext) -> Vec<ConstraintEvaluation<'_>> {
        self.engine.rank_recipes(context, &self.catalog)
    }

    /// Candidates for the top-ranked recipes, before reconciliation.
    ///
    /// Falls back to the first catalog recipe when the pantry has stock, and
    /// to the placeholder otherwise.
    pub fn draft_plan(&self, context: &PlanningContext) -> Plan {
        let index = build_inventory_index(&context.inventory);
        let mut candidates: Vec<PlanCandidate> = self
            .rank_recipes(context)
            .iter()
            .take(self.top_candidates)
            .map(|evaluation| build_candidate(evaluation.recipe, context, &index))
            .collect();

        if candidates.is_empty() {
            let fallback = match self.catalog.first() {
                Some(recipe) if !context.inventory.is_empty() => build_candidate(recipe, context, &index),
                _ => placeholder_candidate(context),
            };
            warn!(date = %context.date, title = %fallback.title, "no recipe ranked, using fallback");
            candidates.push(fallback);
        }

        Plan { date: context.date, candidates }
    }

    pub fn reconcile(&self, context: &PlanningContext, plan: &Plan) -> Plan {
        self.reconciler.reconcile(context, plan)
    }

    /// Rank, draft and reconcile.
    pub fn generate_plan(&self, context: &PlanningContext) -> Plan {
        let draft = self.draft_plan(context);
        let plan = self.reconcile(context, &draft);
        info!(date = %plan.date, candidates = plan.candidates.len(), "generated plan");
        plan
    }

    /// Plan through an external generator, falling back to the rule-based
    /// path when it fails or proposes nothing. The result is reconciled
    /// either way.
    pub fn plan_with(&self, context: &PlanningContext, generator: &dyn PlanGenerator) -> Plan {
        let draft = match generator.generate(context) {
            Ok(plan) if !plan.candidates.is_empty() => Plan { date: context.date, ..plan },
            Ok(_) => {
                warn!(generator = generator.name(), "generator returned no candidates, using rule-based plan");
                self.draft_plan(context)
            }
            Err(err) => {
                warn!(generator = generator.name(), error = %err, "generator failed, using rule-based plan");
                self.draft_plan(context)
            }
        };
        let plan = self.reconcile(context, &draft);
        info!(date = %plan.date, candidates = plan.candidates.len(), generator = generator.name(), "generated plan");
        plan
    }
}

impl Default for MealPlanner {
    fn default() -> Self {
        Self::new(RecipeCatalog::builtin())
    }
}

/// Rank `catalog` with the standard rule set.
pub fn rank_recipes<'a>(context: &PlanningContext, catalog: &'a RecipeCatalog) -> Vec<ConstraintEvaluation<'a>> {
    ConstraintEngine::default().rank_recipes(context, catalog)
}

/// Plan against the built-in catalog with default settings.
pub fn generate_plan(context: &PlanningContext) -> Plan {
    MealPlanner::default().generate_plan(context)
}
