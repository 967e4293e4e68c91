use serde::Serialize;
use tracing::debug;

use crate::catalog::{RecipeCatalog, RecipeDefinition};
use crate::config::DEFAULT_MAX_PREP_MINUTES;
use crate::models::PlanningContext;
use crate::planner::rules::{ConstraintRule, PlanningSnapshot, RuleResult};

/// A recipe that survived every hard rule, with its aggregate soft score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintEvaluation<'a> {
    pub recipe: &'a RecipeDefinition,
    pub score: f64,
    pub rule_results: Vec<RuleResult>,
}

/// Filters recipes through hard rules and ranks the survivors by the sum of
/// their soft-rule adjustments.
#[derive(Debug, Clone)]
pub struct ConstraintEngine {
    hard_rules: Vec<ConstraintRule>,
    soft_rules: Vec<ConstraintRule>,
}

impl Default for ConstraintEngine {
    fn default() -> Self {
        Self::with_default_max_minutes(DEFAULT_MAX_PREP_MINUTES)
    }
}

impl ConstraintEngine {
    /// Rules keep their relative order within the hard and soft groups.
    pub fn new(rules: Vec<ConstraintRule>) -> Self {
        let (hard_rules, soft_rules) = rules.into_iter().partition(|rule| rule.is_hard());
        Self { hard_rules, soft_rules }
    }

    /// The standard rule set.
    pub fn with_default_max_minutes(default_max_minutes: u32) -> Self {
        Self::new(vec![
            ConstraintRule::DietCompatibility,
            ConstraintRule::AllergenExclusion,
            ConstraintRule::TimeLimit { default_max_minutes },
            ConstraintRule::InventoryCoverage,
            ConstraintRule::BestBeforeUrgency,
            ConstraintRule::LeftoverUtilization,
            ConstraintRule::RecencyPenalty,
            ConstraintRule::AttendeeScaling,
        ])
    }

    /// Evaluate one recipe; `None` when a hard rule rejects it.
    pub fn evaluate_recipe<'a>(
        &self,
        recipe: &'a RecipeDefinition,
        snapshot: &PlanningSnapshot<'_>,
    ) -> Option<ConstraintEvaluation<'a>> {
        let mut rule_results = Vec::with_capacity(self.hard_rules.len() + self.soft_rules.len());

        for rule in &self.hard_rules {
            let result = rule.evaluate(recipe, snapshot);
            if !result.passed {
                debug!(recipe = %recipe.title, rule = result.name, details = ?result.details, "recipe excluded");
                return None;
            }
            rule_results.push(result);
        }

        let mut score = 0.0;
        for rule in &self.soft_rules {
            let result = rule.evaluate(recipe, snapshot);
            score += result.score_adjustment;
            rule_results.push(result);
        }

        debug!(recipe = %recipe.title, score, "recipe scored");
        Some(ConstraintEvaluation { recipe, score, rule_results })
    }

    /// Rank every recipe that passes the hard rules, best first.
    ///
    /// The sort is stable: equal scores keep catalog order.
    pub fn rank_recipes<'a>(
        &self,
        context: &PlanningContext,
        catalog: &'a RecipeCatalog,
    ) -> Vec<ConstraintEvaluation<'a>> {
        let snapshot = PlanningSnapshot::new(context);
        let mut evaluations: Vec<ConstraintEvaluation<'a>> = catalog
            .iter()
            .filter_map(|recipe| self.evaluate_recipe(recipe, &snapshot))
            .collect();
        evaluations.sort_by(|a, b| b.score.total_cmp(&a.score));
        evaluations
    }
}
