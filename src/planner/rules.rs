//! Declarative planning rules.
//!
//! Each rule evaluates one recipe against a [`PlanningSnapshot`]. Hard rules
//! pass or fail; soft rules always pass and contribute a signed score
//! adjustment. Hard versus soft is a property of the variant.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::catalog::RecipeDefinition;
use crate::models::PlanningContext;
use crate::planner::matching::{
    available_grams, build_inventory_index, build_leftover_index, normalize_name, InventoryIndex,
    LeftoverIndex,
};

/// Tag that satisfies any diet preference.
pub const FLEXIBLE_TAG: &str = "flexible";

const COVERAGE_WEIGHT: f64 = 1.5;
const MISSING_INGREDIENT_PENALTY: f64 = 0.4;
const PRIMARY_HIT_BONUS: f64 = 0.6;
const NO_COVERAGE_PENALTY: f64 = -1.0;

const EXPIRED_BONUS: f64 = 1.5;
const EXPIRES_WITHIN_2_DAYS_BONUS: f64 = 1.2;
const EXPIRES_WITHIN_WEEK_BONUS: f64 = 0.6;
const EXPIRES_WITHIN_2_WEEKS_BONUS: f64 = 0.2;

const LEFTOVER_BONUS: f64 = 0.8;
const UNUSED_LEFTOVERS_PENALTY: f64 = -0.1;

const RECENCY_BASE_PENALTY: f64 = 1.5;
const RECENCY_DECAY_PER_DAY: f64 = 0.2;
const RECENCY_MIN_PENALTY: f64 = 0.3;
const NOVELTY_BONUS: f64 = 0.3;

const SERVINGS_RATIO_MIN: f64 = 0.5;
const SERVINGS_RATIO_MAX: f64 = 2.0;
const SERVINGS_FIT_BONUS: f64 = 0.4;
const SERVINGS_MISFIT_PENALTY: f64 = -0.2;

/// Indexes built once per ranking call and shared by every rule.
#[derive(Debug)]
pub struct PlanningSnapshot<'a> {
    pub context: &'a PlanningContext,
    pub inventory: InventoryIndex<'a>,
    pub leftovers: LeftoverIndex<'a>,
    pub current_date: NaiveDate,
}

impl<'a> PlanningSnapshot<'a> {
    pub fn new(context: &'a PlanningContext) -> Self {
        Self {
            context,
            inventory: build_inventory_index(&context.inventory),
            leftovers: build_leftover_index(&context.leftovers),
            current_date: context.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    pub name: &'static str,
    pub passed: bool,
    pub score_adjustment: f64,
    pub details: Vec<String>,
}

impl RuleResult {
    fn pass(name: &'static str) -> Self {
        Self { name, passed: true, score_adjustment: 0.0, details: Vec::new() }
    }

    fn fail(name: &'static str, detail: String) -> Self {
        Self { name, passed: false, score_adjustment: 0.0, details: vec![detail] }
    }

    fn score(name: &'static str, score_adjustment: f64, details: Vec<String>) -> Self {
        Self { name, passed: true, score_adjustment, details }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintRule {
    DietCompatibility,
    AllergenExclusion,
    TimeLimit { default_max_minutes: u32 },
    InventoryCoverage,
    BestBeforeUrgency,
    LeftoverUtilization,
    RecencyPenalty,
    AttendeeScaling,
}

impl ConstraintRule {
    pub fn name(&self) -> &'static str {
        match self {
            ConstraintRule::DietCompatibility => "diet_compatibility",
            ConstraintRule::AllergenExclusion => "allergen_exclusion",
            ConstraintRule::TimeLimit { .. } => "time_limit",
            ConstraintRule::InventoryCoverage => "inventory_coverage",
            ConstraintRule::BestBeforeUrgency => "expiry_priority",
            ConstraintRule::LeftoverUtilization => "leftover_utilization",
            ConstraintRule::RecencyPenalty => "recency_penalty",
            ConstraintRule::AttendeeScaling => "attendee_scaling",
        }
    }

    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            ConstraintRule::DietCompatibility
                | ConstraintRule::AllergenExclusion
                | ConstraintRule::TimeLimit { .. }
        )
    }

    pub fn evaluate(&self, recipe: &RecipeDefinition, snapshot: &PlanningSnapshot<'_>) -> RuleResult {
        let name = self.name();
        match self {
            ConstraintRule::DietCompatibility => diet_compatibility(name, recipe, snapshot),
            ConstraintRule::AllergenExclusion => allergen_exclusion(name, recipe, snapshot),
            ConstraintRule::TimeLimit { default_max_minutes } => {
                time_limit(name, recipe, snapshot, *default_max_minutes)
            }
            ConstraintRule::InventoryCoverage => inventory_coverage(name, recipe, snapshot),
            ConstraintRule::BestBeforeUrgency => best_before_urgency(name, recipe, snapshot),
            ConstraintRule::LeftoverUtilization => leftover_utilization(name, recipe, snapshot),
            ConstraintRule::RecencyPenalty => recency_penalty(name, recipe, snapshot),
            ConstraintRule::AttendeeScaling => attendee_scaling(name, recipe, snapshot),
        }
    }
}

fn diet_compatibility(
    name: &'static str,
    recipe: &RecipeDefinition,
    snapshot: &PlanningSnapshot<'_>,
) -> RuleResult {
    let diet = snapshot
        .context
        .prefs
        .diet
        .as_deref()
        .map(normalize_name)
        .unwrap_or_default();
    if diet.is_empty() {
        return RuleResult::pass(name);
    }
    let tags: BTreeSet<String> = recipe.tags.iter().map(|tag| normalize_name(tag)).collect();
    if tags.contains(&diet) || tags.contains(FLEXIBLE_TAG) {
        return RuleResult::pass(name);
    }
    RuleResult::fail(name, format!("recipe missing tag for diet '{}'", diet))
}

fn allergen_exclusion(
    name: &'static str,
    recipe: &RecipeDefinition,
    snapshot: &PlanningSnapshot<'_>,
) -> RuleResult {
    let allergens: Vec<String> = snapshot
        .context
        .prefs
        .allergens
        .iter()
        .map(|allergen| normalize_name(allergen))
        .filter(|allergen| !allergen.is_empty())
        .collect();
    if allergens.is_empty() {
        return RuleResult::pass(name);
    }

    for ingredient in &recipe.ingredients {
        let ingredient_name = normalize_name(&ingredient.name);
        if let Some(allergen) = allergens.iter().find(|a| ingredient_name.contains(a.as_str())) {
            return RuleResult::fail(
                name,
                format!(
                    "ingredient '{}' violates allergen policy ({})",
                    ingredient.name, allergen
                ),
            );
        }
    }
    RuleResult::pass(name)
}

fn time_limit(
    name: &'static str,
    recipe: &RecipeDefinition,
    snapshot: &PlanningSnapshot<'_>,
    default_max_minutes: u32,
) -> RuleResult {
    let max_minutes = snapshot.context.prefs.max_prep_minutes.unwrap_or(default_max_minutes);
    if recipe.estimated_minutes <= max_minutes {
        return RuleResult::pass(name);
    }
    RuleResult::fail(
        name,
        format!(
            "recipe requires {} min, exceeding limit of {} min",
            recipe.estimated_minutes, max_minutes
        ),
    )
}

fn inventory_coverage(
    name: &'static str,
    recipe: &RecipeDefinition,
    snapshot: &PlanningSnapshot<'_>,
) -> RuleResult {
    let primary_hints: Vec<String> = recipe
        .primary_ingredients
        .iter()
        .map(|hint| normalize_name(hint))
        .filter(|hint| !hint.is_empty())
        .collect();

    let mut coverage_ratios: Vec<f64> = Vec::new();
    let mut missing: Vec<&str> = Vec::new();
    let mut primary_hits = 0usize;

    for ingredient in recipe.ingredients.iter().filter(|i| !i.optional) {
        let normalized = normalize_name(&ingredient.name);
        let Some(item) = snapshot.inventory.resolve(&normalized) else {
            missing.push(&ingredient.name);
            continue;
        };

        let needed = ingredient.quantity_g;
        let available = available_grams(item);
        let ratio = if needed > 0.0 { (available / needed).min(1.0) } else { 1.0 };
        coverage_ratios.push(ratio);

        if primary_hints.iter().any(|hint| normalized.contains(hint.as_str())) {
            primary_hits += 1;
        }
    }

    if coverage_ratios.is_empty() {
        if missing.is_empty() {
            return RuleResult::pass(name);
        }
        return RuleResult::score(
            name,
            NO_COVERAGE_PENALTY,
            vec![format!("no inventory coverage for {}", missing.join(", "))],
        );
    }

    let mean_coverage = coverage_ratios.iter().sum::<f64>() / coverage_ratios.len() as f64;
    let score = COVERAGE_WEIGHT * mean_coverage
        - MISSING_INGREDIENT_PENALTY * missing.len() as f64
        + PRIMARY_HIT_BONUS * primary_hits as f64;

    let mut details = Vec::new();
    if !missing.is_empty() {
        details.push(format!("missing {}", missing.join(", ")));
    }
    if primary_hits > 0 {
        details.push(format!("covers {} primary ingredients", primary_hits));
    }
    RuleResult::score(name, score, details)
}

fn best_before_urgency(
    name: &'static str,
    recipe: &RecipeDefinition,
    snapshot: &PlanningSnapshot<'_>,
) -> RuleResult {
    let mut bonus = 0.0;
    let mut details = Vec::new();

    for ingredient in &recipe.ingredients {
        let normalized = normalize_name(&ingredient.name);
        let Some(item) = snapshot.inventory.resolve(&normalized) else {
            continue;
        };
        let Some(best_before) = item.best_before else {
            continue;
        };
        let days_remaining = (best_before - snapshot.current_date).num_days();
        if days_remaining < 0 {
            bonus += EXPIRED_BONUS;
            details.push(format!("{} expired", item.name));
        } else if days_remaining <= 2 {
            bonus += EXPIRES_WITHIN_2_DAYS_BONUS;
            details.push(format!("{} expiring in {}d", item.name, days_remaining));
        } else if days_remaining <= 7 {
            bonus += EXPIRES_WITHIN_WEEK_BONUS;
        } else if days_remaining <= 14 {
            bonus += EXPIRES_WITHIN_2_WEEKS_BONUS;
        }
    }

    RuleResult::score(name, bonus, details)
}

fn leftover_utilization(
    name: &'static str,
    recipe: &RecipeDefinition,
    snapshot: &PlanningSnapshot<'_>,
) -> RuleResult {
    if snapshot.leftovers.is_empty() {
        return RuleResult::pass(name);
    }

    let used: BTreeSet<&str> = recipe
        .ingredients
        .iter()
        .filter_map(|ingredient| snapshot.leftovers.resolve(&normalize_name(&ingredient.name)))
        .map(|leftover| leftover.name.as_str())
        .collect();

    if used.is_empty() {
        return RuleResult::score(name, UNUSED_LEFTOVERS_PENALTY, Vec::new());
    }

    let names: Vec<&str> = used.iter().copied().collect();
    RuleResult::score(
        name,
        LEFTOVER_BONUS * used.len() as f64,
        vec![format!("uses leftovers: {}", names.join(", "))],
    )
}

fn recency_penalty(
    name: &'static str,
    recipe: &RecipeDefinition,
    snapshot: &PlanningSnapshot<'_>,
) -> RuleResult {
    let meals = &snapshot.context.recent_meals;
    if meals.is_empty() {
        return RuleResult::pass(name);
    }

    let mut last_served: HashMap<String, NaiveDate> = HashMap::new();
    for meal in meals {
        let entry = last_served.entry(normalize_name(&meal.title)).or_insert(meal.date);
        if meal.date > *entry {
            *entry = meal.date;
        }
    }

    let Some(served_on) = last_served.get(&normalize_name(&recipe.title)) else {
        return RuleResult::score(name, NOVELTY_BONUS, Vec::new());
    };

    let days_since = (snapshot.current_date - *served_on).num_days().max(0);
    let penalty = (RECENCY_BASE_PENALTY - RECENCY_DECAY_PER_DAY * days_since as f64)
        .max(RECENCY_MIN_PENALTY);
    RuleResult::score(
        name,
        -penalty,
        vec![format!("served {}d ago, applying penalty {:.2}", days_since, penalty)],
    )
}

fn attendee_scaling(
    name: &'static str,
    recipe: &RecipeDefinition,
    snapshot: &PlanningSnapshot<'_>,
) -> RuleResult {
    let Some(attendees) = snapshot.context.constraints.attendees else {
        return RuleResult::pass(name);
    };
    if attendees == 0 || recipe.servings == 0 {
        return RuleResult::pass(name);
    }

    let ratio = attendees as f64 / recipe.servings as f64;
    if (SERVINGS_RATIO_MIN..=SERVINGS_RATIO_MAX).contains(&ratio) {
        return RuleResult::score(name, SERVINGS_FIT_BONUS, Vec::new());
    }
    RuleResult::score(
        name,
        SERVINGS_MISFIT_PENALTY,
        vec![format!("servings ratio {:.2} less ideal for {} diners", ratio, attendees)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RecipeIngredient;
    use crate::models::{InventoryItem, LeftoverItem, RecentMeal};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn stir_fry() -> RecipeDefinition {
        RecipeDefinition {
            title: "Vegetable Stir-Fry with Tofu".to_string(),
            ingredients: vec![
                RecipeIngredient { name: "tofu".to_string(), quantity_g: 400.0, optional: false },
                RecipeIngredient { name: "bell pepper".to_string(), quantity_g: 150.0, optional: false },
                RecipeIngredient { name: "peanuts".to_string(), quantity_g: 30.0, optional: true },
            ],
            tags: vec!["Vegan".to_string(), "vegetarian".to_string()],
            steps: Vec::new(),
            estimated_minutes: 20,
            primary_ingredients: vec!["tofu".to_string()],
            servings: 4,
        }
    }

    fn stock(id: u64, name: &str, quantity: f64, best_before: Option<NaiveDate>) -> InventoryItem {
        InventoryItem { id, name: name.to_string(), quantity, unit: "g".to_string(), best_before }
    }

    fn context() -> PlanningContext {
        PlanningContext::new(date(10))
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
    }

    #[test]
    fn test_diet_rule_matches_tag_or_flexible() {
        let recipe = stir_fry();
        let mut ctx = context();
        assert!(ConstraintRule::DietCompatibility.evaluate(&recipe, &PlanningSnapshot::new(&ctx)).passed);

        ctx.prefs.diet = Some(" VEGAN ".to_string());
        assert!(ConstraintRule::DietCompatibility.evaluate(&recipe, &PlanningSnapshot::new(&ctx)).passed);

        ctx.prefs.diet = Some("omnivore".to_string());
        let result = ConstraintRule::DietCompatibility.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert!(!result.passed);
        assert_eq!(result.details, vec!["recipe missing tag for diet 'omnivore'".to_string()]);

        let mut flexible = stir_fry();
        flexible.tags.push("flexible".to_string());
        assert!(ConstraintRule::DietCompatibility.evaluate(&flexible, &PlanningSnapshot::new(&ctx)).passed);
    }

    #[test]
    fn test_allergen_rule_checks_optional_ingredients_too() {
        let recipe = stir_fry();
        let mut ctx = context();
        ctx.prefs.allergens = vec!["Peanut".to_string()];
        let result = ConstraintRule::AllergenExclusion.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert!(!result.passed);
        assert!(result.details[0].contains("peanuts"));

        ctx.prefs.allergens = vec!["shellfish".to_string(), "  ".to_string()];
        assert!(ConstraintRule::AllergenExclusion.evaluate(&recipe, &PlanningSnapshot::new(&ctx)).passed);
    }

    #[test]
    fn test_time_limit_uses_default_when_unset() {
        let mut recipe = stir_fry();
        recipe.estimated_minutes = 50;
        let mut ctx = context();
        let rule = ConstraintRule::TimeLimit { default_max_minutes: 45 };
        assert!(!rule.evaluate(&recipe, &PlanningSnapshot::new(&ctx)).passed);

        ctx.prefs.max_prep_minutes = Some(60);
        assert!(rule.evaluate(&recipe, &PlanningSnapshot::new(&ctx)).passed);
        assert!(rule.is_hard());
    }

    #[test]
    fn test_inventory_coverage_weighted_formula() {
        let recipe = stir_fry();
        let mut ctx = context();
        ctx.inventory = vec![stock(1, "Firm Tofu", 200.0, None), stock(2, "bell pepper", 300.0, None)];
        let result = ConstraintRule::InventoryCoverage.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        // tofu 0.5, pepper 1.0, one primary hit, optional peanuts ignored
        assert_close(result.score_adjustment, 1.5 * 0.75 + 0.6);
        assert!(result.passed);
    }

    #[test]
    fn test_inventory_coverage_converts_kilograms() {
        let recipe = stir_fry();
        let mut ctx = context();
        let mut tofu = stock(1, "tofu", 1.0, None);
        tofu.unit = "kg".to_string();
        ctx.inventory = vec![tofu, stock(2, "bell pepper", 150.0, None)];
        let in_kg = ConstraintRule::InventoryCoverage.evaluate(&recipe, &PlanningSnapshot::new(&ctx));

        ctx.inventory[0] = stock(1, "tofu", 400.0, None);
        let in_g = ConstraintRule::InventoryCoverage.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert_close(in_kg.score_adjustment, in_g.score_adjustment);
        assert_close(in_kg.score_adjustment, 1.5 + 0.6);
    }

    #[test]
    fn test_blank_inventory_name_does_not_inflate_coverage() {
        let recipe = stir_fry();
        let mut ctx = context();
        ctx.inventory = vec![stock(1, "  ", 10_000.0, None)];
        let result = ConstraintRule::InventoryCoverage.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert_close(result.score_adjustment, -1.0);
    }

    #[test]
    fn test_inventory_coverage_penalizes_missing_and_total_absence() {
        let recipe = stir_fry();
        let mut ctx = context();
        ctx.inventory = vec![stock(2, "bell pepper", 300.0, None)];
        let result = ConstraintRule::InventoryCoverage.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert_close(result.score_adjustment, 1.5 - 0.4);
        assert_eq!(result.details, vec!["missing tofu".to_string()]);

        ctx.inventory.clear();
        let result = ConstraintRule::InventoryCoverage.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert_close(result.score_adjustment, -1.0);
    }

    #[test]
    fn test_best_before_bonuses_accumulate() {
        let recipe = stir_fry();
        let mut ctx = context();
        ctx.inventory = vec![
            stock(1, "tofu", 400.0, Some(date(9))),
            stock(2, "bell pepper", 150.0, Some(date(15))),
            stock(3, "peanuts", 30.0, Some(date(22))),
        ];
        let result = ConstraintRule::BestBeforeUrgency.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert_close(result.score_adjustment, 1.5 + 0.6 + 0.2);
        assert_eq!(result.details, vec!["tofu expired".to_string()]);
    }

    #[test]
    fn test_leftover_rule_counts_distinct_leftovers() {
        let mut recipe = stir_fry();
        recipe.ingredients.push(RecipeIngredient {
            name: "smoked tofu".to_string(),
            quantity_g: 100.0,
            optional: false,
        });
        let mut ctx = context();
        let snapshot = PlanningSnapshot::new(&ctx);
        assert_eq!(ConstraintRule::LeftoverUtilization.evaluate(&recipe, &snapshot).score_adjustment, 0.0);

        ctx.leftovers = vec![LeftoverItem {
            name: "Tofu".to_string(),
            quantity: 200.0,
            unit: "g".to_string(),
            best_before: None,
        }];
        let result = ConstraintRule::LeftoverUtilization.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert_close(result.score_adjustment, 0.8);

        ctx.leftovers[0].name = "rice".to_string();
        let result = ConstraintRule::LeftoverUtilization.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert_close(result.score_adjustment, -0.1);
    }

    #[test]
    fn test_recency_penalty_decays_with_floor() {
        let recipe = stir_fry();
        let mut ctx = context();
        ctx.recent_meals = vec![
            RecentMeal { date: date(1), title: "vegetable stir-fry with tofu".to_string(), rating: None },
            RecentMeal { date: date(8), title: "Vegetable Stir-Fry with Tofu".to_string(), rating: Some(4) },
        ];
        let result = ConstraintRule::RecencyPenalty.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert_close(result.score_adjustment, -(1.5 - 0.2 * 2.0));

        ctx.recent_meals.truncate(1);
        let result = ConstraintRule::RecencyPenalty.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert_close(result.score_adjustment, -0.3);

        ctx.recent_meals[0].title = "Pizza".to_string();
        let result = ConstraintRule::RecencyPenalty.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
        assert_close(result.score_adjustment, 0.3);
    }

    #[test]
    fn test_attendee_scaling_window() {
        let recipe = stir_fry();
        let mut ctx = context();
        for (attendees, expected) in [(2, 0.4), (8, 0.4), (1, -0.2), (9, -0.2)] {
            ctx.constraints.attendees = Some(attendees);
            let result = ConstraintRule::AttendeeScaling.evaluate(&recipe, &PlanningSnapshot::new(&ctx));
            assert_close(result.score_adjustment, expected);
        }
    }
}
