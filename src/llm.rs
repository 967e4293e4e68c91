//! Plan generators.
//!
//! The rule-based planner is one [`PlanGenerator`]; a language-model
//! backend is another. Whatever a generator returns goes through the
//! reconciler before anyone sees it, so a generator only has to get the
//! titles, steps and requirements roughly right.

use serde::Deserialize;
use tracing::debug;

use crate::error::{PlannerError, Result};
use crate::models::{Plan, PlanCandidate, PlanningContext};
use crate::planner::MealPlanner;

pub trait PlanGenerator {
    fn name(&self) -> &str;

    /// Propose a plan. The result may be unreconciled.
    fn generate(&self, context: &PlanningContext) -> Result<Plan>;
}

/// Ranking plus candidate drafting over an injected catalog.
pub struct RuleBasedGenerator<'a> {
    planner: &'a MealPlanner,
}

impl<'a> RuleBasedGenerator<'a> {
    pub fn new(planner: &'a MealPlanner) -> Self {
        Self { planner }
    }
}

impl PlanGenerator for RuleBasedGenerator<'_> {
    fn name(&self) -> &str {
        "rule_based"
    }

    fn generate(&self, context: &PlanningContext) -> Result<Plan> {
        Ok(self.planner.draft_plan(context))
    }
}

/// A text-in, text-out model endpoint.
pub trait PlannerBackend {
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Deterministic backend that never proposes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockPlannerBackend;

impl PlannerBackend for MockPlannerBackend {
    fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        Ok(r#"{"candidates": []}"#.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedPlan {
    #[serde(default)]
    candidates: Vec<PlanCandidate>,
}

const SYSTEM_PROMPT: &str = "You are a household dinner planning assistant.
Propose up to three dinner candidates for the given date using the planning context.
Return the output as a JSON object. The JSON object must be the only content in your response. Do not include any explanatory text or markdown formatting before or after the JSON object.
The JSON object must have a single top-level property \"candidates\": an array of objects with the properties:
- \"title\": string
- \"estimated_minutes\": integer
- \"servings\": integer
- \"steps\": array of strings
- \"ingredients_required\": array of objects with \"ingredient_id\" (integer or null), \"name\" and exactly one of \"quantity_g\", \"quantity_ml\" or \"quantity_count\"
- \"macros_per_serving\": object with \"kcal\", \"protein_g\", \"carb_g\", \"fat_g\"
Respect the diet, allergens and time limit in the preferences. Prefer inventory items that expire soon and available leftovers.
Your response must start with { and end with }.";

/// Strip a surrounding markdown code fence, with or without a `json` tag.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6) {
        return trimmed;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

pub struct LlmPlanGenerator<B> {
    backend: B,
}

impl<B: PlannerBackend> LlmPlanGenerator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    /// The context serialized as the user turn.
    pub fn build_prompt(&self, context: &PlanningContext) -> Result<String> {
        let context_json = serde_json::to_string_pretty(context)?;
        Ok(format!("Plan dinner for {}.\nPlanning context:\n{}", context.date, context_json))
    }

    pub fn parse_reply(&self, context: &PlanningContext, reply: &str) -> Result<Plan> {
        let content = strip_code_fences(reply);
        if content.is_empty() {
            return Err(PlannerError::Generator("backend reply is empty".to_string()));
        }
        let generated: GeneratedPlan = serde_json::from_str(content)
            .map_err(|err| PlannerError::Generator(format!("could not parse backend reply: {}", err)))?;
        Ok(Plan { date: context.date, candidates: generated.candidates })
    }
}

impl<B: PlannerBackend> PlanGenerator for LlmPlanGenerator<B> {
    fn name(&self) -> &str {
        "llm"
    }

    fn generate(&self, context: &PlanningContext) -> Result<Plan> {
        let prompt = self.build_prompt(context)?;
        let reply = self.backend.complete(SYSTEM_PROMPT, &prompt)?;
        debug!(reply_len = reply.len(), "backend replied");
        self.parse_reply(context, &reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InventoryItem;
    use chrono::NaiveDate;

    struct CannedBackend(&'static str);

    impl PlannerBackend for CannedBackend {
        fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn context() -> PlanningContext {
        let mut context = PlanningContext::new(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        context.inventory.push(InventoryItem {
            id: 1,
            name: "chicken breast".to_string(),
            quantity: 500.0,
            unit: "g".to_string(),
            best_before: None,
        });
        context
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {} "), "{}");
        assert_eq!(strip_code_fences("```"), "```");
    }

    #[test]
    fn test_mock_backend_yields_empty_plan() -> anyhow::Result<()> {
        let generator = LlmPlanGenerator::new(MockPlannerBackend);
        let plan = generator.generate(&context())?;
        assert!(plan.candidates.is_empty());
        Ok(())
    }

    #[test]
    fn test_fenced_reply_is_parsed() -> anyhow::Result<()> {
        let generator = LlmPlanGenerator::new(CannedBackend(
            "```json\n{\"candidates\": [{\"title\": \"Chicken Tacos\", \"estimated_time_min\": 25, \
             \"ingredients_required\": [{\"ingredient_id\": 1, \"name\": \"chicken breast\", \"qty_g\": 400}]}]}\n```",
        ));
        let plan = generator.generate(&context())?;
        assert_eq!(plan.date, context().date);
        assert_eq!(plan.candidates[0].title, "Chicken Tacos");
        assert_eq!(plan.candidates[0].estimated_minutes, Some(25));
        assert_eq!(plan.candidates[0].ingredients_required[0].quantity_g, Some(400.0));
        Ok(())
    }

    #[test]
    fn test_garbage_reply_is_generator_error() {
        let generator = LlmPlanGenerator::new(CannedBackend("I'd suggest pizza!"));
        assert!(matches!(generator.generate(&context()), Err(PlannerError::Generator(_))));
    }

    #[test]
    fn test_prompt_carries_context() -> anyhow::Result<()> {
        let generator = LlmPlanGenerator::new(MockPlannerBackend);
        let prompt = generator.build_prompt(&context())?;
        assert!(prompt.contains("2024-06-10"));
        assert!(prompt.contains("chicken breast"));
        assert!(generator.system_prompt().contains("\"candidates\""));
        Ok(())
    }

    #[test]
    fn test_rule_based_generator_drafts_from_catalog() -> anyhow::Result<()> {
        let planner = MealPlanner::default();
        let plan = RuleBasedGenerator::new(&planner).generate(&context())?;
        assert_eq!(plan.candidates.len(), 3);
        assert!(plan.candidates.iter().all(|c| c.macros_per_serving.is_none()));
        Ok(())
    }
}
