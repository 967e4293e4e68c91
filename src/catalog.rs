//! Recipe reference data.
//!
//! The catalog is an explicitly constructed, immutable value: the planner is
//! handed one rather than reading a process-wide constant, so tests can build
//! their own.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecipeIngredient {
    pub name: String,
    pub quantity_g: f64,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecipeDefinition {
    pub title: String,
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    pub estimated_minutes: u32,
    /// Name hints used when scoring inventory coverage.
    #[serde(default)]
    pub primary_ingredients: Vec<String>,
    #[serde(default = "default_servings")]
    pub servings: u32,
}

fn default_servings() -> u32 {
    4
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeCatalog {
    recipes: Vec<RecipeDefinition>,
}

impl RecipeCatalog {
    pub fn new(recipes: Vec<RecipeDefinition>) -> Self {
        Self { recipes }
    }

    /// Load a catalog from a JSON array of recipe definitions.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read recipe catalog at {:?}", path))?;
        let recipes: Vec<RecipeDefinition> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse recipe catalog at {:?}", path))?;
        Ok(Self::new(recipes))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecipeDefinition> {
        self.recipes.iter()
    }

    pub fn first(&self) -> Option<&RecipeDefinition> {
        self.recipes.first()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// The household reference recipes.
    pub fn builtin() -> Self {
        Self::new(vec![
            recipe(
                "Lemon Herb Chicken with Roasted Vegetables",
                vec![
                    required("chicken thigh, boneless", 450.0),
                    optional("lemon", 80.0),
                    required("broccoli", 300.0),
                    required("olive oil", 30.0),
                    required("garlic", 12.0),
                ],
                &["omnivore", "gluten-free"],
                &[
                    "Marinate chicken with lemon juice, garlic, and herbs.",
                    "Roast vegetables tossed in olive oil.",
                    "Sear chicken and serve over roasted vegetables.",
                ],
                40,
                &["chicken", "broccoli"],
            ),
            recipe(
                "Chickpea Coconut Curry",
                vec![
                    required("canned chickpeas", 400.0),
                    required("coconut milk", 350.0),
                    required("spinach", 150.0),
                    required("onion", 120.0),
                    required("garlic", 10.0),
                ],
                &["vegan", "vegetarian", "gluten-free"],
                &[
                    "Sauté aromatics until fragrant.",
                    "Simmer chickpeas with coconut milk and spices.",
                    "Stir in spinach to wilt before serving with rice.",
                ],
                30,
                &["canned chickpeas"],
            ),
            recipe(
                "Seared Salmon with Citrus Salad",
                vec![
                    required("salmon fillet", 500.0),
                    required("mixed greens", 150.0),
                    required("orange", 160.0),
                    required("olive oil", 20.0),
                    optional("almonds", 40.0),
                ],
                &["pescatarian", "low-carb"],
                &[
                    "Pan-sear salmon until crisp and cooked through.",
                    "Assemble salad with citrus segments and toasted almonds.",
                    "Serve salmon over salad with vinaigrette.",
                ],
                25,
                &["salmon", "greens"],
            ),
            recipe(
                "Vegetable Stir-Fry with Tofu",
                vec![
                    required("tofu", 400.0),
                    required("bell pepper", 150.0),
                    required("carrot", 120.0),
                    required("soy sauce", 40.0),
                    required("garlic", 10.0),
                ],
                &["vegan", "vegetarian"],
                &[
                    "Press and cube tofu, then sear until golden.",
                    "Stir-fry vegetables until crisp-tender.",
                    "Combine with sauce and simmer briefly before serving over rice or noodles.",
                ],
                20,
                &["tofu"],
            ),
            recipe(
                "Hearty Lentil Soup",
                vec![
                    required("dry lentils", 300.0),
                    required("celery", 80.0),
                    required("carrot", 120.0),
                    required("onion", 120.0),
                    required("vegetable broth", 600.0),
                ],
                &["vegan", "vegetarian", "gluten-free"],
                &[
                    "Sauté mirepoix until softened.",
                    "Add lentils and broth, then simmer until tender.",
                    "Season to taste and finish with fresh herbs.",
                ],
                45,
                &["lentils"],
            ),
        ])
    }
}

fn required(name: &str, quantity_g: f64) -> RecipeIngredient {
    RecipeIngredient { name: name.to_string(), quantity_g, optional: false }
}

fn optional(name: &str, quantity_g: f64) -> RecipeIngredient {
    RecipeIngredient { name: name.to_string(), quantity_g, optional: true }
}

fn recipe(
    title: &str,
    ingredients: Vec<RecipeIngredient>,
    tags: &[&str],
    steps: &[&str],
    estimated_minutes: u32,
    primary_ingredients: &[&str],
) -> RecipeDefinition {
    RecipeDefinition {
        title: title.to_string(),
        ingredients,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        steps: steps.iter().map(|s| s.to_string()).collect(),
        estimated_minutes,
        primary_ingredients: primary_ingredients.iter().map(|p| p.to_string()).collect(),
        servings: default_servings(),
    }
}
