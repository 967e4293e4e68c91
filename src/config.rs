//! Planner settings.
//!
//! Resolution order: compiled defaults, then an optional TOML file, then
//! environment overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PlannerError, Result};

pub const CONFIG_PATH_ENV_VAR: &str = "PANTRY_PLANNER_CONFIG";
pub const LOG_LEVEL_ENV_VAR: &str = "PANTRY_PLANNER_LOG_LEVEL";
pub const LOG_FORMAT_ENV_VAR: &str = "PANTRY_PLANNER_LOG_FORMAT";
pub const TOP_CANDIDATES_ENV_VAR: &str = "PANTRY_PLANNER_TOP_CANDIDATES";

/// Number of ranked recipes turned into candidates.
pub const DEFAULT_TOP_CANDIDATES: usize = 3;
/// Prep-time ceiling used when the household has not set one.
pub const DEFAULT_MAX_PREP_MINUTES: u32 = 45;
pub const DEFAULT_RECENT_MEAL_LIMIT: usize = 14;
/// Normalized divergence above which a stated macro estimate is replaced.
pub const MACRO_DIVERGENCE_THRESHOLD: f64 = 0.2;
/// Mass assumed for one counted unit when estimating macros.
pub const COUNT_MASS_EQUIVALENT_G: f64 = 75.0;
/// Residuals at or below this are treated as fully covered.
pub const SHORTFALL_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub top_candidates: usize,
    pub default_max_prep_minutes: u32,
    pub recent_meal_limit: usize,
    pub macro_divergence_threshold: f64,
    pub count_mass_equivalent_g: f64,
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "plain" | "text" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            other => Err(PlannerError::Config(format!("unknown log format '{}'", other))),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top_candidates: DEFAULT_TOP_CANDIDATES,
            default_max_prep_minutes: DEFAULT_MAX_PREP_MINUTES,
            recent_meal_limit: DEFAULT_RECENT_MEAL_LIMIT,
            macro_divergence_threshold: MACRO_DIVERGENCE_THRESHOLD,
            count_mass_equivalent_g: COUNT_MASS_EQUIVALENT_G,
            log_level: "info".to_string(),
            log_format: LogFormat::Plain,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load settings from an explicit path, else `PANTRY_PLANNER_CONFIG`,
    /// else defaults; environment overrides are applied last.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match std::env::var(CONFIG_PATH_ENV_VAR) {
                Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
                _ => Self::default(),
            },
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply overrides from a key lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(LOG_LEVEL_ENV_VAR) {
            if !level.trim().is_empty() {
                self.log_level = level.trim().to_string();
            }
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV_VAR) {
            self.log_format = format.parse()?;
        }
        if let Some(top) = lookup(TOP_CANDIDATES_ENV_VAR) {
            self.top_candidates = top.trim().parse().map_err(|_| {
                PlannerError::Config(format!("{} must be a positive integer, got '{}'", TOP_CANDIDATES_ENV_VAR, top))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_candidates == 0 {
            return Err(PlannerError::Config("top_candidates must be at least 1".to_string()));
        }
        if !(self.macro_divergence_threshold.is_finite() && self.macro_divergence_threshold >= 0.0) {
            return Err(PlannerError::Config(
                "macro_divergence_threshold must be a non-negative number".to_string(),
            ));
        }
        if !(self.count_mass_equivalent_g.is_finite() && self.count_mass_equivalent_g > 0.0) {
            return Err(PlannerError::Config(
                "count_mass_equivalent_g must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}
