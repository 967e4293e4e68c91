use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_PATH_ENV_VAR;
use crate::providers::ContextOverrides;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan tonight's dinner from what is in the pantry", long_about = None)]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(short, long, global = true, env = CONFIG_PATH_ENV_VAR)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a reconciled dinner plan
    Plan(PlanArgs),
    /// Show how every surviving recipe scores
    Rank(ContextArgs),
    /// Reconcile an existing plan against the context inventory
    Reconcile(ReconcileArgs),
}

/// Where the planning context comes from.
#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Planning context JSON file
    #[arg(long, required_unless_present = "snapshot", conflicts_with = "snapshot")]
    pub context: Option<PathBuf>,

    /// Household snapshot JSON file (inventory, leftovers, meals, preferences)
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Planning date for snapshots, YYYY-MM-DD (defaults to today)
    #[arg(long, requires = "snapshot")]
    pub date: Option<NaiveDate>,

    /// Inventory CSV (id,name,qty,unit,best_before) replacing the context inventory
    #[arg(long)]
    pub inventory_csv: Option<PathBuf>,

    /// Recipe catalog JSON file (defaults to the built-in catalog)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    #[arg(long)]
    pub attendees: Option<u32>,

    #[arg(long)]
    pub diet: Option<String>,

    #[arg(long = "max-minutes")]
    pub max_minutes: Option<u32>,

    /// Allergen to exclude; may be repeated
    #[arg(long = "allergen")]
    pub allergens: Vec<String>,

    /// Number of past meals considered for the recency penalty
    #[arg(long)]
    pub recent_meals: Option<usize>,
}

impl ContextArgs {
    pub fn overrides(&self) -> ContextOverrides {
        ContextOverrides {
            attendees: self.attendees,
            time_window: None,
            recent_meal_limit: self.recent_meals,
            diet: self.diet.clone(),
            allergens: (!self.allergens.is_empty()).then(|| self.allergens.clone()),
            max_prep_minutes: self.max_minutes,
        }
    }
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: ContextArgs,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub source: ContextArgs,

    /// Plan JSON file to reconcile
    #[arg(long)]
    pub plan: PathBuf,

    #[arg(long)]
    pub pretty: bool,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plan_args_map_to_overrides() {
        let cli = Cli::parse_from([
            "pantry-planner",
            "plan",
            "--context",
            "ctx.json",
            "--attendees",
            "3",
            "--allergen",
            "peanut",
            "--allergen",
            "sesame",
            "--pretty",
        ]);
        let Command::Plan(args) = cli.command else {
            panic!("expected plan subcommand");
        };
        assert!(args.pretty);
        let overrides = args.source.overrides();
        assert_eq!(overrides.attendees, Some(3));
        assert_eq!(overrides.allergens, Some(vec!["peanut".to_string(), "sesame".to_string()]));
        assert_eq!(overrides.diet, None);
    }

    #[test]
    fn test_context_and_snapshot_conflict() {
        let result = Cli::try_parse_from([
            "pantry-planner",
            "rank",
            "--context",
            "ctx.json",
            "--snapshot",
            "snap.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from([
            "pantry-planner",
            "rank",
            "--snapshot",
            "snap.json",
            "--date",
            "2024-06-10",
            "--config",
            "planner.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("planner.toml")));
        let Command::Rank(args) = cli.command else {
            panic!("expected rank subcommand");
        };
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 6, 10));
    }
}
