use anyhow::{Context, Result};
use pantry_planner::catalog::RecipeCatalog;
use pantry_planner::cli::{parse_args, Command, ContextArgs};
use pantry_planner::config::Settings;
use pantry_planner::logging::init_logging;
use pantry_planner::models::{Plan, PlanningContext};
use pantry_planner::planner::MealPlanner;
use pantry_planner::providers::{load_inventory_csv, ContextAssembler, SnapshotStore};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tokio::fs;
use tracing::info;

async fn read_file(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {} file '{}'", what, path.display()))
}

/// Build the planning context from either a context file or a snapshot.
async fn load_context(args: &ContextArgs, settings: &Settings) -> Result<PlanningContext> {
    let overrides = args.overrides();
    let csv_inventory = match &args.inventory_csv {
        Some(path) => Some(
            load_inventory_csv(path)
                .with_context(|| format!("Failed to load inventory CSV '{}'", path.display()))?,
        ),
        None => None,
    };

    let context = if let Some(path) = &args.snapshot {
        let content = read_file(path, "snapshot").await?;
        let mut store = SnapshotStore::from_json_str(&content)
            .with_context(|| format!("Failed to parse snapshot '{}'", path.display()))?;
        if let Some(inventory) = csv_inventory {
            store.inventory = inventory;
        }
        let date = args.date.unwrap_or_else(|| chrono::Local::now().date_naive());
        ContextAssembler::new(&store, &store, &store, &store)
            .with_default_meal_limit(settings.recent_meal_limit)
            .assemble(date, &overrides)?
    } else {
        let path = args.context.as_deref().context("Either --context or --snapshot is required")?;
        let content = read_file(path, "context").await?;
        let mut context: PlanningContext = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse planning context '{}'", path.display()))?;
        if let Some(inventory) = csv_inventory {
            context.inventory = inventory;
        }
        overrides.apply_to(&mut context);
        context.validate()?;
        context
    };
    Ok(context)
}

fn load_catalog(args: &ContextArgs) -> Result<RecipeCatalog> {
    match &args.catalog {
        Some(path) => RecipeCatalog::from_json_file(path),
        None => Ok(RecipeCatalog::builtin()),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", rendered);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli_args = parse_args();
    let settings = Settings::load(cli_args.config.as_deref()).context("Failed to load settings")?;
    init_logging(&settings.log_level, settings.log_format);

    match &cli_args.command {
        Command::Plan(args) => {
            let context = load_context(&args.source, &settings).await?;
            let planner = MealPlanner::from_settings(load_catalog(&args.source)?, &settings);
            let plan = planner.generate_plan(&context);
            print_json(&plan, args.pretty)?;
        }
        Command::Rank(args) => {
            let context = load_context(args, &settings).await?;
            let planner = MealPlanner::from_settings(load_catalog(args)?, &settings);
            let ranked: Vec<_> = planner
                .rank_recipes(&context)
                .iter()
                .map(|evaluation| {
                    json!({
                        "title": evaluation.recipe.title,
                        "score": evaluation.score,
                        "rule_results": evaluation.rule_results,
                    })
                })
                .collect();
            info!(surviving = ranked.len(), catalog = planner.catalog().len(), "ranked recipes");
            print_json(&ranked, true)?;
        }
        Command::Reconcile(args) => {
            let context = load_context(&args.source, &settings).await?;
            let content = read_file(&args.plan, "plan").await?;
            let plan: Plan = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse plan '{}'", args.plan.display()))?;
            let planner = MealPlanner::from_settings(RecipeCatalog::default(), &settings);
            print_json(&planner.reconcile(&context, &plan), args.pretty)?;
        }
    }

    Ok(())
}
