//! Inventory reconciliation for produced plans.
//!
//! Whatever generated a plan, its usage, shortfalls and macros are re-derived
//! here against the context inventory. Each candidate draws from its own
//! clone of the stock buckets: only one candidate will be cooked, so they
//! never compete for stock.

pub mod nutrition;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{
    Settings, COUNT_MASS_EQUIVALENT_G, MACRO_DIVERGENCE_THRESHOLD, SHORTFALL_EPSILON,
};
use crate::models::{
    InventoryDelta, InventoryItem, Plan, PlanCandidate, PlanningContext, ShoppingShortfall,
    ShortfallReason,
};
use crate::planner::matching::{build_inventory_index, normalize_name, InventoryIndex};
use crate::units::{self, Measure, UnitDomain};

use nutrition::{estimate_macros, macro_divergence};

pub const ESTIMATED_MACROS_NOTE: &str = "Estimated macros from ingredient totals";
pub const ADJUSTED_MACROS_NOTE: &str = "Adjusted macros to match ingredient totals";

/// Stock for one inventory id, split by canonical domain.
#[derive(Debug, Clone, Default, PartialEq)]
struct StockBuckets {
    grams: f64,
    milliliters: f64,
    count: f64,
    /// Set when the item's unit string was not recognized.
    unrecognized_note: Option<String>,
}

impl StockBuckets {
    fn slot(&mut self, domain: UnitDomain) -> &mut f64 {
        match domain {
            UnitDomain::Grams => &mut self.grams,
            UnitDomain::Milliliters => &mut self.milliliters,
            UnitDomain::Count => &mut self.count,
        }
    }
}

type StockLedger = IndexMap<u64, StockBuckets>;

/// Convert every inventory item once into per-id buckets.
///
/// Non-positive quantities count as no stock; the id stays known so a
/// requirement for it reads as insufficient stock rather than missing.
fn build_ledger(inventory: &[InventoryItem]) -> StockLedger {
    let mut ledger = StockLedger::new();
    for item in inventory {
        let buckets = ledger.entry(item.id).or_default();
        if !(item.quantity.is_finite() && item.quantity > 0.0) {
            continue;
        }
        let conversion = units::convert(item.quantity, &item.unit);
        if !conversion.recognized {
            warn!(item = %item.name, unit = %item.unit, "unrecognized unit, treating as count");
            buckets.unrecognized_note = Some(format!(
                "Unrecognized unit '{}' for inventory item '{}'; treated as count",
                item.unit, item.name
            ));
        }
        *buckets.slot(conversion.measure.domain) += conversion.measure.value;
    }
    ledger
}

fn log_shortfall(name: &str, missing: Measure, reason: ShortfallReason) {
    debug!(
        ingredient = name,
        missing = %format!("{:.1}{}", missing.value, missing.domain.suffix()),
        reason = reason.as_str(),
        "shortfall"
    );
}

fn push_unique(diagnostics: &mut Vec<String>, note: String) {
    if !diagnostics.contains(&note) {
        diagnostics.push(note);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryReconciler {
    divergence_threshold: f64,
    count_mass_g: f64,
}

impl Default for InventoryReconciler {
    fn default() -> Self {
        Self::new(MACRO_DIVERGENCE_THRESHOLD, COUNT_MASS_EQUIVALENT_G)
    }
}

impl InventoryReconciler {
    pub fn new(divergence_threshold: f64, count_mass_g: f64) -> Self {
        Self { divergence_threshold, count_mass_g }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.macro_divergence_threshold, settings.count_mass_equivalent_g)
    }

    /// Produce a normalized copy of `plan`; the input is left untouched.
    ///
    /// Reconciling always starts from the context inventory, so running it
    /// twice yields the same deltas, shortfalls and macros.
    pub fn reconcile(&self, context: &PlanningContext, plan: &Plan) -> Plan {
        let ledger = build_ledger(&context.inventory);
        let names = build_inventory_index(&context.inventory);

        let candidates: Vec<PlanCandidate> = plan
            .candidates
            .par_iter()
            .map(|candidate| self.reconcile_candidate(candidate, &ledger, &names))
            .collect();

        info!(
            date = %plan.date,
            candidates = candidates.len(),
            inventory_items = ledger.len(),
            "reconciled plan"
        );
        Plan { date: plan.date, candidates }
    }

    fn reconcile_candidate(
        &self,
        candidate: &PlanCandidate,
        ledger: &StockLedger,
        names: &InventoryIndex<'_>,
    ) -> PlanCandidate {
        let mut stock = ledger.clone();
        let mut requirements = candidate.ingredients_required.clone();
        let mut deltas = Vec::new();
        let mut shortfalls = Vec::new();
        let mut diagnostics: Vec<String> = Vec::new();
        for note in &candidate.diagnostics {
            push_unique(&mut diagnostics, note.clone());
        }

        for requirement in requirements.iter_mut() {
            let Some(needed) = requirement.needed() else {
                continue;
            };

            let resolved_id = requirement
                .ingredient_id
                .filter(|id| stock.contains_key(id))
                .or_else(|| names.resolve(&normalize_name(&requirement.name)).map(|item| item.id));

            let Some(id) = resolved_id else {
                if !requirement.optional {
                    log_shortfall(&requirement.name, needed, ShortfallReason::NotInInventory);
                    shortfalls.push(ShoppingShortfall::new(
                        requirement.ingredient_id,
                        requirement.name.clone(),
                        needed,
                        ShortfallReason::NotInInventory,
                    ));
                }
                continue;
            };
            requirement.ingredient_id = Some(id);

            let Some(buckets) = stock.get_mut(&id) else {
                continue;
            };
            if let Some(note) = &buckets.unrecognized_note {
                push_unique(&mut diagnostics, note.clone());
            }

            let available = buckets.slot(needed.domain);
            let use_amount = needed.value.min(*available).max(0.0);
            if use_amount > 0.0 {
                *available -= use_amount;
                deltas.push(InventoryDelta::new(id, Measure::new(needed.domain, use_amount)));
            }

            let residual = needed.value - use_amount;
            if residual > SHORTFALL_EPSILON {
                let missing = Measure::new(needed.domain, residual);
                log_shortfall(&requirement.name, missing, ShortfallReason::InsufficientStock);
                shortfalls.push(ShoppingShortfall::new(
                    Some(id),
                    requirement.name.clone(),
                    missing,
                    ShortfallReason::InsufficientStock,
                ));
            }
        }

        let servings = candidate.servings.unwrap_or(1);
        let estimated = estimate_macros(&requirements, servings, self.count_mass_g);
        let macros = match &candidate.macros_per_serving {
            None => {
                push_unique(&mut diagnostics, ESTIMATED_MACROS_NOTE.to_string());
                estimated
            }
            Some(stated) => {
                let divergence = macro_divergence(stated, &estimated);
                if divergence > self.divergence_threshold {
                    debug!(candidate = %candidate.title, divergence, "replacing stated macros");
                    push_unique(&mut diagnostics, ADJUSTED_MACROS_NOTE.to_string());
                    estimated
                } else {
                    stated.clone()
                }
            }
        };

        PlanCandidate {
            title: candidate.title.clone(),
            estimated_minutes: candidate.estimated_minutes,
            servings: candidate.servings,
            steps: candidate.steps.clone(),
            ingredients_required: requirements,
            inventory_deltas: deltas,
            shopping_shortfall: shortfalls,
            macros_per_serving: Some(macros),
            diagnostics,
        }
    }
}

/// Reconcile with the default thresholds.
pub fn reconcile(context: &PlanningContext, plan: &Plan) -> Plan {
    InventoryReconciler::default().reconcile(context, plan)
}
