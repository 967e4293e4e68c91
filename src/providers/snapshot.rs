use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{PlannerError, Result};
use crate::models::{InventoryItem, LeftoverItem, Preferences, RecentMeal};
use crate::providers::{InventoryProvider, LeftoverProvider, MealHistoryProvider, PreferencesProvider};

const ID_COL: &str = "id";
const NAME_COL: &str = "name";
const QTY_COL: &str = "qty";
const UNIT_COL: &str = "unit";
const BEST_BEFORE_COL: &str = "best_before";

/// Household state captured in one JSON document; serves every provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStore {
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub leftovers: Vec<LeftoverItem>,
    #[serde(default, alias = "recent_meals")]
    pub meals: Vec<RecentMeal>,
    #[serde(default, alias = "prefs")]
    pub preferences: Preferences,
}

impl SnapshotStore {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&content)?;
        debug!(path = %path.display(), items = store.inventory.len(), "loaded snapshot");
        Ok(store)
    }
}

impl InventoryProvider for SnapshotStore {
    fn inventory(&self) -> Result<Vec<InventoryItem>> {
        Ok(self.inventory.clone())
    }
}

impl LeftoverProvider for SnapshotStore {
    fn leftovers(&self) -> Result<Vec<LeftoverItem>> {
        Ok(self.leftovers.clone())
    }
}

impl MealHistoryProvider for SnapshotStore {
    fn recent_meals(&self, limit: usize) -> Result<Vec<RecentMeal>> {
        let mut meals = self.meals.clone();
        meals.sort_by(|a, b| b.date.cmp(&a.date));
        meals.truncate(limit);
        Ok(meals)
    }
}

impl PreferencesProvider for SnapshotStore {
    fn preferences(&self) -> Result<Preferences> {
        Ok(self.preferences.clone())
    }
}

fn column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|name| h.trim().eq_ignore_ascii_case(name)))
        .ok_or_else(|| PlannerError::InvalidInput(format!("Column '{}' not found", names[0])))
}

/// Read inventory rows with `id,name,qty,unit,best_before` columns.
///
/// Rows with a blank name or an unparseable id are skipped. A quantity that
/// does not parse reads as 0 and a bad date as no date.
pub fn load_inventory_csv(csv_path: &Path) -> Result<Vec<InventoryItem>> {
    let file = std::fs::File::open(csv_path)?;
    let mut rdr = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(file);

    let headers = rdr.headers()?.clone();
    let id_idx = column(&headers, &[ID_COL])?;
    let name_idx = column(&headers, &[NAME_COL])?;
    let qty_idx = column(&headers, &[QTY_COL, "quantity"])?;
    let unit_idx = column(&headers, &[UNIT_COL]).ok();
    let best_before_idx = column(&headers, &[BEST_BEFORE_COL]).ok();

    let mut items = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result?;

        let name = record.get(name_idx).unwrap_or_default().trim().to_string();
        if name.is_empty() {
            continue;
        }
        let Some(id) = record.get(id_idx).and_then(|s| s.trim().parse::<u64>().ok()) else {
            warn!(row = row_index + 1, name = %name, "skipping inventory row without a numeric id");
            continue;
        };

        items.push(InventoryItem {
            id,
            name,
            quantity: record
                .get(qty_idx)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|q| q.is_finite())
                .unwrap_or(0.0),
            unit: unit_idx
                .and_then(|idx| record.get(idx))
                .unwrap_or_default()
                .trim()
                .to_string(),
            best_before: best_before_idx
                .and_then(|idx| record.get(idx))
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()),
        });
    }

    debug!(path = %csv_path.display(), items = items.len(), "loaded inventory csv");
    Ok(items)
}
