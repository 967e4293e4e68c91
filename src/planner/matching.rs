//! Name normalization and loose name lookup shared by the rules, the
//! candidate builder and the reconciler.

use indexmap::IndexMap;

use crate::models::{InventoryItem, LeftoverItem};
use crate::units::{self, UnitDomain};

/// Lowercase and collapse whitespace.
pub fn normalize_name(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Stock of `item` comparable with a recipe's gram amounts.
///
/// Weight units are converted to grams; volume and count stock is read as
/// its raw quantity. Non-positive or non-finite stock is zero.
pub fn available_grams(item: &InventoryItem) -> f64 {
    if !(item.quantity.is_finite() && item.quantity > 0.0) {
        return 0.0;
    }
    let conversion = units::convert(item.quantity, &item.unit);
    match conversion.measure.domain {
        UnitDomain::Grams => conversion.measure.value,
        UnitDomain::Milliliters | UnitDomain::Count => item.quantity,
    }
}

/// Items keyed by normalized name, in first-seen order.
///
/// A later item with the same normalized name replaces the earlier one but
/// keeps its position; substring resolution walks this order, so it has to
/// be stable for results to be deterministic. Items with a blank name are
/// left out: an empty key is a substring of every query.
#[derive(Debug, Clone)]
pub struct NameIndex<'a, T> {
    entries: IndexMap<String, &'a T>,
}

impl<'a, T> NameIndex<'a, T> {
    pub fn build<I, F>(items: I, name_of: F) -> Self
    where
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> &str,
    {
        let mut entries = IndexMap::new();
        for item in items {
            let key = normalize_name(name_of(item));
            if key.is_empty() {
                continue;
            }
            entries.insert(key, item);
        }
        Self { entries }
    }

    /// Exact match first, then the first key that contains `normalized` or
    /// is contained in it.
    ///
    /// This is a loose heuristic: short names can hit longer unrelated ones
    /// ("pea" resolves to "peanut butter").
    pub fn resolve(&self, normalized: &str) -> Option<&'a T> {
        if let Some(item) = self.entries.get(normalized) {
            return Some(*item);
        }
        if normalized.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(key, _)| key.contains(normalized) || normalized.contains(key.as_str()))
            .map(|(_, item)| *item)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub type InventoryIndex<'a> = NameIndex<'a, InventoryItem>;
pub type LeftoverIndex<'a> = NameIndex<'a, LeftoverItem>;

pub fn build_inventory_index(inventory: &[InventoryItem]) -> InventoryIndex<'_> {
    NameIndex::build(inventory, |item| item.name.as_str())
}

pub fn build_leftover_index(leftovers: &[LeftoverItem]) -> LeftoverIndex<'_> {
    NameIndex::build(leftovers, |item| item.name.as_str())
}
