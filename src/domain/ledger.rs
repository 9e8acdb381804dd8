//! Interaction ledger - per-item counters and per-zone gaze tallies
//!
//! Items are kept in first-reference order; that order is the tie-break for
//! placement ranking, so lookups go through an index map instead of reordering.

use crate::domain::types::{Item, StockLevel};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct InteractionLedger {
    items: Vec<Item>,
    index: FxHashMap<String, usize>,
    gaze: FxHashMap<String, u64>,
}

impl InteractionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the item, creating a zero-valued entry on first reference
    pub fn get_or_create(&mut self, item_id: &str) -> &mut Item {
        let idx = match self.index.get(item_id) {
            Some(&idx) => idx,
            None => {
                let idx = self.items.len();
                self.items.push(Item::new(item_id));
                self.index.insert(item_id.to_string(), idx);
                idx
            }
        };
        &mut self.items[idx]
    }

    /// Insert a fully-formed item (state reload); replaces an existing entry in place
    pub fn insert(&mut self, item: Item) {
        match self.index.get(&item.id) {
            Some(&idx) => self.items[idx] = item,
            None => {
                self.index.insert(item.id.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    pub fn get(&self, item_id: &str) -> Option<&Item> {
        self.index.get(item_id).map(|&idx| &self.items[idx])
    }

    /// Items in first-reference order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Increment a zone's tally and return the new count
    pub fn increment_gaze(&mut self, zone: &str) -> u64 {
        let count = self.gaze.entry(zone.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn set_gaze(&mut self, zone: &str, count: u64) {
        self.gaze.insert(zone.to_string(), count);
    }

    /// Tally for a zone; zero if never referenced
    pub fn gaze(&self, zone: &str) -> u64 {
        self.gaze.get(zone).copied().unwrap_or(0)
    }

    pub fn stock_levels(&self) -> Vec<StockLevel> {
        self.items
            .iter()
            .map(|item| StockLevel { item_id: item.id.clone(), stock: item.current_stock })
            .collect()
    }

    /// Items whose stock is at or below `threshold`, in first-reference order
    pub fn low_stock(&self, threshold: i64) -> Vec<StockLevel> {
        self.items
            .iter()
            .filter(|item| item.current_stock <= threshold)
            .map(|item| StockLevel { item_id: item.id.clone(), stock: item.current_stock })
            .collect()
    }
}
