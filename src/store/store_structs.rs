use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::score_space::ScoreSet;

/// Aggregate counters over the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TotalStats {
    pub total_item_number: usize,
    pub total_rated_item_number: usize,
    pub total_sum_number: usize
}

/// Per-item rating record. A `global_average` of 0.0 is the sentinel for
/// "never rated"; every non-zero value is unique across the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ItemRecord {
    pub global_average: f64,
    pub classical_average: f64,
    pub deviation: f64,
    pub current_index: i32,
    pub sums: Vec<i32>
}

impl ItemRecord {
    pub fn is_rated(&self) -> bool {
        self.global_average != 0.0
    }
}

/// The authoritative mapping from item id to rating record. Serializes to
/// the persisted/query JSON document verbatim; item order is insertion
/// order, so repeated writes keep a stable layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RatingStore {
    pub total_stats: TotalStats,
    pub items: IndexMap<String, ItemRecord>
}

impl RatingStore {
    /// A fresh store holding one zeroed record per catalog item.
    pub fn from_catalog(item_ids: &[String]) -> RatingStore {
        let mut store = RatingStore::default();
        store.sync_catalog(item_ids);
        store
    }

    /// Adds zeroed records for catalog ids the store has not seen yet.
    /// Existing records are never overwritten and never removed. Returns
    /// the number of records added.
    pub fn sync_catalog(&mut self, item_ids: &[String]) -> usize {
        let mut added = 0;
        for id in item_ids {
            if !self.items.contains_key(id) {
                self.items.insert(id.clone(), ItemRecord::default());
                added += 1;
            }
        }

        self.total_stats.total_item_number = self.items.len();
        added
    }

    /// The scores of every rated item except `exclude`. Excluding the item
    /// under update frees its previous slot for reallocation.
    pub fn occupied_scores(&self, exclude: &str) -> ScoreSet {
        self.items
            .iter()
            .filter(|(id, record)| id.as_str() != exclude && record.is_rated())
            .map(|(_, record)| record.global_average)
            .collect()
    }

    /// Recomputes the aggregate counters from the item records.
    pub fn recompute_stats(&mut self) {
        self.total_stats.total_item_number = self.items.len();
        self.total_stats.total_sum_number = self.items.values().map(|r| r.sums.len()).sum();
        self.total_stats.total_rated_item_number = self.items.values().filter(|r| r.is_rated()).count();
    }
}
