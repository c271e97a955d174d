use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};

use crate::{
    model::{allocator, score_space},
    store::store_structs::RatingStore
};

/// Deterministic RNG so allocator behavior reproduces across test runs.
pub fn seeded_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

/// A store seeded with zeroed records for the given item ids.
pub fn generate_store(item_ids: &[&str]) -> RatingStore {
    let ids: Vec<String> = item_ids.iter().map(|id| id.to_string()).collect();
    RatingStore::from_catalog(&ids)
}

/// A store where every item already carries a history and a unique score,
/// allocated through the real allocator.
pub fn generate_rated_store(n_items: usize) -> RatingStore {
    let ids: Vec<String> = (0..n_items).map(|i| format!("item-{i:04}.png")).collect();
    let mut store = RatingStore::from_catalog(&ids);
    let mut rng = seeded_rng();

    for i in 0..n_items {
        let id = &ids[i];
        let rating = (i % 10 + 1) as i32;

        let occupied = store.occupied_scores(id);
        let assigned = allocator::find_unique_score(rating as f64, &occupied, &mut rng);

        let record = &mut store.items[id];
        record.sums = vec![rating];
        record.global_average = assigned;
        record.classical_average = rating as f64;
        record.current_index = rating;
        record.deviation = score_space::round_score(assigned - rating as f64);
    }

    store.recompute_stats();
    store
}

/// Raw batch entries in the wire shape, `{"index": .., "image": ..}`.
pub fn generate_batch(entries: &[(&str, i32)]) -> Vec<Value> {
    entries
        .iter()
        .map(|(item_id, rating)| json!({ "index": rating, "image": item_id }))
        .collect()
}

/// A catalog document with the nesting shape the picker tools emit.
pub fn generate_catalog(item_ids: &[&str]) -> Value {
    json!({
        "collection": {
            "items": item_ids
        }
    })
}

/// Panics if two rated items share a score slot.
pub fn assert_unique_scores(store: &RatingStore) {
    let mut seen = std::collections::HashSet::new();
    for (id, record) in &store.items {
        if record.is_rated() {
            assert!(
                seen.insert(score_space::slot_key(record.global_average)),
                "items share the score {} (second holder: {})",
                record.global_average,
                id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_rated_store_is_consistent() {
        let store = generate_rated_store(25);

        assert_eq!(store.total_stats.total_item_number, 25);
        assert_eq!(store.total_stats.total_rated_item_number, 25);
        assert_eq!(store.total_stats.total_sum_number, 25);
        assert_unique_scores(&store);
    }

    #[test]
    fn test_generate_batch_shape() {
        let batch = generate_batch(&[("a.png", 7)]);
        assert_eq!(batch, vec![json!({ "index": 7, "image": "a.png" })]);
    }

    #[test]
    fn test_seeded_rng_is_stable() {
        use rand::Rng;

        let a: u64 = seeded_rng().random();
        let b: u64 = seeded_rng().random();
        assert_eq!(a, b);
    }
}
