use std::collections::HashMap;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::Value;
use strum_macros::Display;
use tracing::debug;

use crate::{
    api::api_structs::RatingSubmission,
    model::{
        allocator,
        constants::{RATING_MAX, RATING_MIN},
        score_space, weighting
    },
    store::{
        json_store::{JsonStore, StoreError},
        store_structs::{RatingStore, TotalStats}
    },
    utils::progress_utils::progress_bar
};

/// Why a batch entry was discarded. Skips never abort the batch; they are
/// counted per reason in the [`BatchSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SkipReason {
    /// The entry is missing `index` or `image`, or is not an object at all
    MissingField,
    /// The rating is not a whole number in [1, 10]
    InvalidRating,
    /// The item id is absent from the store even after catalog sync
    UnknownItem
}

/// Outcome of one applied batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub applied: usize,
    pub discarded: HashMap<SkipReason, usize>,
    pub total_stats: TotalStats
}

impl BatchSummary {
    pub fn discarded_total(&self) -> usize {
        self.discarded.values().sum()
    }
}

/// Batch ingestion front of the engine: validates each entry, folds the
/// rating into the item's history, and reallocates the item's unique slot
/// against every other item's score, all inside the store's exclusive gate.
pub struct RatingAggregator {
    store: JsonStore
}

impl RatingAggregator {
    pub fn new(store: JsonStore) -> RatingAggregator {
        RatingAggregator { store }
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// Applies a batch with an entropy-seeded random source.
    pub async fn apply_batch(&self, entries: &[Value]) -> Result<BatchSummary, StoreError> {
        self.apply_batch_with_rng(entries, &mut StdRng::from_os_rng()).await
    }

    /// Applies a batch with a caller-supplied random source, so tests can
    /// reproduce the allocator's search exactly.
    pub async fn apply_batch_with_rng<R: Rng>(
        &self,
        entries: &[Value],
        rng: &mut R
    ) -> Result<BatchSummary, StoreError> {
        self.store
            .with_exclusive_access(|store| Self::apply_entries(store, entries, rng))
            .await
    }

    fn apply_entries<R: Rng>(store: &mut RatingStore, entries: &[Value], rng: &mut R) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let bar = progress_bar(entries.len() as u64, "Applying ratings");

        for entry in entries {
            let submission = RatingSubmission::from_value(entry);
            match Self::apply_entry(store, &submission, rng) {
                Ok(()) => summary.applied += 1,
                Err(reason) => {
                    debug!(%reason, "discarding batch entry");
                    *summary.discarded.entry(reason).or_insert(0) += 1;
                }
            }

            bar.inc(1);
        }
        bar.finish_and_clear();

        store.recompute_stats();
        summary.total_stats = store.total_stats.clone();
        summary
    }

    fn apply_entry<R: Rng>(
        store: &mut RatingStore,
        submission: &RatingSubmission,
        rng: &mut R
    ) -> Result<(), SkipReason> {
        let (item_id, rating) = Self::validate(store, submission)?;

        // Other items' scores only; the item's previous slot is freed here
        let occupied = store.occupied_scores(item_id);

        let record = match store.items.get_mut(item_id) {
            Some(record) => record,
            None => return Err(SkipReason::UnknownItem)
        };

        record.sums.push(rating);
        let target = weighting::weighted_target(&record.sums);
        let assigned = allocator::find_unique_score(target, &occupied, rng);

        record.global_average = assigned;
        record.classical_average = score_space::round_score(weighting::classical_average(&record.sums));
        record.current_index = rating;
        record.deviation = normalize_zero(score_space::round_score(assigned - target));

        Ok(())
    }

    fn validate<'a>(
        store: &RatingStore,
        submission: &'a RatingSubmission
    ) -> Result<(&'a str, i32), SkipReason> {
        let (index, image) = match (&submission.index, &submission.image) {
            (Some(index), Some(image)) => (index, image),
            _ => return Err(SkipReason::MissingField)
        };

        let item_id = image.as_str().ok_or(SkipReason::MissingField)?;
        let rating = integral_rating(index).ok_or(SkipReason::InvalidRating)?;

        if !store.items.contains_key(item_id) {
            return Err(SkipReason::UnknownItem);
        }

        Ok((item_id, rating))
    }
}

/// Accepts only whole JSON numbers on the rating scale; 7.0 passes, 7.5
/// and "7" do not.
fn integral_rating(value: &Value) -> Option<i32> {
    let number = value.as_f64()?;
    if number.fract() != 0.0 {
        return None;
    }

    let rating = number as i32;
    (RATING_MIN..=RATING_MAX).contains(&rating).then_some(rating)
}

/// `round(0.0 - x)` can leave a negative zero behind; the stored deviation
/// is always the positive one.
fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}
