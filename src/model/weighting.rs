use crate::model::constants::{HISTORY_WEIGHT, RATING_WEIGHT};

/// Plain arithmetic mean over the full history. Display only; the unique
/// score is derived from [`weighted_target`] instead.
pub fn classical_average(sums: &[i32]) -> f64 {
    if sums.is_empty() {
        return 0.0;
    }

    sums.iter().sum::<i32>() as f64 / sums.len() as f64
}

/// Recency-weighted target for the newest rating in `sums` (the history
/// *after* the rating was appended).
///
/// A plain mean goes numb as the history grows: with a thousand prior
/// ratings a new one barely moves it. Fixing the newest rating's share at
/// 20% keeps every rater's contribution meaningful regardless of item
/// popularity. The first-ever rating is the target itself.
pub fn weighted_target(sums: &[i32]) -> f64 {
    match sums {
        [] => 0.0,
        [only] => *only as f64,
        [.., newest] => {
            let newest = *newest as f64;
            let prior_sum = sums.iter().sum::<i32>() as f64 - newest;
            let prior_mean = prior_sum / (sums.len() - 1) as f64;

            prior_mean * HISTORY_WEIGHT + newest * RATING_WEIGHT
        }
    }
}
