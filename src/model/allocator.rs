use itertools::Itertools;
use rand::{seq::SliceRandom, Rng};
use tracing::warn;

use crate::model::{
    constants::{MAX_PRECISION, NEIGHBOR_STEPS, SLOT_COUNT},
    score_space::{in_bounds, round_score, round_to, slot_key, ScoreSet}
};

/// # How a slot is found
///
/// The exact target (rounded to 4 decimals) wins when it is free. After
/// that the search runs in precision rounds, coarse to fine:
///
/// - Round 1 tries the ±5 steps of 0.1 around the target, shuffled. Only
///     these bases, no sub-expansion.
/// - Rounds 2 to 4 expand every surviving base by ±5 steps at the round's
///     step size (0.01, 0.001, 0.0001), pool the expansions with the bases,
///     deduplicate, shuffle, and try everything. An exhausted round's pool
///     becomes the next round's bases.
/// - If all rounds exhaust, a systematic walk alternates target ± k·0.0001
///     until a free slot turns up.
///
/// Shuffling keeps collision placement unpredictable and visually scattered
/// while still preferring coarse, close-to-target values. The caller owns
/// the random source, so a seeded generator reproduces the full search.
///
/// The returned value is always inside [1.0, 10.0] and never in `occupied`,
/// with one exception: when every one of the 90,000 slots is taken the
/// rounded target is returned as-is and a data-integrity warning is logged.
/// The store keeps operating with a duplicate rather than crashing.
pub fn find_unique_score<R: Rng + ?Sized>(target: f64, occupied: &ScoreSet, rng: &mut R) -> f64 {
    let exact = round_score(target);
    if !occupied.contains(exact) {
        return exact;
    }

    // Round 1 bases: one decimal place, regardless of the target's own
    // precision
    let mut bases = neighborhood(target, 1);
    bases.shuffle(rng);

    for precision in 1..=MAX_PRECISION {
        let step = 10f64.powi(-(precision as i32));

        let mut candidates: Vec<f64> = Vec::new();
        for &base in &bases {
            push_if_in_bounds(&mut candidates, round_to(base, precision));

            // Round 1 tries the bases alone; later rounds widen each base
            if precision > 1 {
                for i in 1..=NEIGHBOR_STEPS {
                    let offset = i as f64 * step;
                    push_if_in_bounds(&mut candidates, round_to(base + offset, precision));
                    push_if_in_bounds(&mut candidates, round_to(base - offset, precision));
                }
            }
        }

        let mut candidates: Vec<f64> = candidates.into_iter().unique_by(|v| slot_key(*v)).collect();
        candidates.shuffle(rng);

        for &candidate in &candidates {
            if !occupied.contains(candidate) {
                return candidate;
            }
        }

        // Everything at this precision is taken; refine the bases one digit
        // and go around again
        if precision < MAX_PRECISION {
            bases = expand_bases(&bases, precision + 1);
            bases.shuffle(rng);
        }
    }

    // Systematic fallback: walk outward from the target in 0.0001 steps,
    // alternating above and below, staying as close as possible
    for k in 1..=SLOT_COUNT as i64 {
        let offset = k as f64 * 1e-4;

        let up = round_score(target + offset);
        if in_bounds(up) && !occupied.contains(up) {
            return up;
        }

        let down = round_score(target - offset);
        if in_bounds(down) && !occupied.contains(down) {
            return down;
        }
    }

    // Unreachable while fewer than 90,000 items hold scores
    warn!(
        score_target = target,
        occupied = occupied.len(),
        "no free slot in the entire score space, assigning a duplicate"
    );
    round_score(target)
}

/// The ±5-step neighborhood of `center` at the given precision, clipped to
/// the score domain.
fn neighborhood(center: f64, precision: u32) -> Vec<f64> {
    let step = 10f64.powi(-(precision as i32));
    let mut values = Vec::new();

    for i in -NEIGHBOR_STEPS..=NEIGHBOR_STEPS {
        let value = round_to(center + i as f64 * step, precision);
        if in_bounds(value) {
            values.push(value);
        }
    }

    values
}

/// Widens every base into its neighborhood at the next precision and
/// deduplicates the pool.
fn expand_bases(bases: &[f64], precision: u32) -> Vec<f64> {
    bases
        .iter()
        .flat_map(|&base| neighborhood(base, precision))
        .unique_by(|v| slot_key(*v))
        .collect()
}

fn push_if_in_bounds(candidates: &mut Vec<f64>, value: f64) {
    if in_bounds(value) {
        candidates.push(value);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::model::constants::{SCORE_MAX, SCORE_MIN};

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_free_target_returned_exactly() {
        let occupied = ScoreSet::new();
        assert_abs_diff_eq!(find_unique_score(7.6, &occupied, &mut rng()), 7.6);
    }

    #[test]
    fn test_target_rounded_to_four_decimals() {
        let occupied = ScoreSet::new();
        assert_abs_diff_eq!(find_unique_score(7.64449, &occupied, &mut rng()), 7.6445);
    }

    #[test]
    fn test_collision_resolved_at_one_decimal_first() {
        let occupied: ScoreSet = [5.5].into_iter().collect();
        let assigned = find_unique_score(5.5, &occupied, &mut rng());

        // Round 1 candidates are the 1-decimal neighbors within ±0.5
        assert!(!occupied.contains(assigned));
        assert_eq!(slot_key(assigned) % 1000, 0, "expected a 1-decimal value, got {assigned}");
        assert!((assigned - 5.5).abs() <= 0.5 + 1e-9);
    }

    #[test]
    fn test_never_returns_occupied_value() {
        let mut rng = rng();
        let mut occupied = ScoreSet::new();

        // Hammer the same target; every allocation must land on a new slot
        for _ in 0..500 {
            let assigned = find_unique_score(5.0, &occupied, &mut rng);
            assert!(!occupied.contains(assigned), "allocator returned an occupied slot");
            assert!(in_bounds(assigned));
            occupied.insert(assigned);
        }

        assert_eq!(occupied.len(), 500);
    }

    #[test]
    fn test_domain_clipped_near_lower_bound() {
        let mut rng = rng();
        let mut occupied = ScoreSet::new();

        for _ in 0..200 {
            let assigned = find_unique_score(1.0, &occupied, &mut rng);
            assert!(assigned >= SCORE_MIN && assigned <= SCORE_MAX);
            occupied.insert(assigned);
        }
    }

    #[test]
    fn test_domain_clipped_near_upper_bound() {
        let mut rng = rng();
        let mut occupied = ScoreSet::new();

        for _ in 0..200 {
            let assigned = find_unique_score(10.0, &occupied, &mut rng);
            assert!(assigned >= SCORE_MIN && assigned <= SCORE_MAX);
            occupied.insert(assigned);
        }
    }

    #[test]
    fn test_same_seed_reproduces_the_search() {
        let occupied: ScoreSet = [5.5, 5.4, 5.6].into_iter().collect();

        let first = find_unique_score(5.5, &occupied, &mut rng());
        let second = find_unique_score(5.5, &occupied, &mut rng());

        assert_abs_diff_eq!(first, second);
    }

    #[test]
    fn test_exhaustive_fallback_finds_the_last_slot() {
        // Occupy all 90,000 slots except 9.1234
        let free_key = slot_key(9.1234);
        let mut occupied = ScoreSet::new();
        for key in 10_000..=100_000 {
            if key != free_key {
                occupied.insert(key as f64 / 10_000.0);
            }
        }

        let assigned = find_unique_score(2.0, &occupied, &mut rng());
        assert_abs_diff_eq!(assigned, 9.1234);
    }

    #[test]
    fn test_full_space_degrades_to_duplicate() {
        let mut occupied = ScoreSet::new();
        for key in 10_000..=100_000 {
            occupied.insert(key as f64 / 10_000.0);
        }

        // Logged as a warning, not a panic; the rounded target comes back
        let assigned = find_unique_score(3.3333, &occupied, &mut rng());
        assert_abs_diff_eq!(assigned, 3.3333);
    }

    #[test]
    fn test_neighborhood_clips_to_domain() {
        let around_min = neighborhood(1.0, 1);
        assert_eq!(around_min.len(), 6); // 1.0 through 1.5
        assert!(around_min.iter().all(|&v| v >= SCORE_MIN));

        let around_mid = neighborhood(2.0, 1);
        assert_eq!(around_mid.len(), 11); // 1.5 through 2.5
    }

    #[test]
    fn test_expand_bases_deduplicates() {
        // 5.0 and 5.01 share most of their 0.01-step neighborhoods
        let expanded = expand_bases(&[5.0, 5.01], 2);
        let keys: std::collections::HashSet<i64> = expanded.iter().map(|&v| slot_key(v)).collect();
        assert_eq!(expanded.len(), keys.len());
    }
}
