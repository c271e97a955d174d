use std::collections::HashSet;

use crate::model::constants::{MAX_PRECISION, SCORE_MAX, SCORE_MIN};

/// Canonical integer key of a score slot: the value scaled to 4 decimals.
/// Two floats address the same slot exactly when their keys are equal.
pub fn slot_key(value: f64) -> i64 {
    (value * 10_000.0).round() as i64
}

/// Rounds `value` to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Rounds to the finest representable precision of the score space.
pub fn round_score(value: f64) -> f64 {
    round_to(value, MAX_PRECISION)
}

/// Domain membership, judged on slot keys so float noise at the boundaries
/// cannot misclassify a value.
pub fn in_bounds(value: f64) -> bool {
    let key = slot_key(value);
    key >= slot_key(SCORE_MIN) && key <= slot_key(SCORE_MAX)
}

/// A set of occupied score slots, keyed at 4-decimal resolution.
#[derive(Debug, Clone, Default)]
pub struct ScoreSet {
    keys: HashSet<i64>
}

impl ScoreSet {
    pub fn new() -> ScoreSet {
        ScoreSet { keys: HashSet::new() }
    }

    /// Returns false if the slot was already present.
    pub fn insert(&mut self, value: f64) -> bool {
        self.keys.insert(slot_key(value))
    }

    pub fn contains(&self, value: f64) -> bool {
        self.keys.contains(&slot_key(value))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<f64> for ScoreSet {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> ScoreSet {
        let mut set = ScoreSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_round_to() {
        assert_abs_diff_eq!(round_to(7.55554, 4), 7.5555);
        assert_abs_diff_eq!(round_to(7.55555, 3), 7.556);
        assert_abs_diff_eq!(round_to(7.55, 1), 7.6);
        assert_abs_diff_eq!(round_to(1.04, 1), 1.0);
    }

    #[test]
    fn test_slot_key_resolution() {
        assert_eq!(slot_key(1.0), 10_000);
        assert_eq!(slot_key(10.0), 100_000);
        assert_eq!(slot_key(7.6001), 76_001);

        // Values closer than a half step share a slot
        assert_eq!(slot_key(7.60009), slot_key(7.6001));
        assert_ne!(slot_key(7.6001), slot_key(7.6002));
    }

    #[test]
    fn test_in_bounds() {
        assert!(in_bounds(1.0));
        assert!(in_bounds(10.0));
        assert!(in_bounds(5.4321));
        assert!(!in_bounds(0.9999));
        assert!(!in_bounds(10.0001));
    }

    #[test]
    fn test_in_bounds_survives_float_noise() {
        // 4-decimal rounding may leave representation error behind;
        // boundary values must still count as inside the domain.
        assert!(in_bounds(round_score(0.99999)));
        assert!(in_bounds(round_score(9.99995)));
    }

    #[test]
    fn test_score_set() {
        let mut set = ScoreSet::new();
        assert!(set.is_empty());

        assert!(set.insert(7.6));
        assert!(!set.insert(7.6));
        assert!(set.insert(7.6001));

        assert_eq!(set.len(), 2);
        assert!(set.contains(7.6));
        assert!(set.contains(7.60009));
        assert!(!set.contains(7.5999));
    }

    #[test]
    fn test_score_set_from_iter() {
        let set: ScoreSet = [1.5, 2.5, 2.5, 3.5].into_iter().collect();
        assert_eq!(set.len(), 3);
        assert!(set.contains(2.5));
    }
}
