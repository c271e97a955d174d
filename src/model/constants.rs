// Score space constants
pub const SCORE_MIN: f64 = 1.0;
pub const SCORE_MAX: f64 = 10.0;
pub const MAX_PRECISION: u32 = 4;
// 4-decimal values between 1.0000 and 10.0000
pub const SLOT_COUNT: usize = 90_000;

// Accepted rating scale
pub const RATING_MIN: i32 = 1;
pub const RATING_MAX: i32 = 10;

// Recency weighting: the prior average keeps 80% influence, the newest
// rating always contributes the remaining 20%
pub const HISTORY_WEIGHT: f64 = 0.8;
pub const RATING_WEIGHT: f64 = 0.2;

// Half-width of the allocator's candidate neighborhood at every precision
pub const NEIGHBOR_STEPS: i32 = 5;
