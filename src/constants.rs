// src/constants.rs

// --- Engagement Gate ---
pub const FRAUD_THRESHOLD_SECONDS: u64 = 30;
pub const SECONDS_PER_MINUTE: f64 = 60.0;

// --- Time-Multiplier Buckets (upper bound in minutes, inclusive) ---
pub const BUCKET_TOO_FAST_MAX_MINUTES: f64 = 2.0;
pub const BUCKET_EFFICIENT_MAX_MINUTES: f64 = 5.0;
pub const BUCKET_IDEAL_MAX_MINUTES: f64 = 10.0;
pub const BUCKET_NORMAL_MAX_MINUTES: f64 = 20.0;

pub const MULTIPLIER_TOO_FAST: f64 = 0.3;
pub const MULTIPLIER_EFFICIENT: f64 = 1.5;
pub const MULTIPLIER_IDEAL: f64 = 1.2;
pub const MULTIPLIER_NORMAL: f64 = 1.0;
pub const MULTIPLIER_TOO_SLOW: f64 = 0.6;

// --- Review Quality Bonus ---
pub const QUALITY_HIGH_MIN_RATING: u8 = 4;
pub const QUALITY_HIGH_MIN_LENGTH: usize = 500;
pub const QUALITY_HIGH_BONUS: f64 = 0.3;
pub const QUALITY_LOW_MIN_RATING: u8 = 3;
pub const QUALITY_LOW_MIN_LENGTH: usize = 400;
pub const QUALITY_LOW_BONUS: f64 = 0.1;

pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;
pub const MIN_REVIEW_LENGTH: usize = 300;

// --- Points Accumulation ---
pub const TIME_BONUS_IDEAL_MIN_MINUTES: f64 = 3.0;
pub const TIME_BONUS_IDEAL_MAX_MINUTES: f64 = 8.0;
pub const TIME_BONUS_IDEAL_POINTS: u32 = 10;
pub const TIME_BONUS_FAIR_MIN_MINUTES: f64 = 1.0;
pub const TIME_BONUS_FAIR_MAX_MINUTES: f64 = 15.0;
pub const TIME_BONUS_FAIR_POINTS: u32 = 5;

pub const POINTS_SCALING_K: f64 = 5.0; // Was 15 in earlier content
pub const MIN_PAYOUT: f64 = 0.10;

// --- Quiz Flow ---
pub const MAX_COMPREHENSION_ATTEMPTS: u32 = 3;

// --- Achievements ---
pub const DEDICATED_READER_BOOKS: usize = 10;
pub const SPEED_OF_LIGHT_MAX_SECONDS: u64 = 300; // Exclusive
pub const PERFECTIONIST_MIN_AVERAGE_RATING: f64 = 4.5;
pub const PERFECTIONIST_MIN_BOOKS: usize = 3;
