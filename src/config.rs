// src/config.rs

use crate::constants::*;
use crate::error::StoreError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Minute-bucket table for the time-multiplier strategy.
/// Each `*_max_minutes` is an inclusive upper bound; anything past
/// `normal_max_minutes` falls into the slow bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketTable {
    pub too_fast_max_minutes: f64,
    pub efficient_max_minutes: f64,
    pub ideal_max_minutes: f64,
    pub normal_max_minutes: f64,
    pub too_fast: f64,
    pub efficient: f64,
    pub ideal: f64,
    pub normal: f64,
    pub too_slow: f64,
}

impl Default for BucketTable {
    fn default() -> Self {
        BucketTable {
            too_fast_max_minutes: BUCKET_TOO_FAST_MAX_MINUTES,
            efficient_max_minutes: BUCKET_EFFICIENT_MAX_MINUTES,
            ideal_max_minutes: BUCKET_IDEAL_MAX_MINUTES,
            normal_max_minutes: BUCKET_NORMAL_MAX_MINUTES,
            too_fast: MULTIPLIER_TOO_FAST,
            efficient: MULTIPLIER_EFFICIENT,
            ideal: MULTIPLIER_IDEAL,
            normal: MULTIPLIER_NORMAL,
            too_slow: MULTIPLIER_TOO_SLOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityRules {
    pub high_min_rating: u8,
    pub high_min_length: usize,
    pub high_bonus: f64,
    pub low_min_rating: u8,
    pub low_min_length: usize,
    pub low_bonus: f64,
}

impl Default for QualityRules {
    fn default() -> Self {
        QualityRules {
            high_min_rating: QUALITY_HIGH_MIN_RATING,
            high_min_length: QUALITY_HIGH_MIN_LENGTH,
            high_bonus: QUALITY_HIGH_BONUS,
            low_min_rating: QUALITY_LOW_MIN_RATING,
            low_min_length: QUALITY_LOW_MIN_LENGTH,
            low_bonus: QUALITY_LOW_BONUS,
        }
    }
}

/// Reading-time windows (inclusive, in minutes) for the points strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBonusRules {
    pub ideal_min_minutes: f64,
    pub ideal_max_minutes: f64,
    pub ideal_points: u32,
    pub fair_min_minutes: f64,
    pub fair_max_minutes: f64,
    pub fair_points: u32,
}

impl Default for TimeBonusRules {
    fn default() -> Self {
        TimeBonusRules {
            ideal_min_minutes: TIME_BONUS_IDEAL_MIN_MINUTES,
            ideal_max_minutes: TIME_BONUS_IDEAL_MAX_MINUTES,
            ideal_points: TIME_BONUS_IDEAL_POINTS,
            fair_min_minutes: TIME_BONUS_FAIR_MIN_MINUTES,
            fair_max_minutes: TIME_BONUS_FAIR_MAX_MINUTES,
            fair_points: TIME_BONUS_FAIR_POINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub fraud_threshold_seconds: u64,
    pub buckets: BucketTable,
    pub quality: QualityRules,
    pub time_bonus: TimeBonusRules,
    pub scaling_k: f64,
    pub min_payout: f64,
    pub min_review_length: usize,
    pub max_comprehension_attempts: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            fraud_threshold_seconds: FRAUD_THRESHOLD_SECONDS,
            buckets: BucketTable::default(),
            quality: QualityRules::default(),
            time_bonus: TimeBonusRules::default(),
            scaling_k: POINTS_SCALING_K,
            min_payout: MIN_PAYOUT,
            min_review_length: MIN_REVIEW_LENGTH,
            max_comprehension_attempts: MAX_COMPREHENSION_ATTEMPTS,
        }
    }
}

impl ScoringConfig {
    /// Loads a (possibly partial) JSON config; omitted keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        info!("Loading scoring config from {:?}", path);
        let raw = fs::read_to_string(path)?;
        let cfg: ScoringConfig = serde_json::from_str(&raw)?;
        debug!("Scoring config: {:?}", cfg);
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), String> {
        let b = &self.buckets;
        let bounds = [
            b.too_fast_max_minutes,
            b.efficient_max_minutes,
            b.ideal_max_minutes,
            b.normal_max_minutes,
        ];
        if bounds.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err("bucket bounds must be finite and non-negative".to_string());
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err("bucket bounds must be strictly ascending".to_string());
        }
        let multipliers = [b.too_fast, b.efficient, b.ideal, b.normal, b.too_slow];
        if multipliers.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err("bucket multipliers must be finite and non-negative".to_string());
        }
        let q = &self.quality;
        if [q.high_bonus, q.low_bonus]
            .iter()
            .any(|m| !m.is_finite() || *m < 0.0)
        {
            return Err("quality bonuses must be finite and non-negative".to_string());
        }
        let t = &self.time_bonus;
        let windows = [
            ("ideal", t.ideal_min_minutes, t.ideal_max_minutes),
            ("fair", t.fair_min_minutes, t.fair_max_minutes),
        ];
        for (name, min, max) in windows {
            if !min.is_finite() || !max.is_finite() || min < 0.0 {
                return Err(format!(
                    "{} time-bonus window must be finite and non-negative",
                    name
                ));
            }
            if min > max {
                return Err(format!(
                    "{} time-bonus window is inverted ({} > {})",
                    name, min, max
                ));
            }
        }
        if !(self.scaling_k.is_finite() && self.scaling_k > 0.0) {
            return Err(format!("scaling_k must be positive, got {}", self.scaling_k));
        }
        if !(self.min_payout.is_finite() && self.min_payout >= 0.0) {
            return Err(format!(
                "min_payout must be non-negative, got {}",
                self.min_payout
            ));
        }
        if self.max_comprehension_attempts == 0 {
            return Err("max_comprehension_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}
