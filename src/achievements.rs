// src/achievements.rs

use crate::constants::*;
use crate::models::{Achievement, ReadingLogEntry};
use log::debug;

/// Every achievement the reading history qualifies for. Only accepted
/// (non-rejected) readings count as completed books; a reading without a
/// star rating counts as 0 towards the average.
pub fn unlock_achievements(history: &[ReadingLogEntry]) -> Vec<Achievement> {
    let completed: Vec<&ReadingLogEntry> = history.iter().filter(|r| !r.rejected).collect();
    let mut unlocked = Vec::new();
    if completed.is_empty() {
        return unlocked;
    }

    unlocked.push(Achievement::FirstEvaluation);

    if completed.len() >= DEDICATED_READER_BOOKS {
        unlocked.push(Achievement::DedicatedReader);
    }

    if completed
        .iter()
        .any(|r| r.elapsed_seconds < SPEED_OF_LIGHT_MAX_SECONDS)
    {
        unlocked.push(Achievement::SpeedOfLight);
    }

    let rating_sum: u32 = completed.iter().map(|r| u32::from(r.rating.unwrap_or(0))).sum();
    let average = rating_sum as f64 / completed.len() as f64;
    debug!(
        "[Achievements] {} completed, average rating {:.2}",
        completed.len(),
        average
    );
    if completed.len() >= PERFECTIONIST_MIN_BOOKS && average >= PERFECTIONIST_MIN_AVERAGE_RATING {
        unlocked.push(Achievement::Perfectionist);
    }

    unlocked
}
