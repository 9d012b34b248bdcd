// src/rewards.rs

use crate::config::{BucketTable, QualityRules, ScoringConfig, TimeBonusRules};
use crate::constants::{RATING_MAX, RATING_MIN};
use crate::error::RewardError;
use crate::models::{
    AnswerSet, BreakdownLine, QualityBonus, QuizDefinition, ReadingSession, ReviewInput,
    RewardDetail, RewardResult, TimeBucket,
};
use log::debug;
use std::collections::HashSet;

/// Scoring mode picked by the calling flow.
#[derive(Debug, Clone, Copy)]
pub enum ScoringStrategy<'a> {
    /// Free-text review: reading-time bucket times base value, plus a
    /// review quality bonus.
    TimeMultiplier(ReviewInput),
    /// Quiz: per-question points plus a reading-time bonus, scaled against
    /// the quiz maximum.
    PointsAccumulation {
        answers: &'a AnswerSet,
        quiz: &'a QuizDefinition,
    },
}

// --- Public Interface ---

/// Scores one finished reading session. Pure: identical inputs always give
/// identical results.
pub fn evaluate(
    cfg: &ScoringConfig,
    session: ReadingSession,
    base_value: f64,
    strategy: ScoringStrategy<'_>,
) -> Result<RewardResult, RewardError> {
    check_engagement(cfg, session)?;
    validate_base_value(base_value)?;

    match strategy {
        ScoringStrategy::TimeMultiplier(review) => {
            score_time_multiplier(cfg, session, review, base_value)
        }
        ScoringStrategy::PointsAccumulation { answers, quiz } => {
            score_points(cfg, session, answers, quiz, base_value)
        }
    }
}

/// Minimum-engagement gate. Sessions under the threshold are never scored.
pub fn check_engagement(cfg: &ScoringConfig, session: ReadingSession) -> Result<(), RewardError> {
    if session.elapsed_seconds < cfg.fraud_threshold_seconds {
        debug!(
            "[Gate] {}s < {}s floor, rejecting",
            session.elapsed_seconds, cfg.fraud_threshold_seconds
        );
        return Err(RewardError::FraudSuspected {
            elapsed_seconds: session.elapsed_seconds,
        });
    }
    Ok(())
}

/// First bucket whose inclusive upper bound holds `minutes`.
pub fn select_bucket(table: &BucketTable, minutes: f64) -> (TimeBucket, f64) {
    if minutes <= table.too_fast_max_minutes {
        (TimeBucket::TooFast, table.too_fast)
    } else if minutes <= table.efficient_max_minutes {
        (TimeBucket::Efficient, table.efficient)
    } else if minutes <= table.ideal_max_minutes {
        (TimeBucket::Ideal, table.ideal)
    } else if minutes <= table.normal_max_minutes {
        (TimeBucket::Normal, table.normal)
    } else {
        (TimeBucket::TooSlow, table.too_slow)
    }
}

pub fn quality_bonus(rules: &QualityRules, review: ReviewInput) -> (QualityBonus, f64) {
    if review.rating >= rules.high_min_rating && review.review_length >= rules.high_min_length {
        (QualityBonus::High, rules.high_bonus)
    } else if review.rating >= rules.low_min_rating && review.review_length >= rules.low_min_length
    {
        (QualityBonus::Small, rules.low_bonus)
    } else {
        (QualityBonus::None, 0.0)
    }
}

pub fn time_bonus_points(rules: &TimeBonusRules, minutes: f64) -> u32 {
    if minutes >= rules.ideal_min_minutes && minutes <= rules.ideal_max_minutes {
        rules.ideal_points
    } else if minutes >= rules.fair_min_minutes && minutes <= rules.fair_max_minutes {
        rules.fair_points
    } else {
        0
    }
}

/// Structural checks on quiz content before it can be scored against.
pub fn validate_quiz(quiz: &QuizDefinition) -> Result<(), RewardError> {
    let mut seen = HashSet::new();
    for q in &quiz.comprehension {
        if !seen.insert(q.id.as_str()) {
            return Err(RewardError::invalid(format!("duplicate question id '{}'", q.id)));
        }
        let correct = q.options.iter().filter(|o| o.correct).count();
        if correct != 1 {
            return Err(RewardError::invalid(format!(
                "comprehension question '{}' has {} correct options, expected exactly 1",
                q.id, correct
            )));
        }
    }
    for q in &quiz.opinion {
        if !seen.insert(q.id.as_str()) {
            return Err(RewardError::invalid(format!("duplicate question id '{}'", q.id)));
        }
        if q.options.is_empty() {
            return Err(RewardError::invalid(format!(
                "opinion question '{}' has no options",
                q.id
            )));
        }
    }
    match quiz.max_points() {
        None => Err(RewardError::invalid("quiz point total overflows")),
        Some(0) => Err(RewardError::invalid("quiz has no achievable points")),
        Some(_) => Ok(()),
    }
}

// --- Internal Algorithm Logic ---

fn validate_base_value(base_value: f64) -> Result<(), RewardError> {
    if !base_value.is_finite() || base_value < 0.0 {
        return Err(RewardError::invalid(format!(
            "base value must be finite and non-negative, got {}",
            base_value
        )));
    }
    Ok(())
}

fn validate_rating(rating: u8) -> Result<(), RewardError> {
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return Err(RewardError::invalid(format!(
            "rating must be between {} and {}, got {}",
            RATING_MIN, RATING_MAX, rating
        )));
    }
    Ok(())
}

/// Every answer must name a known question and one of its options.
/// Unanswered questions are fine; they just score zero.
fn validate_answers(quiz: &QuizDefinition, answers: &AnswerSet) -> Result<(), RewardError> {
    for (question_id, option_id) in answers {
        let known_option = if let Some(q) = quiz.find_comprehension(question_id) {
            q.has_option(option_id)
        } else if let Some(q) = quiz.find_opinion(question_id) {
            q.option(option_id).is_some()
        } else {
            return Err(RewardError::invalid(format!(
                "answer given for unknown question '{}'",
                question_id
            )));
        };
        if !known_option {
            return Err(RewardError::invalid(format!(
                "question '{}' has no option '{}'",
                question_id, option_id
            )));
        }
    }
    Ok(())
}

fn score_time_multiplier(
    cfg: &ScoringConfig,
    session: ReadingSession,
    review: ReviewInput,
    base_value: f64,
) -> Result<RewardResult, RewardError> {
    validate_rating(review.rating)?;

    let minutes = session.minutes();
    let (bucket, bucket_multiplier) = select_bucket(&cfg.buckets, minutes);
    let (quality, quality_extra) = quality_bonus(&cfg.quality, review);
    let multiplier = bucket_multiplier + quality_extra;

    debug!(
        "[Multiplier] {:.2} min -> {:?} x{:.2}, quality {:?} +{:.2} (rating {}, {} chars)",
        minutes, bucket, bucket_multiplier, quality, quality_extra, review.rating,
        review.review_length
    );

    let mut message = bucket.message().to_string();
    if let Some(extra) = quality.message() {
        message.push_str(" + ");
        message.push_str(extra);
    }

    let monetary_value = (base_value * multiplier).max(0.0);
    Ok(RewardResult {
        total_points: 0,
        max_points: 0,
        time_bonus_points: 0,
        monetary_value,
        breakdown: Vec::new(),
        detail: RewardDetail::TimeMultiplier {
            bucket,
            label: bucket.label(),
            quality,
            multiplier,
            percentage_delta: ((multiplier - 1.0) * 100.0).round() as i32,
            message,
        },
    })
}

fn score_points(
    cfg: &ScoringConfig,
    session: ReadingSession,
    answers: &AnswerSet,
    quiz: &QuizDefinition,
    base_value: f64,
) -> Result<RewardResult, RewardError> {
    validate_quiz(quiz)?;
    validate_answers(quiz, answers)?;

    let mut breakdown = Vec::with_capacity(quiz.comprehension.len() + quiz.opinion.len() + 1);

    for q in &quiz.comprehension {
        let correct_id = q.correct_option().map(|o| o.id.as_str());
        let awarded = match answers.get(&q.id) {
            Some(chosen) if Some(chosen.as_str()) == correct_id => q.points,
            _ => 0,
        };
        breakdown.push(BreakdownLine {
            question_id: q.id.clone(),
            label: q.prompt.clone(),
            points_awarded: awarded,
            points_possible: q.points,
        });
    }

    for q in &quiz.opinion {
        let awarded = answers
            .get(&q.id)
            .and_then(|chosen| q.option(chosen))
            .map_or(0, |o| o.points);
        breakdown.push(BreakdownLine {
            question_id: q.id.clone(),
            label: q.prompt.clone(),
            points_awarded: awarded,
            points_possible: q.max_points(),
        });
    }

    let question_points = breakdown
        .iter()
        .try_fold(0u32, |acc, l| acc.checked_add(l.points_awarded))
        .ok_or_else(|| RewardError::invalid("quiz point total overflows"))?;
    let minutes = session.minutes();
    let time_bonus = time_bonus_points(&cfg.time_bonus, minutes);
    breakdown.push(BreakdownLine {
        question_id: "reading_time".to_string(),
        label: "Reading time bonus".to_string(),
        points_awarded: time_bonus,
        points_possible: cfg.time_bonus.ideal_points.max(cfg.time_bonus.fair_points),
    });

    let total_points = question_points
        .checked_add(time_bonus)
        .ok_or_else(|| RewardError::invalid("quiz point total overflows"))?;
    let max_points = quiz
        .max_points()
        .ok_or_else(|| RewardError::invalid("quiz point total overflows"))?;
    let scaled = (total_points as f64 / max_points as f64) * base_value * cfg.scaling_k;
    let floored = scaled < cfg.min_payout;
    let monetary_value = scaled.max(cfg.min_payout).max(0.0);

    debug!(
        "[Points] {}/{} (time bonus {} at {:.2} min), scaled {:.4}, floored: {}",
        total_points, max_points, time_bonus, minutes, scaled, floored
    );

    Ok(RewardResult {
        total_points,
        max_points,
        time_bonus_points: time_bonus,
        monetary_value,
        breakdown,
        detail: RewardDetail::PointsAccumulation {
            scaling_k: cfg.scaling_k,
            floored,
        },
    })
}
