// src/session.rs

use crate::achievements::unlock_achievements;
use crate::config::ScoringConfig;
use crate::error::{RewardError, SessionError, StoreError};
use crate::models::{
    Achievement, AnswerSet, QuizDefinition, ReadingSession, ReviewSubmission, RewardResult,
    StrategyKind, UserRecord,
};
use crate::quiz;
use crate::repository::{self, SessionStore};
use crate::rewards::{self, ScoringStrategy};
use chrono::Utc;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use serde::Serialize;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// What a submit flow hands back to the caller: the score, the user's
/// updated record and any achievement this submission unlocked.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub reading_id: i64,
    pub reward: RewardResult,
    pub user: UserRecord,
    pub new_achievements: Vec<Achievement>,
}

// --- Accounts ---

fn validate_contact(name: &str, email: &str) -> Result<(), RewardError> {
    if name.is_empty() {
        return Err(RewardError::invalid("name is required"));
    }
    if email.is_empty() {
        return Err(RewardError::invalid("email is required"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(RewardError::invalid(format!("'{}' is not a valid email", email)));
    }
    Ok(())
}

pub fn register_user(
    conn: &Connection,
    key: &str,
    name: &str,
    email: &str,
) -> Result<UserRecord, SessionError> {
    let (name, email) = (name.trim(), email.trim());
    validate_contact(name, email)?;
    if conn.load(key)?.is_some() {
        return Err(StoreError::UserExists(key.to_string()).into());
    }

    let user = UserRecord::new(name, email, Utc::now());
    conn.save(key, &user)?;
    info!("Registered user {}", key);
    Ok(user)
}

/// Replaces the contact fields of an existing user. A blank phone clears it.
/// Balance, counters and timestamps are left alone.
pub fn update_profile(
    conn: &Connection,
    key: &str,
    name: &str,
    email: &str,
    phone: Option<&str>,
) -> Result<UserRecord, SessionError> {
    let (name, email) = (name.trim(), email.trim());
    validate_contact(name, email)?;

    let mut user = load_user(conn, key)?;
    user.name = name.to_string();
    user.email = email.to_string();
    user.phone = phone.map(str::trim).filter(|p| !p.is_empty()).map(str::to_string);
    conn.save(key, &user)?;
    info!("Updated profile for user {}", key);
    Ok(user)
}

pub fn login(conn: &Connection, key: &str) -> Result<UserRecord, SessionError> {
    let mut user = load_user(conn, key)?;
    user.last_login = Utc::now();
    conn.save(key, &user)?;
    Ok(user)
}

pub fn delete_user(conn: &Connection, key: &str) -> Result<(), SessionError> {
    if !repository::delete_user(conn, key)? {
        return Err(StoreError::UserNotFound(key.to_string()).into());
    }
    info!("Deleted user {} and reading history", key);
    Ok(())
}

// --- Submissions ---

/// Free-text review flow: scored with the time-multiplier strategy.
pub fn submit_review(
    conn: &Connection,
    cfg: &ScoringConfig,
    key: &str,
    book_id: i64,
    session: ReadingSession,
    review: &ReviewSubmission,
) -> Result<SubmissionOutcome, SessionError> {
    let input = review.input();
    // The gate still runs first inside `evaluate`; length only matters for
    // sessions that get past it.
    if session.elapsed_seconds >= cfg.fraud_threshold_seconds
        && input.review_length < cfg.min_review_length
    {
        return Err(RewardError::invalid(format!(
            "review must be at least {} characters, got {}",
            cfg.min_review_length, input.review_length
        ))
        .into());
    }

    submit(
        conn,
        key,
        book_id,
        session,
        StrategyKind::TimeMultiplier,
        Some(review.rating),
        |base_value, _| {
            rewards::evaluate(cfg, session, base_value, ScoringStrategy::TimeMultiplier(input))
        },
    )
}

/// Quiz flow with a final answer per question: scored with the
/// points-accumulation strategy against the book's stored quiz.
pub fn submit_quiz(
    conn: &Connection,
    cfg: &ScoringConfig,
    key: &str,
    book_id: i64,
    session: ReadingSession,
    answers: &AnswerSet,
) -> Result<SubmissionOutcome, SessionError> {
    submit(
        conn,
        key,
        book_id,
        session,
        StrategyKind::PointsAccumulation,
        None,
        |base_value, quiz| {
            rewards::evaluate(
                cfg,
                session,
                base_value,
                ScoringStrategy::PointsAccumulation { answers, quiz },
            )
        },
    )
}

/// Quiz flow from the ordered answers the reader gave, retries included.
/// Each comprehension question allows `cfg.max_comprehension_attempts`
/// misses; see [`quiz::replay`].
pub fn submit_quiz_attempts(
    conn: &Connection,
    cfg: &ScoringConfig,
    key: &str,
    book_id: i64,
    session: ReadingSession,
    attempts: &[(String, String)],
) -> Result<SubmissionOutcome, SessionError> {
    submit(
        conn,
        key,
        book_id,
        session,
        StrategyKind::PointsAccumulation,
        None,
        |base_value, quiz| score_attempts(cfg, session, base_value, quiz, attempts),
    )
}

/// Gate, then replay, then score. Shared by the submit flow and the CLI's
/// dry-run scoring.
pub fn score_attempts(
    cfg: &ScoringConfig,
    session: ReadingSession,
    base_value: f64,
    quiz: &QuizDefinition,
    attempts: &[(String, String)],
) -> Result<RewardResult, RewardError> {
    rewards::check_engagement(cfg, session)?;
    let answers = quiz::replay(quiz, cfg.max_comprehension_attempts, attempts)?;
    rewards::evaluate(
        cfg,
        session,
        base_value,
        ScoringStrategy::PointsAccumulation {
            answers: &answers,
            quiz,
        },
    )
}

fn submit<F>(
    conn: &Connection,
    key: &str,
    book_id: i64,
    session: ReadingSession,
    strategy: StrategyKind,
    rating: Option<u8>,
    score: F,
) -> Result<SubmissionOutcome, SessionError>
where
    F: FnOnce(f64, &QuizDefinition) -> Result<RewardResult, RewardError>,
{
    let mut user = load_user(conn, key)?;
    let book = repository::get_book(conn, book_id)?;
    if repository::has_completed(conn, key, book.id)? {
        warn!("User {} already completed book {}, refusing", key, book.id);
        return Err(StoreError::BookAlreadyCompleted(book.id).into());
    }

    let now = Utc::now().timestamp();
    info!(
        "Scoring {} submission for user {} on book {} ({}s)",
        strategy, key, book.id, session.elapsed_seconds
    );

    let reward = match score(book.base_value, &book.quiz) {
        Ok(r) => r,
        Err(RewardError::FraudSuspected { elapsed_seconds }) => {
            warn!(
                "Rejected {} submission from {}: only {}s of reading",
                strategy, key, elapsed_seconds
            );
            repository::log_reading(
                conn,
                key,
                book.id,
                strategy,
                elapsed_seconds,
                0,
                0.0,
                rating,
                true,
                now,
            )?;
            return Err(RewardError::FraudSuspected { elapsed_seconds }.into());
        }
        Err(e) => return Err(e.into()),
    };

    let tx = conn.unchecked_transaction()?;
    let reading_id = repository::log_reading(
        &tx,
        key,
        book.id,
        reward.strategy(),
        session.elapsed_seconds,
        reward.total_points,
        reward.monetary_value,
        rating,
        false,
        now,
    )?;
    let old_balance = user.balance;
    user.credit(reward.monetary_value);
    tx.save(key, &user)?;

    let history = repository::reading_history(&tx, key)?;
    let mut new_achievements = Vec::new();
    for achievement in unlock_achievements(&history) {
        if repository::unlock_achievement(&tx, key, achievement, now)? {
            info!("[Achievement] User {} unlocked {}", key, achievement.as_str());
            new_achievements.push(achievement);
        }
    }
    tx.commit()?;

    info!(
        "[Credit] User {}: balance {:.2} -> {:.2} (+{:.2})",
        key, old_balance, user.balance, reward.monetary_value
    );

    Ok(SubmissionOutcome {
        reading_id,
        reward,
        user,
        new_achievements,
    })
}

fn load_user(conn: &Connection, key: &str) -> Result<UserRecord, SessionError> {
    conn.load(key)?
        .ok_or_else(|| StoreError::UserNotFound(key.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_is_checked() {
        for ok in ["ana@example.com", "a.b+c@mail.co.uk"] {
            assert!(validate_contact("Ana", ok).is_ok(), "{}", ok);
        }
        for bad in ["ana", "ana@example", "ana @example.com", "@example.com", "ana@.com x"] {
            assert!(
                matches!(validate_contact("Ana", bad), Err(RewardError::InvalidInput(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn blank_name_or_email_is_required() {
        assert!(validate_contact("", "ana@example.com").is_err());
        assert!(validate_contact("Ana", "").is_err());
    }
}
