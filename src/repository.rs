// src/repository.rs

use crate::error::StoreError;
use crate::models::{
    Achievement, BookContent, BookSummary, ChoiceOption, ComprehensionQuestion, OpinionQuestion,
    QuizDefinition, RatedOption, ReadingLogEntry, StrategyKind, UnlockedAchievement, UserRecord,
};
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::str::FromStr;

/// Key-value persistence for user records.
pub trait SessionStore {
    fn load(&self, key: &str) -> Result<Option<UserRecord>, StoreError>;
    fn save(&self, key: &str, record: &UserRecord) -> Result<(), StoreError>;
}

impl SessionStore for Connection {
    fn load(&self, key: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = self
            .query_row(
                "SELECT name, email, phone, balance, books_read, total_earnings, registered_at, last_login
                 FROM users WHERE user_key = ?",
                [key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, u32>(4)?,
                        row.get::<_, f64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, i64>(7)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(
            |(name, email, phone, balance, books_read, total_earnings, registered, last)| UserRecord {
                name,
                email,
                phone,
                balance,
                books_read,
                total_earnings,
                registered_at: from_ts(registered),
                last_login: from_ts(last),
            },
        ))
    }

    fn save(&self, key: &str, record: &UserRecord) -> Result<(), StoreError> {
        self.execute(
            "INSERT OR REPLACE INTO users (user_key, name, email, phone, balance, books_read, total_earnings, registered_at, last_login)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                key,
                record.name,
                record.email,
                record.phone,
                record.balance,
                record.books_read,
                record.total_earnings,
                record.registered_at.timestamp(),
                record.last_login.timestamp()
            ],
        )?;
        debug!("[DB] Saved user {} (balance {:.2})", key, record.balance);
        Ok(())
    }
}

fn from_ts(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

/// Removes a user, their reading log and their achievements.
pub fn delete_user(conn: &Connection, key: &str) -> Result<bool> {
    conn.execute("DELETE FROM readings WHERE user_key = ?", [key])?;
    conn.execute("DELETE FROM achievements WHERE user_key = ?", [key])?;
    let removed = conn.execute("DELETE FROM users WHERE user_key = ?", [key])?;
    Ok(removed > 0)
}

// --- Content Provider ---

pub fn list_books(conn: &Connection) -> Result<Vec<BookSummary>> {
    let mut stmt =
        conn.prepare("SELECT id, title, author, genre, base_value FROM books ORDER BY id")?;
    let books = stmt
        .query_map([], |row| {
            Ok(BookSummary {
                id: row.get(0)?,
                title: row.get(1)?,
                author: row.get(2)?,
                genre: row.get(3)?,
                base_value: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(books)
}

/// Fetches a book together with its quiz, questions in their seeded order.
pub fn get_book(conn: &Connection, book_id: i64) -> Result<BookContent, StoreError> {
    let summary = conn
        .query_row(
            "SELECT id, title, author, genre, base_value FROM books WHERE id = ?",
            [book_id],
            |row| {
                Ok(BookSummary {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    author: row.get(2)?,
                    genre: row.get(3)?,
                    base_value: row.get(4)?,
                })
            },
        )
        .optional()?
        .ok_or(StoreError::BookNotFound(book_id))?;

    let quiz = get_quiz(conn, book_id)?;
    Ok(BookContent {
        id: summary.id,
        title: summary.title,
        author: summary.author,
        genre: summary.genre,
        base_value: summary.base_value,
        quiz,
    })
}

fn get_quiz(conn: &Connection, book_id: i64) -> Result<QuizDefinition> {
    let mut q_stmt = conn.prepare(
        "SELECT question_key, kind, prompt, points FROM questions
         WHERE book_id = ?
         ORDER BY position ASC",
    )?;
    let questions = q_stmt
        .query_map([book_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut o_stmt = conn.prepare(
        "SELECT option_key, text, correct, points FROM question_options
         WHERE book_id = ? AND question_key = ?
         ORDER BY position ASC",
    )?;

    let mut quiz = QuizDefinition::default();
    for (key, kind, prompt, points) in questions {
        let options = o_stmt
            .query_map(params![book_id, key], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, u32>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if kind == "comprehension" {
            quiz.comprehension.push(ComprehensionQuestion {
                id: key,
                prompt,
                points,
                options: options
                    .into_iter()
                    .map(|(id, text, correct, _)| ChoiceOption { id, text, correct })
                    .collect(),
            });
        } else {
            quiz.opinion.push(OpinionQuestion {
                id: key,
                prompt,
                options: options
                    .into_iter()
                    .map(|(id, text, _, points)| RatedOption { id, text, points })
                    .collect(),
            });
        }
    }
    Ok(quiz)
}

// --- Reading Log ---

/// Records one scored (or rejected) submission.
#[allow(clippy::too_many_arguments)]
pub fn log_reading(
    conn: &Connection,
    user_key: &str,
    book_id: i64,
    strategy: StrategyKind,
    elapsed_seconds: u64,
    total_points: u32,
    monetary_value: f64,
    rating: Option<u8>,
    rejected: bool,
    timestamp: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO readings (user_key, book_id, strategy, elapsed_seconds, total_points, monetary_value, rating, rejected, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            user_key,
            book_id,
            strategy.as_str(),
            elapsed_seconds as i64,
            total_points,
            monetary_value,
            rating,
            rejected,
            timestamp
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn reading_history(conn: &Connection, user_key: &str) -> Result<Vec<ReadingLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_key, book_id, strategy, elapsed_seconds, total_points, monetary_value, rating, rejected, timestamp
         FROM readings
         WHERE user_key = ?
         ORDER BY id ASC",
    )?;

    let entries = stmt
        .query_map([user_key], |row| {
            let strategy: String = row.get(3)?;
            let elapsed: i64 = row.get(4)?;
            Ok(ReadingLogEntry {
                id: row.get(0)?,
                user_key: row.get(1)?,
                book_id: row.get(2)?,
                strategy: StrategyKind::from_str(&strategy)
                    .unwrap_or(StrategyKind::TimeMultiplier),
                elapsed_seconds: elapsed.max(0) as u64,
                total_points: row.get(5)?,
                monetary_value: row.get(6)?,
                rating: row.get(7)?,
                rejected: row.get(8)?,
                timestamp: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

/// Whether the user already has an accepted (non-rejected) reading of the book.
pub fn has_completed(conn: &Connection, user_key: &str, book_id: i64) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM readings WHERE user_key = ? AND book_id = ? AND rejected = 0)",
        params![user_key, book_id],
        |row| row.get(0),
    )
}

// --- Achievements ---

/// Stores an unlock. Returns false when the user already had it.
pub fn unlock_achievement(
    conn: &Connection,
    user_key: &str,
    achievement: Achievement,
    timestamp: i64,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO achievements (user_key, achievement, unlocked_at) VALUES (?, ?, ?)",
        params![user_key, achievement.as_str(), timestamp],
    )?;
    Ok(inserted > 0)
}

pub fn list_achievements(conn: &Connection, user_key: &str) -> Result<Vec<UnlockedAchievement>> {
    let mut stmt = conn.prepare(
        "SELECT achievement, unlocked_at FROM achievements
         WHERE user_key = ?
         ORDER BY unlocked_at ASC, achievement ASC",
    )?;
    let rows = stmt
        .query_map([user_key], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    // Unknown names come from a newer build; skip them.
    Ok(rows
        .into_iter()
        .filter_map(|(name, unlocked_at)| {
            Achievement::from_str(&name)
                .ok()
                .map(|achievement| UnlockedAchievement { achievement, unlocked_at })
        })
        .collect())
}
