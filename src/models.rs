// src/models.rs

use crate::constants::SECONDS_PER_MINUTE;
use crate::error::RewardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// --- Calculator Inputs ---

/// Wall-clock time spent on the reading screen before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingSession {
    pub elapsed_seconds: u64,
}

impl ReadingSession {
    pub fn new(elapsed_seconds: u64) -> Self {
        ReadingSession { elapsed_seconds }
    }

    /// Builds a session from a raw timer reading. Fractional seconds are
    /// truncated; negative and non-finite readings are rejected.
    pub fn from_secs_f64(elapsed: f64) -> Result<Self, RewardError> {
        if !elapsed.is_finite() {
            return Err(RewardError::invalid(format!(
                "elapsed time must be finite, got {}",
                elapsed
            )));
        }
        if elapsed < 0.0 {
            return Err(RewardError::invalid(format!(
                "elapsed time must be non-negative, got {}",
                elapsed
            )));
        }
        Ok(ReadingSession::new(elapsed.trunc() as u64))
    }

    pub fn minutes(&self) -> f64 {
        self.elapsed_seconds as f64 / SECONDS_PER_MINUTE
    }
}

/// Question id -> chosen option id.
pub type AnswerSet = BTreeMap<String, String>;

/// Star rating and review size for the time-multiplier strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    pub rating: u8,
    pub review_length: usize,
}

/// Full review as typed by the reader.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewSubmission {
    pub rating: u8,
    pub text: String,
}

impl ReviewSubmission {
    pub fn input(&self) -> ReviewInput {
        ReviewInput {
            rating: self.rating,
            review_length: self.text.chars().count(),
        }
    }
}

// --- Quiz Content ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

/// Quiz item with one correct option worth a fixed number of points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensionQuestion {
    pub id: String,
    pub prompt: String,
    pub points: u32,
    pub options: Vec<ChoiceOption>,
}

impl ComprehensionQuestion {
    pub fn correct_option(&self) -> Option<&ChoiceOption> {
        self.options.iter().find(|o| o.correct)
    }

    pub fn has_option(&self, option_id: &str) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedOption {
    pub id: String,
    pub text: String,
    pub points: u32,
}

/// Quiz item where every option scores; the value depends on the choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpinionQuestion {
    pub id: String,
    pub prompt: String,
    pub options: Vec<RatedOption>,
}

impl OpinionQuestion {
    pub fn option(&self, option_id: &str) -> Option<&RatedOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn max_points(&self) -> u32 {
        self.options.iter().map(|o| o.points).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuizDefinition {
    #[serde(default)]
    pub comprehension: Vec<ComprehensionQuestion>,
    #[serde(default)]
    pub opinion: Vec<OpinionQuestion>,
}

impl QuizDefinition {
    /// Sum of every achievable question point. The reading-time bonus is
    /// not part of the maximum. `None` when the sum does not fit in a `u32`.
    pub fn max_points(&self) -> Option<u32> {
        self.comprehension
            .iter()
            .map(|q| q.points)
            .chain(self.opinion.iter().map(|q| q.max_points()))
            .try_fold(0u32, |acc, p| acc.checked_add(p))
    }

    pub fn is_comprehension(&self, question_id: &str) -> bool {
        self.comprehension.iter().any(|q| q.id == question_id)
    }

    pub fn find_comprehension(&self, question_id: &str) -> Option<&ComprehensionQuestion> {
        self.comprehension.iter().find(|q| q.id == question_id)
    }

    pub fn find_opinion(&self, question_id: &str) -> Option<&OpinionQuestion> {
        self.opinion.iter().find(|q| q.id == question_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookContent {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub base_value: f64,
    pub quiz: QuizDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub base_value: f64,
}

// Used for seeding
#[derive(Deserialize)]
pub struct JsonBook {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub base_value: f64,
    #[serde(flatten)]
    pub quiz: QuizDefinition,
}

// --- Calculator Outputs ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    TimeMultiplier,
    PointsAccumulation,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::TimeMultiplier => "time_multiplier",
            StrategyKind::PointsAccumulation => "points_accumulation",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time_multiplier" => Ok(StrategyKind::TimeMultiplier),
            "points_accumulation" => Ok(StrategyKind::PointsAccumulation),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minute bucket picked by the time-multiplier strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    TooFast,
    Efficient,
    Ideal,
    Normal,
    TooSlow,
}

impl TimeBucket {
    pub fn label(&self) -> &'static str {
        match self {
            TimeBucket::TooFast | TimeBucket::TooSlow => "penalty",
            TimeBucket::Efficient => "high_bonus",
            TimeBucket::Ideal => "medium_bonus",
            TimeBucket::Normal => "normal",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            TimeBucket::TooFast => "Reading too fast - penalty applied",
            TimeBucket::Efficient => "Efficient reading - speed bonus!",
            TimeBucket::Ideal => "Ideal reading time - bonus applied",
            TimeBucket::Normal => "Standard reading time",
            TimeBucket::TooSlow => "Reading too slow - penalty applied",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBonus {
    None,
    Small,
    High,
}

impl QualityBonus {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            QualityBonus::None => None,
            QualityBonus::Small => Some("small quality bonus"),
            QualityBonus::High => Some("quality bonus!"),
        }
    }
}

/// One scored line of a result, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownLine {
    pub question_id: String,
    pub label: String,
    pub points_awarded: u32,
    pub points_possible: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardDetail {
    TimeMultiplier {
        bucket: TimeBucket,
        label: &'static str,
        quality: QualityBonus,
        multiplier: f64,
        percentage_delta: i32,
        message: String,
    },
    PointsAccumulation {
        scaling_k: f64,
        floored: bool,
    },
}

/// Shared result of both scoring strategies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardResult {
    pub total_points: u32,
    pub max_points: u32,
    pub time_bonus_points: u32,
    pub monetary_value: f64,
    pub breakdown: Vec<BreakdownLine>,
    pub detail: RewardDetail,
}

impl RewardResult {
    pub fn strategy(&self) -> StrategyKind {
        match self.detail {
            RewardDetail::TimeMultiplier { .. } => StrategyKind::TimeMultiplier,
            RewardDetail::PointsAccumulation { .. } => StrategyKind::PointsAccumulation,
        }
    }
}

// --- Persisted State ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub balance: f64,
    pub books_read: u32,
    pub total_earnings: f64,
    pub registered_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(name: &str, email: &str, now: DateTime<Utc>) -> Self {
        UserRecord {
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            balance: 0.0,
            books_read: 0,
            total_earnings: 0.0,
            registered_at: now,
            last_login: now,
        }
    }

    pub fn credit(&mut self, amount: f64) {
        let amount = amount.max(0.0);
        self.balance += amount;
        self.total_earnings += amount;
        self.books_read = self.books_read.saturating_add(1);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadingLogEntry {
    pub id: i64,
    pub user_key: String,
    pub book_id: i64,
    pub strategy: StrategyKind,
    pub elapsed_seconds: u64,
    pub total_points: u32,
    pub monetary_value: f64,
    pub rating: Option<u8>,
    pub rejected: bool,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstEvaluation,
    DedicatedReader,
    SpeedOfLight,
    Perfectionist,
}

impl Achievement {
    pub const ALL: [Achievement; 4] = [
        Achievement::FirstEvaluation,
        Achievement::DedicatedReader,
        Achievement::SpeedOfLight,
        Achievement::Perfectionist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Achievement::FirstEvaluation => "first_evaluation",
            Achievement::DedicatedReader => "dedicated_reader",
            Achievement::SpeedOfLight => "speed_of_light",
            Achievement::Perfectionist => "perfectionist",
        }
    }
}

impl FromStr for Achievement {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Achievement::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown achievement: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnlockedAchievement {
    pub achievement: Achievement,
    pub unlocked_at: i64,
}
