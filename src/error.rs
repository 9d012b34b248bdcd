// src/error.rs

use thiserror::Error;

/// Failures raised by the reward calculator itself.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RewardError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("session rejected: {elapsed_seconds}s of reading is below the engagement floor")]
    FraudSuspected { elapsed_seconds: u64 },
}

impl RewardError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        RewardError::InvalidInput(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("user already registered: {0}")]
    UserExists(String),

    #[error("book not found: {0}")]
    BookNotFound(i64),

    #[error("book {0} was already completed by this user")]
    BookAlreadyCompleted(i64),
}

/// Errors surfaced by the submit/register flows in `session`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Reward(#[from] RewardError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for SessionError {
    fn from(e: rusqlite::Error) -> Self {
        SessionError::Store(StoreError::Sqlite(e))
    }
}
