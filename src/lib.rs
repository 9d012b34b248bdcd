// src/lib.rs

pub mod achievements;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod models;
pub mod quiz;
pub mod repository;
pub mod rewards;
pub mod session;

pub use config::ScoringConfig;
pub use error::{RewardError, SessionError, StoreError};
pub use models::{AnswerSet, ReadingSession, ReviewInput, RewardResult};
pub use rewards::{evaluate, ScoringStrategy};
