// src/main.rs

use anyhow::{anyhow, Context};
use beta_reader_lib::models::{ReviewInput, ReviewSubmission};
use beta_reader_lib::{database, repository, rewards, session};
use beta_reader_lib::{ReadingSession, ScoringConfig, ScoringStrategy};
use clap::{Parser, Subcommand};
use log::{debug, info};
use rusqlite::Connection;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "beta-reader", version, about = "Score reading sessions and track reader balances")]
struct Cli {
    /// SQLite database holding users, books and the reading log.
    #[arg(long, env = "BETA_READER_DB", default_value = "beta_reader.db")]
    db: PathBuf,

    /// JSON file overriding scoring thresholds.
    #[arg(long, env = "BETA_READER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available books.
    Books,
    Register {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Log in and print the stored profile.
    Profile {
        #[arg(long)]
        user: String,
    },
    /// Change name, email or phone of an existing user.
    Update {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Empty string clears the stored phone.
        #[arg(long)]
        phone: Option<String>,
    },
    Achievements {
        #[arg(long)]
        user: String,
    },
    Delete {
        #[arg(long)]
        user: String,
    },
    History {
        #[arg(long)]
        user: String,
    },
    /// Time-multiplier score only, nothing is stored.
    ScoreReview {
        #[arg(long, allow_negative_numbers = true)]
        seconds: f64,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        review_length: usize,
        #[arg(long, default_value_t = 30.0)]
        base_value: f64,
    },
    /// Points score against a stored book's quiz, nothing is stored.
    ScoreQuiz {
        #[arg(long)]
        book: i64,
        #[arg(long, allow_negative_numbers = true)]
        seconds: f64,
        /// Answer as `question=option`, repeatable. Retries are given in
        /// order by repeating the question.
        #[arg(long = "answer", value_parser = parse_answer)]
        answers: Vec<(String, String)>,
    },
    SubmitReview {
        #[arg(long)]
        user: String,
        #[arg(long)]
        book: i64,
        #[arg(long, allow_negative_numbers = true)]
        seconds: f64,
        #[arg(long)]
        rating: u8,
        /// File containing the review text.
        #[arg(long)]
        review_file: PathBuf,
    },
    SubmitQuiz {
        #[arg(long)]
        user: String,
        #[arg(long)]
        book: i64,
        #[arg(long, allow_negative_numbers = true)]
        seconds: f64,
        #[arg(long = "answer", value_parser = parse_answer)]
        answers: Vec<(String, String)>,
    },
}

fn parse_answer(raw: &str) -> Result<(String, String), String> {
    let (question, option) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected question=option, got '{}'", raw))?;
    if question.is_empty() || option.is_empty() {
        return Err(format!("expected question=option, got '{}'", raw));
    }
    Ok((question.to_string(), option.to_string()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ScoringConfig> {
    let cfg = match path {
        Some(p) => ScoringConfig::from_json_file(p)?,
        None => ScoringConfig::default(),
    };
    cfg.validate().map_err(|e| anyhow!("invalid scoring config: {}", e))?;
    Ok(cfg)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_ref())?;

    debug!("Database path: {:?}", cli.db);
    let conn = Connection::open(&cli.db)
        .with_context(|| format!("failed to open database {:?}", cli.db))?;
    database::init_db(&conn).context("failed to init database")?;

    match cli.command {
        Command::Books => print_json(&repository::list_books(&conn)?)?,
        Command::Register { user, name, email } => {
            print_json(&session::register_user(&conn, &user, &name, &email)?)?
        }
        Command::Profile { user } => print_json(&session::login(&conn, &user)?)?,
        Command::Update {
            user,
            name,
            email,
            phone,
        } => print_json(&session::update_profile(
            &conn,
            &user,
            &name,
            &email,
            phone.as_deref(),
        )?)?,
        Command::Achievements { user } => {
            print_json(&repository::list_achievements(&conn, &user)?)?
        }
        Command::Delete { user } => {
            session::delete_user(&conn, &user)?;
            info!("User {} removed", user);
        }
        Command::History { user } => print_json(&repository::reading_history(&conn, &user)?)?,
        Command::ScoreReview {
            seconds,
            rating,
            review_length,
            base_value,
        } => {
            let reading = ReadingSession::from_secs_f64(seconds)?;
            let strategy = ScoringStrategy::TimeMultiplier(ReviewInput {
                rating,
                review_length,
            });
            print_json(&rewards::evaluate(&cfg, reading, base_value, strategy)?)?
        }
        Command::ScoreQuiz {
            book,
            seconds,
            answers,
        } => {
            let reading = ReadingSession::from_secs_f64(seconds)?;
            let content = repository::get_book(&conn, book)?;
            print_json(&session::score_attempts(
                &cfg,
                reading,
                content.base_value,
                &content.quiz,
                &answers,
            )?)?
        }
        Command::SubmitReview {
            user,
            book,
            seconds,
            rating,
            review_file,
        } => {
            let reading = ReadingSession::from_secs_f64(seconds)?;
            let text = fs::read_to_string(&review_file)
                .with_context(|| format!("failed to read review {:?}", review_file))?;
            let review = ReviewSubmission { rating, text };
            print_json(&session::submit_review(&conn, &cfg, &user, book, reading, &review)?)?
        }
        Command::SubmitQuiz {
            user,
            book,
            seconds,
            answers,
        } => {
            let reading = ReadingSession::from_secs_f64(seconds)?;
            print_json(&session::submit_quiz_attempts(
                &conn, &cfg, &user, book, reading, &answers,
            )?)?
        }
    }

    Ok(())
}
