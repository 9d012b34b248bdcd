use beta_reader_lib::database::init_db;
use beta_reader_lib::models::{Achievement, ReviewSubmission, StrategyKind};
use beta_reader_lib::repository::{self, SessionStore};
use beta_reader_lib::session;
use beta_reader_lib::{AnswerSet, ReadingSession, RewardError, ScoringConfig, SessionError, StoreError};
use rusqlite::Connection;

const EPS: f64 = 1e-9;

fn setup() -> (tempfile::TempDir, Connection) {
    let dir = tempfile::tempdir().unwrap();
    let conn = Connection::open(dir.path().join("reader.db")).unwrap();
    init_db(&conn).unwrap();
    session::register_user(&conn, "ana", "Ana", "ana@example.com").unwrap();
    (dir, conn)
}

fn long_review(rating: u8, chars: usize) -> ReviewSubmission {
    ReviewSubmission {
        rating,
        text: "x".repeat(chars),
    }
}

fn answers(pairs: &[(&str, &str)]) -> AnswerSet {
    pairs
        .iter()
        .map(|(q, o)| (q.to_string(), o.to_string()))
        .collect()
}

#[test]
fn review_submission_credits_balance() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();

    let outcome = session::submit_review(
        &conn,
        &cfg,
        "ana",
        1,
        ReadingSession::new(240),
        &long_review(5, 520),
    )
    .unwrap();

    assert!((outcome.reward.monetary_value - 54.0).abs() < EPS);
    assert!((outcome.user.balance - 54.0).abs() < EPS);
    assert_eq!(outcome.user.books_read, 1);

    let stored = conn.load("ana").unwrap().unwrap();
    assert_eq!(stored, outcome.user);
}

#[test]
fn balances_accumulate_across_submissions() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();

    session::submit_review(&conn, &cfg, "ana", 1, ReadingSession::new(240), &long_review(5, 520))
        .unwrap();
    // Book 2 (base value 75): question1 and question3 right, question2 wrong.
    let set = answers(&[
        ("question1", "b"),
        ("question2", "c"),
        ("question3", "c"),
        ("rating1", "b"),
        ("rating2", "b"),
        ("rating3", "b"),
    ]);
    let outcome =
        session::submit_quiz(&conn, &cfg, "ana", 2, ReadingSession::new(360), &set).unwrap();

    assert_eq!(outcome.reward.total_points, 125);
    assert!((outcome.reward.monetary_value - 292.96875).abs() < EPS);
    assert!((outcome.user.balance - (54.0 + 292.96875)).abs() < EPS);
    assert!((outcome.user.total_earnings - (54.0 + 292.96875)).abs() < EPS);
    assert_eq!(outcome.user.books_read, 2);
    assert_eq!(repository::reading_history(&conn, "ana").unwrap().len(), 2);
}

#[test]
fn fraud_is_logged_but_not_credited() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();

    let err = session::submit_quiz(&conn, &cfg, "ana", 1, ReadingSession::new(12), &AnswerSet::new())
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Reward(RewardError::FraudSuspected { elapsed_seconds: 12 })
    ));

    let user = conn.load("ana").unwrap().unwrap();
    assert_eq!(user.balance, 0.0);
    assert_eq!(user.books_read, 0);

    let history = repository::reading_history(&conn, "ana").unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].rejected);
    assert_eq!(history[0].monetary_value, 0.0);
}

#[test]
fn short_review_text_is_rejected() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();

    let err = session::submit_review(&conn, &cfg, "ana", 1, ReadingSession::new(240), &long_review(5, 299))
        .unwrap_err();
    assert!(matches!(err, SessionError::Reward(RewardError::InvalidInput(_))));
    assert!(repository::reading_history(&conn, "ana").unwrap().is_empty());
}

#[test]
fn fraud_gate_wins_over_short_review() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();

    let err = session::submit_review(&conn, &cfg, "ana", 1, ReadingSession::new(5), &long_review(0, 10))
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Reward(RewardError::FraudSuspected { .. })
    ));
}

#[test]
fn unknown_user_and_book_are_store_errors() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();
    let review = long_review(4, 400);

    let err = session::submit_review(&conn, &cfg, "bob", 1, ReadingSession::new(240), &review)
        .unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::UserNotFound(_))));

    let err = session::submit_review(&conn, &cfg, "ana", 42, ReadingSession::new(240), &review)
        .unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::BookNotFound(42))));
}

#[test]
fn duplicate_registration_is_refused() {
    let (_dir, conn) = setup();
    let err = session::register_user(&conn, "ana", "Ana 2", "other@example.com").unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::UserExists(_))));
}

#[test]
fn delete_removes_user_and_history() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();
    session::submit_review(&conn, &cfg, "ana", 1, ReadingSession::new(240), &long_review(5, 520))
        .unwrap();

    session::delete_user(&conn, "ana").unwrap();
    assert!(conn.load("ana").unwrap().is_none());
    assert!(repository::reading_history(&conn, "ana").unwrap().is_empty());
    assert!(session::delete_user(&conn, "ana").is_err());
}

#[test]
fn login_refreshes_last_login_only() {
    let (_dir, conn) = setup();
    let before = conn.load("ana").unwrap().unwrap();
    let after = session::login(&conn, "ana").unwrap();
    assert_eq!(after.registered_at, before.registered_at);
    assert!(after.last_login >= before.last_login);
    assert_eq!(after.balance, before.balance);
}

#[test]
fn completed_book_cannot_be_scored_again() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();
    session::submit_review(&conn, &cfg, "ana", 1, ReadingSession::new(240), &long_review(5, 520))
        .unwrap();

    let err = session::submit_review(&conn, &cfg, "ana", 1, ReadingSession::new(240), &long_review(5, 520))
        .unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::BookAlreadyCompleted(1))));

    // The other strategy is refused too.
    let err = session::submit_quiz(&conn, &cfg, "ana", 1, ReadingSession::new(360), &AnswerSet::new())
        .unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::BookAlreadyCompleted(1))));

    let user = conn.load("ana").unwrap().unwrap();
    assert!((user.balance - 54.0).abs() < EPS);
    assert_eq!(user.books_read, 1);
    assert_eq!(repository::reading_history(&conn, "ana").unwrap().len(), 1);
}

#[test]
fn rejected_attempt_does_not_complete_the_book() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();
    session::submit_review(&conn, &cfg, "ana", 1, ReadingSession::new(10), &long_review(5, 520))
        .unwrap_err();

    let outcome =
        session::submit_review(&conn, &cfg, "ana", 1, ReadingSession::new(240), &long_review(5, 520))
            .unwrap();
    assert_eq!(outcome.user.books_read, 1);
}

#[test]
fn achievements_unlock_once_per_user() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();

    let first =
        session::submit_review(&conn, &cfg, "ana", 1, ReadingSession::new(240), &long_review(5, 520))
            .unwrap();
    assert_eq!(
        first.new_achievements,
        vec![Achievement::FirstEvaluation, Achievement::SpeedOfLight]
    );

    let second =
        session::submit_review(&conn, &cfg, "ana", 2, ReadingSession::new(600), &long_review(5, 520))
            .unwrap();
    assert!(second.new_achievements.is_empty());

    let stored = repository::list_achievements(&conn, "ana").unwrap();
    assert_eq!(stored.len(), 2);

    let history = repository::reading_history(&conn, "ana").unwrap();
    assert_eq!(history[0].rating, Some(5));
}

#[test]
fn fraud_only_history_unlocks_nothing() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();
    session::submit_review(&conn, &cfg, "ana", 1, ReadingSession::new(10), &long_review(5, 520))
        .unwrap_err();
    assert!(repository::list_achievements(&conn, "ana").unwrap().is_empty());
}

#[test]
fn profile_update_changes_contact_fields_only() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();
    session::submit_review(&conn, &cfg, "ana", 1, ReadingSession::new(240), &long_review(5, 520))
        .unwrap();

    let updated = session::update_profile(
        &conn,
        "ana",
        "  Ana Souza ",
        "ana.souza@example.com",
        Some("(11) 99999-9999"),
    )
    .unwrap();
    assert_eq!(updated.name, "Ana Souza");
    assert_eq!(updated.phone.as_deref(), Some("(11) 99999-9999"));
    assert!((updated.balance - 54.0).abs() < EPS);
    assert_eq!(updated.books_read, 1);
    assert_eq!(conn.load("ana").unwrap().unwrap(), updated);

    let cleared = session::update_profile(&conn, "ana", "Ana", "ana@example.com", Some("  ")).unwrap();
    assert_eq!(cleared.phone, None);
}

#[test]
fn profile_update_rejects_bad_email_and_keeps_record() {
    let (_dir, conn) = setup();
    let before = conn.load("ana").unwrap().unwrap();

    let err = session::update_profile(&conn, "ana", "Ana", "not-an-email", None).unwrap_err();
    assert!(matches!(err, SessionError::Reward(RewardError::InvalidInput(_))));
    let err = session::update_profile(&conn, "ana", " ", "ana@example.com", None).unwrap_err();
    assert!(matches!(err, SessionError::Reward(RewardError::InvalidInput(_))));
    assert_eq!(conn.load("ana").unwrap().unwrap(), before);

    let err = session::update_profile(&conn, "bob", "Bob", "bob@example.com", None).unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::UserNotFound(_))));
}

#[test]
fn registration_checks_email_shape() {
    let (_dir, conn) = setup();
    let err = session::register_user(&conn, "bob", "Bob", "bob@localhost").unwrap_err();
    assert!(matches!(err, SessionError::Reward(RewardError::InvalidInput(_))));
    assert!(conn.load("bob").unwrap().is_none());
}

fn ordered(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(q, o)| (q.to_string(), o.to_string()))
        .collect()
}

#[test]
fn quiz_retry_within_the_limit_scores_full_points() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();
    let attempts = ordered(&[
        ("question1", "a"),
        ("question2", "a"),
        ("question2", "b"),
        ("question3", "a"),
        ("rating1", "a"),
        ("rating2", "a"),
        ("rating3", "a"),
    ]);

    let outcome =
        session::submit_quiz_attempts(&conn, &cfg, "ana", 1, ReadingSession::new(360), &attempts)
            .unwrap();
    assert_eq!(outcome.reward.total_points, 170);
    assert!((outcome.reward.monetary_value - 159.375).abs() < EPS);
    assert_eq!(outcome.reward.strategy(), StrategyKind::PointsAccumulation);

    let history = repository::reading_history(&conn, "ana").unwrap();
    assert_eq!(history[0].strategy, StrategyKind::PointsAccumulation);
    assert_eq!(history[0].rating, None);
}

#[test]
fn quiz_answer_after_exhausted_attempts_is_ignored() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();
    let attempts = ordered(&[
        ("question1", "a"),
        ("question2", "a"),
        ("question2", "a"),
        ("question2", "c"),
        ("question2", "b"),
        ("question3", "a"),
        ("rating1", "a"),
        ("rating2", "a"),
        ("rating3", "a"),
    ]);

    let outcome =
        session::submit_quiz_attempts(&conn, &cfg, "ana", 1, ReadingSession::new(360), &attempts)
            .unwrap();
    assert_eq!(outcome.reward.total_points, 130);
    assert!((outcome.reward.monetary_value - 121.875).abs() < EPS);
}

#[test]
fn quiz_attempt_limit_comes_from_config() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig {
        max_comprehension_attempts: 4,
        ..ScoringConfig::default()
    };
    let attempts = ordered(&[
        ("question2", "a"),
        ("question2", "a"),
        ("question2", "c"),
        ("question2", "b"),
    ]);

    let outcome =
        session::submit_quiz_attempts(&conn, &cfg, "ana", 1, ReadingSession::new(360), &attempts)
            .unwrap();
    // 40 for question2 plus the 10-point time bonus.
    assert_eq!(outcome.reward.total_points, 50);
}

#[test]
fn quiz_attempts_hit_the_gate_before_replay() {
    let (_dir, conn) = setup();
    let cfg = ScoringConfig::default();
    let attempts = ordered(&[("question9", "z")]);

    let err = session::submit_quiz_attempts(&conn, &cfg, "ana", 1, ReadingSession::new(12), &attempts)
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Reward(RewardError::FraudSuspected { elapsed_seconds: 12 })
    ));
}
