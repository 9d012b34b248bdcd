// src/quiz.rs

use crate::error::RewardError;
use crate::models::{AnswerSet, QuizDefinition};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AnswerFeedback {
    Correct,
    Incorrect { attempts_left: u32 },
    /// Out of retries; the last answer stands and the flow may move on.
    Exhausted,
    /// Opinion answers have no wrong option.
    Recorded,
}

/// Answers collected while a reader walks through one quiz.
pub struct QuizProgress<'a> {
    quiz: &'a QuizDefinition,
    max_attempts: u32,
    answers: AnswerSet,
    misses: HashMap<String, u32>,
}

impl<'a> QuizProgress<'a> {
    pub fn new(quiz: &'a QuizDefinition, max_attempts: u32) -> Self {
        QuizProgress {
            quiz,
            max_attempts,
            answers: AnswerSet::new(),
            misses: HashMap::new(),
        }
    }

    pub fn answer(&mut self, question_id: &str, option_id: &str) -> Result<AnswerFeedback, RewardError> {
        if let Some(q) = self.quiz.find_comprehension(question_id) {
            if !q.has_option(option_id) {
                return Err(RewardError::invalid(format!(
                    "question '{}' has no option '{}'",
                    question_id, option_id
                )));
            }
            if self.is_settled(question_id) {
                debug!("Question {} already settled, ignoring new answer", question_id);
                return Ok(self.settled_feedback(question_id));
            }

            self.answers.insert(question_id.to_string(), option_id.to_string());
            let correct = q.correct_option().is_some_and(|o| o.id == option_id);
            if correct {
                return Ok(AnswerFeedback::Correct);
            }

            let misses = self.misses.entry(question_id.to_string()).or_insert(0);
            *misses += 1;
            if *misses >= self.max_attempts {
                warn!("Attempts exhausted for question {}", question_id);
                Ok(AnswerFeedback::Exhausted)
            } else {
                Ok(AnswerFeedback::Incorrect {
                    attempts_left: self.max_attempts - *misses,
                })
            }
        } else if let Some(q) = self.quiz.find_opinion(question_id) {
            if q.option(option_id).is_none() {
                return Err(RewardError::invalid(format!(
                    "question '{}' has no option '{}'",
                    question_id, option_id
                )));
            }
            self.answers.insert(question_id.to_string(), option_id.to_string());
            Ok(AnswerFeedback::Recorded)
        } else {
            Err(RewardError::invalid(format!("unknown question '{}'", question_id)))
        }
    }

    /// Whether the flow may move past `question_id`.
    pub fn can_advance(&self, question_id: &str) -> bool {
        if self.quiz.is_comprehension(question_id) {
            self.is_settled(question_id)
        } else {
            self.answers.contains_key(question_id)
        }
    }

    pub fn misses(&self, question_id: &str) -> u32 {
        self.misses.get(question_id).copied().unwrap_or(0)
    }

    pub fn into_answers(self) -> AnswerSet {
        self.answers
    }

    fn is_settled(&self, question_id: &str) -> bool {
        self.is_correct(question_id) || self.misses(question_id) >= self.max_attempts
    }

    fn is_correct(&self, question_id: &str) -> bool {
        match (
            self.quiz.find_comprehension(question_id),
            self.answers.get(question_id),
        ) {
            (Some(q), Some(chosen)) => q.correct_option().is_some_and(|o| &o.id == chosen),
            _ => false,
        }
    }

    fn settled_feedback(&self, question_id: &str) -> AnswerFeedback {
        if self.is_correct(question_id) {
            AnswerFeedback::Correct
        } else {
            AnswerFeedback::Exhausted
        }
    }
}

/// Replays answers in the order they were given and returns the answers
/// that count. Once a comprehension question is answered correctly or runs
/// out of attempts, later answers to it are ignored. A question still open
/// at the end keeps its last (wrong) answer.
pub fn replay(
    quiz: &QuizDefinition,
    max_attempts: u32,
    attempts: &[(String, String)],
) -> Result<AnswerSet, RewardError> {
    let mut progress = QuizProgress::new(quiz, max_attempts);
    for (question_id, option_id) in attempts {
        let feedback = progress.answer(question_id, option_id)?;
        debug!("[Quiz] {} = {} -> {:?}", question_id, option_id, feedback);
    }
    for q in &quiz.comprehension {
        if progress.answers.contains_key(&q.id) && !progress.can_advance(&q.id) {
            warn!(
                "Question {} left open after {} miss(es), last answer stands",
                q.id,
                progress.misses(&q.id)
            );
        }
    }
    Ok(progress.into_answers())
}
