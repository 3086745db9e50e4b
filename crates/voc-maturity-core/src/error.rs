//! Error types for questionnaire loading and flow transitions.
//!
//! Configuration errors are fatal at load time: a questionnaire that fails
//! validation never reaches a session. Flow errors reject a single action and
//! leave the session exactly as it was.

use thiserror::Error;

use crate::flow::Screen;

/// A structural problem in a questionnaire document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("questionnaire has no questions")]
    NoQuestions,

    #[error("question '{question_id}' has no options")]
    QuestionWithoutOptions { question_id: String },

    #[error("duplicate question ID: {0}")]
    DuplicateQuestionId(String),

    #[error("duplicate option ID '{option_id}' in question '{question_id}'")]
    DuplicateOptionId {
        question_id: String,
        option_id: String,
    },

    #[error("questionnaire has no result tiers")]
    NoTiers,

    #[error("tier '{name}' has an empty range [{low}, {high})")]
    EmptyRange { name: String, low: f64, high: f64 },

    #[error("tier '{name}' has a non-finite bound [{low}, {high})")]
    NonFiniteBound { name: String, low: f64, high: f64 },

    #[error("tier '{next}' (starts at {start}) is listed after tier '{previous}' (starts at {previous_start}); tiers must be in ascending order")]
    TierOutOfOrder {
        previous: String,
        next: String,
        previous_start: f64,
        start: f64,
    },

    #[error("gap between tier '{previous}' (ends at {end}) and tier '{next}' (starts at {start})")]
    TierGap {
        previous: String,
        next: String,
        end: f64,
        start: f64,
    },

    #[error("tier '{next}' (starts at {start}) overlaps tier '{previous}' (ends at {end})")]
    TierOverlap {
        previous: String,
        next: String,
        end: f64,
        start: f64,
    },

    #[error("tiers cover [{low}, {high}) but achievable scores span [0, {max_score}]")]
    DomainNotCovered { low: f64, high: f64, max_score: f64 },

    #[error("weight for '{key}' must be a finite non-negative number, got {weight}")]
    InvalidWeight { key: String, weight: f64 },

    #[error("unsupported questionnaire format: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),
}

/// A user action the current screen cannot accept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error("action '{action}' is not available on the {screen} screen")]
    InvalidAction { action: &'static str, screen: Screen },

    #[error("question {number} has no option '{option_id}'")]
    UnknownOption { number: usize, option_id: String },

    #[error("an email address is required before starting")]
    EmailRequired,

    #[error("{} question(s) still unanswered: {}", .missing.len(), join_numbers(.missing))]
    IncompleteAnswers { missing: Vec<usize> },
}

fn join_numbers(numbers: &[usize]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
