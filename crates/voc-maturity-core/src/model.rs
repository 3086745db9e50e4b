//! Core data model types for voc-maturity.
//!
//! A [`Questionnaire`] is static configuration: it is loaded once, validated,
//! and shared read-only by every session. The only mutable piece of the model
//! is the [`AnswerSet`] a session fills in.

use serde::{Deserialize, Serialize};

use crate::scoring::ScoreTable;

/// One selectable answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Identifier unique within the owning question.
    pub id: String,
    /// Stable scoring key looked up in the [`ScoreTable`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Label shown to the user.
    pub text: String,
}

impl AnswerOption {
    /// The key this option contributes to the answer set.
    ///
    /// Documents that predate explicit keys score on the display text.
    pub fn scoring_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.text)
    }
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// Look up an option by its ID.
    pub fn option(&self, option_id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Look up the option that contributes `key` to the answer set.
    pub fn option_by_key(&self, key: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.scoring_key() == key)
    }
}

/// Half-open score interval `[low, high)`.
///
/// Serialized as a two-element array, e.g. `range = [4.0, 6.5]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct TierRange {
    pub low: f64,
    pub high: f64,
}

impl TierRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, score: f64) -> bool {
        score >= self.low && score < self.high
    }

    pub fn is_empty(&self) -> bool {
        self.high <= self.low
    }
}

impl From<[f64; 2]> for TierRange {
    fn from([low, high]: [f64; 2]) -> Self {
        Self { low, high }
    }
}

impl From<TierRange> for [f64; 2] {
    fn from(range: TierRange) -> Self {
        [range.low, range.high]
    }
}

/// A named result bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTier {
    pub range: TierRange,
    /// Level label, e.g. "3".
    pub level: String,
    pub name: String,
    /// Icon reference handed to the presentation layer untouched.
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
}

/// Switches for the lenient behaviours of the flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPolicy {
    /// Reject `Start` while the captured email is blank.
    #[serde(default)]
    pub require_email: bool,
    /// Reject `Compute` while any question is unanswered.
    #[serde(default)]
    pub require_complete: bool,
}

/// The whole static configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Answering guidance shown before the first question.
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Questions in presentation order.
    pub questions: Vec<Question>,
    /// Result tiers in ranked order.
    pub tiers: Vec<ResultTier>,
    #[serde(default)]
    pub weights: ScoreTable,
    #[serde(default)]
    pub policy: FlowPolicy,
}

impl Questionnaire {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Highest achievable score: every question answered with its
    /// heaviest option.
    pub fn max_score(&self) -> f64 {
        self.questions
            .iter()
            .map(|q| {
                q.options
                    .iter()
                    .map(|o| self.weights.weight_of(Some(o.scoring_key())))
                    .fold(0.0, f64::max)
            })
            .sum()
    }
}

/// The user's recorded choice per question, one slot per question.
///
/// Slots hold scoring keys. The set never grows, shrinks or reorders after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    slots: Vec<Option<String>>,
}

impl AnswerSet {
    /// An all-unanswered set for `len` questions.
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Build a set from explicit slots.
    pub fn from_slots<I, S>(slots: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            slots: slots.into_iter().map(|s| s.map(Into::into)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.slots.get(index).and_then(|s| s.as_deref())
    }

    pub fn slots(&self) -> &[Option<String>] {
        &self.slots
    }

    /// Write `key` into slot `index`. Out-of-range indices are ignored and
    /// reported as `false`.
    pub fn record(&mut self, index: usize, key: &str) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(key.to_string());
                true
            }
            None => false,
        }
    }

    pub fn answered_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// 1-based numbers of the unanswered questions.
    pub fn missing(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i + 1)
            .collect()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }
}
