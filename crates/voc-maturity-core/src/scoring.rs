//! Answer scoring and result-tier resolution.
//!
//! Scoring is deliberately lenient: an unanswered slot, or a key the
//! [`ScoreTable`] does not know, contributes [`NEGATIVE_WEIGHT`]. Nothing in
//! this module fails; a score no tier covers comes back as `tier: None`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerSet, Questionnaire, ResultTier};

/// Weight used for unanswered slots and unmapped keys.
pub const NEGATIVE_WEIGHT: f64 = 0.0;

/// Mapping from scoring key to weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreTable {
    weights: BTreeMap<String, f64>,
}

impl Default for ScoreTable {
    /// `yes` → 1.0, `unsure` → 0.5, `no` → 0.0.
    fn default() -> Self {
        Self::from_pairs([("yes", 1.0), ("unsure", 0.5), ("no", 0.0)])
    }
}

impl ScoreTable {
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            weights: pairs.into_iter().map(|(k, w)| (k.into(), w)).collect(),
        }
    }

    /// Table keyed on the display labels of documents without scoring keys.
    pub fn legacy_labels() -> Self {
        Self::from_pairs([("Có", 1.0), ("Không rõ", 0.5), ("Không", 0.0)])
    }

    /// Weight for an answer slot. Absent and unmapped keys weigh
    /// [`NEGATIVE_WEIGHT`].
    pub fn weight_of(&self, key: Option<&str>) -> f64 {
        key.and_then(|k| self.weights.get(k))
            .copied()
            .unwrap_or(NEGATIVE_WEIGHT)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.weights.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, w)| (k.as_str(), *w))
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Sum of the weights of every slot.
pub fn compute_score(answers: &AnswerSet, table: &ScoreTable) -> f64 {
    answers
        .slots()
        .iter()
        .map(|slot| table.weight_of(slot.as_deref()))
        .sum()
}

/// First tier, in table order, whose half-open range contains `score`.
pub fn resolve_tier(score: f64, tiers: &[ResultTier]) -> Option<&ResultTier> {
    tiers.iter().find(|t| t.range.contains(score))
}

/// A scored answer set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub score: f64,
    /// Highest achievable score for the questionnaire.
    pub max_score: f64,
    /// `score / max_score` clamped to `[0, 1]`.
    pub gauge: f64,
    /// `None` when no tier covers the score.
    pub tier: Option<ResultTier>,
}

impl Outcome {
    pub fn has_tier(&self) -> bool {
        self.tier.is_some()
    }
}

/// Score `answers` against `questionnaire` and resolve its tier.
pub fn score_answers(questionnaire: &Questionnaire, answers: &AnswerSet) -> Outcome {
    let score = compute_score(answers, &questionnaire.weights);
    let max_score = questionnaire.max_score();
    let gauge = if max_score > 0.0 {
        (score / max_score).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let tier = resolve_tier(score, &questionnaire.tiers).cloned();

    match &tier {
        Some(t) => tracing::info!(score, max_score, level = %t.level, "resolved result tier"),
        None => tracing::warn!(score, max_score, "score is not covered by any result tier"),
    }

    Outcome {
        score,
        max_score,
        gauge,
        tier,
    }
}
