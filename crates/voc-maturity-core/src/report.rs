//! Assessment report with JSON persistence.
//!
//! This is the "download" of a finished session: everything needed to show
//! the result again later, without the questionnaire itself.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{AnswerSet, Questionnaire, ResultTier};
use crate::scoring::Outcome;

/// A finished assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// Session that produced the report.
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub questionnaire: QuestionnaireSummary,
    /// Email captured on the welcome screen; empty if none was given.
    #[serde(default)]
    pub email: String,
    pub answers: Vec<AnswerRecord>,
    pub score: f64,
    pub max_score: f64,
    pub gauge: f64,
    /// `None` when no tier covered the score.
    pub tier: Option<ResultTier>,
}

/// Summary of a questionnaire (without the full question text).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireSummary {
    pub id: String,
    pub title: String,
    pub question_count: usize,
}

/// One answered (or skipped) question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    /// Recorded scoring key, `None` if skipped.
    pub key: Option<String>,
    /// Display text of the chosen option.
    pub text: Option<String>,
    pub weight: f64,
}

impl AssessmentReport {
    pub fn new(
        session_id: Uuid,
        questionnaire: &Questionnaire,
        email: &str,
        answers: &AnswerSet,
        outcome: &Outcome,
    ) -> Self {
        let answers = questionnaire
            .questions
            .iter()
            .enumerate()
            .map(|(i, question)| {
                let key = answers.get(i);
                AnswerRecord {
                    question_id: question.id.clone(),
                    key: key.map(str::to_string),
                    text: key
                        .and_then(|k| question.option_by_key(k))
                        .map(|o| o.text.clone()),
                    weight: questionnaire.weights.weight_of(key),
                }
            })
            .collect();

        Self {
            session_id,
            created_at: Utc::now(),
            questionnaire: QuestionnaireSummary {
                id: questionnaire.id.clone(),
                title: questionnaire.title.clone(),
                question_count: questionnaire.question_count(),
            },
            email: email.to_string(),
            answers,
            score: outcome.score,
            max_score: outcome.max_score,
            gauge: outcome.gauge,
            tier: outcome.tier.clone(),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AssessmentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// One-line summary, e.g. `score 7.5 / 10: level 4 (Proactive)`.
    pub fn headline(&self) -> String {
        match &self.tier {
            Some(tier) => format!(
                "score {} / {}: level {} ({})",
                self.score, self.max_score, tier.level, tier.name
            ),
            None => format!("score {} / {}: no matching tier", self.score, self.max_score),
        }
    }
}
