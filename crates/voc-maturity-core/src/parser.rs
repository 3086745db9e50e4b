//! Questionnaire loading and validation.
//!
//! Questionnaires are written in TOML. The older JSON layout
//! (`{ "questions": [...], "results": [...] }`, options without scoring keys)
//! is still accepted. Parsing and validation are separate steps:
//! [`load_questionnaire`] does both and fails on the first structural
//! problem, [`validate_questionnaire`] lists every problem.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{AnswerOption, FlowPolicy, Question, Questionnaire, ResultTier, TierRange};
use crate::scoring::ScoreTable;

/// Tolerance when comparing tier bounds.
const BOUND_EPSILON: f64 = 1e-9;

/// Intermediate TOML structure for parsing questionnaire files.
#[derive(Debug, Deserialize)]
struct TomlQuestionnaireFile {
    questionnaire: TomlHeader,
    #[serde(default)]
    policy: FlowPolicy,
    #[serde(default)]
    weights: Option<ScoreTable>,
    /// Options used by every question that lists none of its own.
    #[serde(default)]
    default_options: Vec<RawOption>,
    #[serde(default)]
    questions: Vec<RawQuestion>,
    #[serde(default)]
    tiers: Vec<RawTier>,
}

#[derive(Debug, Deserialize)]
struct TomlHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    instructions: Vec<String>,
}

/// Intermediate JSON structure for the older `data.json` layout.
#[derive(Debug, Deserialize)]
struct JsonQuestionnaireFile {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    instructions: Vec<String>,
    #[serde(default)]
    policy: FlowPolicy,
    #[serde(default)]
    weights: Option<ScoreTable>,
    #[serde(default)]
    questions: Vec<RawQuestion>,
    #[serde(default)]
    results: Vec<RawTier>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    id: Option<RawId>,
    title: String,
    #[serde(default)]
    options: Vec<RawOption>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawOption {
    id: RawId,
    #[serde(default)]
    key: Option<String>,
    text: String,
}

#[derive(Debug, Deserialize)]
struct RawTier {
    range: [f64; 2],
    level: RawId,
    name: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    description: String,
}

/// IDs and levels appear as numbers in older documents.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

impl From<RawOption> for AnswerOption {
    fn from(raw: RawOption) -> Self {
        AnswerOption {
            id: raw.id.into(),
            key: raw.key,
            text: raw.text,
        }
    }
}

impl From<RawTier> for ResultTier {
    fn from(raw: RawTier) -> Self {
        ResultTier {
            range: TierRange::from(raw.range),
            level: raw.level.into(),
            name: raw.name,
            icon: raw.icon,
            description: raw.description,
        }
    }
}

fn build_questions(raw: Vec<RawQuestion>, default_options: &[RawOption]) -> Vec<Question> {
    raw.into_iter()
        .enumerate()
        .map(|(i, q)| {
            let options = if q.options.is_empty() {
                default_options.to_vec()
            } else {
                q.options
            };
            Question {
                id: q.id.map(String::from).unwrap_or_else(|| format!("q{}", i + 1)),
                title: q.title,
                options: options.into_iter().map(AnswerOption::from).collect(),
            }
        })
        .collect()
}

/// Parse a questionnaire file, choosing the format from its extension.
///
/// The result is not validated; see [`load_questionnaire`].
pub fn parse_questionnaire(path: &Path) -> Result<Questionnaire> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read questionnaire file: {}", path.display()))?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => parse_questionnaire_str(&content, path),
        Some("json") => parse_legacy_json_str(&content, path),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string()).into()),
    }
}

/// Parse a TOML string into a `Questionnaire` (useful for testing).
pub fn parse_questionnaire_str(content: &str, source_path: &Path) -> Result<Questionnaire> {
    let parsed: TomlQuestionnaireFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(Questionnaire {
        id: parsed.questionnaire.id,
        title: parsed.questionnaire.title,
        description: parsed.questionnaire.description,
        instructions: parsed.questionnaire.instructions,
        questions: build_questions(parsed.questions, &parsed.default_options),
        tiers: parsed.tiers.into_iter().map(ResultTier::from).collect(),
        weights: parsed.weights.unwrap_or_default(),
        policy: parsed.policy,
    })
}

/// Parse the older JSON layout.
///
/// These documents carry no scoring keys, so unless the document brings its
/// own `weights`, options are scored on their display text with
/// [`ScoreTable::legacy_labels`].
pub fn parse_legacy_json_str(content: &str, source_path: &Path) -> Result<Questionnaire> {
    let parsed: JsonQuestionnaireFile = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;

    let stem = source_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("questionnaire")
        .to_string();

    Ok(Questionnaire {
        id: parsed.id.unwrap_or_else(|| stem.clone()),
        title: parsed.title.unwrap_or(stem),
        description: parsed.description,
        instructions: parsed.instructions,
        questions: build_questions(parsed.questions, &[]),
        tiers: parsed.results.into_iter().map(ResultTier::from).collect(),
        weights: parsed.weights.unwrap_or_else(ScoreTable::legacy_labels),
        policy: parsed.policy,
    })
}

/// Parse and validate a questionnaire, failing on the first structural
/// problem.
pub fn load_questionnaire(path: &Path) -> Result<Questionnaire> {
    let questionnaire = parse_questionnaire(path)?;
    check_questionnaire(&questionnaire)
        .with_context(|| format!("invalid questionnaire: {}", path.display()))?;
    tracing::debug!(
        id = %questionnaire.id,
        questions = questionnaire.question_count(),
        tiers = questionnaire.tiers.len(),
        "questionnaire loaded"
    );
    Ok(questionnaire)
}

/// Parse every `.toml` and `.json` questionnaire under `dir`, recursively.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_questionnaire_directory(dir: &Path) -> Result<Vec<(PathBuf, Questionnaire)>> {
    let mut found = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            found.extend(load_questionnaire_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_questionnaire(&path) {
                Ok(q) => found.push((path, q)),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found)
}

/// First structural problem, if any.
pub fn check_questionnaire(questionnaire: &Questionnaire) -> Result<(), ConfigError> {
    match validate_questionnaire(questionnaire).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Every structural problem that makes a questionnaire unusable.
pub fn validate_questionnaire(questionnaire: &Questionnaire) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if questionnaire.questions.is_empty() {
        errors.push(ConfigError::NoQuestions);
    }

    let mut seen_questions = HashSet::new();
    for question in &questionnaire.questions {
        if !seen_questions.insert(question.id.as_str()) {
            errors.push(ConfigError::DuplicateQuestionId(question.id.clone()));
        }
        if question.options.is_empty() {
            errors.push(ConfigError::QuestionWithoutOptions {
                question_id: question.id.clone(),
            });
        }
        let mut seen_options = HashSet::new();
        for option in &question.options {
            if !seen_options.insert(option.id.as_str()) {
                errors.push(ConfigError::DuplicateOptionId {
                    question_id: question.id.clone(),
                    option_id: option.id.clone(),
                });
            }
        }
    }

    for (key, weight) in questionnaire.weights.iter() {
        if !weight.is_finite() || weight < 0.0 {
            errors.push(ConfigError::InvalidWeight {
                key: key.to_string(),
                weight,
            });
        }
    }

    errors.extend(validate_tiers(questionnaire));
    errors
}

fn validate_tiers(questionnaire: &Questionnaire) -> Vec<ConfigError> {
    let tiers = &questionnaire.tiers;
    let mut errors = Vec::new();

    let (Some(first), Some(last)) = (tiers.first(), tiers.last()) else {
        errors.push(ConfigError::NoTiers);
        return errors;
    };

    // NaN compares false everywhere, so the range checks below would pass it.
    // An infinite upper bound is allowed.
    for tier in tiers {
        let TierRange { low, high } = tier.range;
        if !low.is_finite() || high.is_nan() {
            errors.push(ConfigError::NonFiniteBound {
                name: tier.name.clone(),
                low,
                high,
            });
        }
    }
    if !errors.is_empty() {
        return errors;
    }

    for tier in tiers {
        if tier.range.is_empty() {
            errors.push(ConfigError::EmptyRange {
                name: tier.name.clone(),
                low: tier.range.low,
                high: tier.range.high,
            });
        }
    }

    for pair in tiers.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        let end = previous.range.high;
        let start = next.range.low;
        if start < previous.range.low {
            errors.push(ConfigError::TierOutOfOrder {
                previous: previous.name.clone(),
                next: next.name.clone(),
                previous_start: previous.range.low,
                start,
            });
        } else if start > end + BOUND_EPSILON {
            errors.push(ConfigError::TierGap {
                previous: previous.name.clone(),
                next: next.name.clone(),
                end,
                start,
            });
        } else if start < end - BOUND_EPSILON {
            errors.push(ConfigError::TierOverlap {
                previous: previous.name.clone(),
                next: next.name.clone(),
                end,
                start,
            });
        }
    }

    // Scores are sums of non-negative weights: [0, max_score] must be covered,
    // and the top bound is exclusive.
    let max_score = questionnaire.max_score();
    if first.range.low > BOUND_EPSILON || last.range.high <= max_score {
        errors.push(ConfigError::DomainNotCovered {
            low: first.range.low,
            high: last.range.high,
            max_score,
        });
    }

    errors
}

/// A non-fatal issue found while linting a questionnaire.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a questionnaire for issues that are legal but probably unintended.
pub fn lint_questionnaire(questionnaire: &Questionnaire) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for question in &questionnaire.questions {
        if question.options.len() == 1 {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: "question has a single option".into(),
            });
        }

        for option in &question.options {
            let key = option.scoring_key();
            if !questionnaire.weights.contains_key(key) {
                warnings.push(ValidationWarning {
                    question_id: Some(question.id.clone()),
                    message: format!(
                        "option '{}' uses key '{key}' which has no weight and will score 0",
                        option.id
                    ),
                });
            }
        }

        if question.title.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: "title is empty".into(),
            });
        }
    }

    for tier in &questionnaire.tiers {
        if tier.name.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!("tier at level {} has no name", tier.level),
            });
        }
    }

    warnings
}
