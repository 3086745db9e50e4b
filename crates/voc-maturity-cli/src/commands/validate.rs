//! The `voc-maturity validate` command.

use std::path::PathBuf;

use anyhow::{bail, Result};

use voc_maturity_core::parser::{
    lint_questionnaire, load_questionnaire_directory, parse_questionnaire, validate_questionnaire,
};

pub fn execute(questionnaire_path: PathBuf) -> Result<()> {
    let found = if questionnaire_path.is_dir() {
        load_questionnaire_directory(&questionnaire_path)?
    } else {
        vec![(
            questionnaire_path.clone(),
            parse_questionnaire(&questionnaire_path)?,
        )]
    };

    if found.is_empty() {
        bail!("no questionnaires found in {}", questionnaire_path.display());
    }

    let mut total_errors = 0;
    let mut total_warnings = 0;

    for (path, questionnaire) in &found {
        println!(
            "Questionnaire: {} ({} questions, {} tiers, max score {})",
            questionnaire.title,
            questionnaire.question_count(),
            questionnaire.tiers.len(),
            questionnaire.max_score()
        );
        tracing::debug!(path = %path.display(), id = %questionnaire.id, "validating");

        let errors = validate_questionnaire(questionnaire);
        for e in &errors {
            println!("  ERROR: {e}");
        }
        total_errors += errors.len();

        let warnings = lint_questionnaire(questionnaire);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_errors > 0 {
        bail!("{total_errors} error(s) found");
    }

    if total_warnings == 0 {
        println!("All questionnaires valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
