//! The `voc-maturity score` command.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};

use voc_maturity_core::flow::{Action, Screen, Session};
use voc_maturity_core::parser::load_questionnaire;
use voc_maturity_core::scoring::Outcome;

const GAUGE_WIDTH: usize = 20;

pub fn execute(
    questionnaire_path: PathBuf,
    answers: String,
    email: Option<String>,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    if !matches!(format.as_str(), "text" | "json") {
        bail!("unknown format '{format}' (expected text or json)");
    }

    let questionnaire = Arc::new(load_questionnaire(&questionnaire_path)?);
    let total = questionnaire.question_count();
    let mut session = Session::new(questionnaire);

    if let Some(email) = email {
        session.apply(Action::SetEmail(email))?;
    }
    session.apply(Action::Start)?;
    session.apply(Action::Begin)?;

    for token in answers.split(',').map(str::trim) {
        if !matches!(session.screen(), Screen::Question { .. }) {
            bail!("too many answers: the questionnaire has {total} question(s)");
        }
        let action = match token {
            "" | "-" => Action::Next,
            option_id => Action::SelectOption(option_id.to_string()),
        };
        session.apply(action)?;
    }

    // Questions past the end of the list stay unanswered.
    while let Screen::Question { index } = session.screen() {
        tracing::debug!(question = index + 1, "no answer given, skipping");
        session.apply(Action::Next)?;
    }

    session.apply(Action::Compute)?;
    let report = session
        .report()
        .ok_or_else(|| anyhow!("session finished without a result"))?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(outcome) = session.outcome() {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", session.questionnaire().title)?;
        writeln!(
            stdout,
            "Answered {} of {total} question(s).",
            session.answers().answered_count()
        )?;
        print_outcome(&mut stdout, outcome)?;
    }

    if let Some(path) = output {
        report.save_json(&path)?;
        eprintln!("Report saved to {}", path.display());
    }

    Ok(())
}

/// Render an outcome as a short text block with a gauge bar.
pub fn print_outcome(out: &mut impl Write, outcome: &Outcome) -> std::io::Result<()> {
    let filled = ((outcome.gauge * GAUGE_WIDTH as f64).round() as usize).min(GAUGE_WIDTH);
    writeln!(
        out,
        "Score: {} / {} [{}{}] {:.0}%",
        outcome.score,
        outcome.max_score,
        "#".repeat(filled),
        "-".repeat(GAUGE_WIDTH - filled),
        outcome.gauge * 100.0
    )?;

    match &outcome.tier {
        Some(tier) => {
            writeln!(out, "Level {}: {}", tier.level, tier.name)?;
            if !tier.description.is_empty() {
                writeln!(out, "{}", tier.description)?;
            }
        }
        None => writeln!(out, "Result: no matching tier for this score.")?,
    }

    Ok(())
}
