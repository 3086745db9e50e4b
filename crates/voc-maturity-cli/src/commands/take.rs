//! The `voc-maturity take` command.
//!
//! Walks a session screen by screen over stdin/stdout. Reaching end of input
//! before the result screen is an error; after it, end of input just quits.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};

use voc_maturity_core::error::FlowError;
use voc_maturity_core::flow::{Action, ScreenView, Session};
use voc_maturity_core::parser::load_questionnaire;

use super::score::print_outcome;

pub fn execute(questionnaire_path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let questionnaire = Arc::new(load_questionnaire(&questionnaire_path)?);
    let mut session = Session::new(questionnaire);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run(&mut session, &mut stdin.lock(), &mut stdout.lock())?;

    if let Some(path) = output {
        match session.report() {
            Some(report) => {
                report.save_json(&path)?;
                println!("Report saved to {}", path.display());
            }
            None => tracing::warn!("session ended without a result, no report written"),
        }
    }

    Ok(())
}

/// Drive `session` until the user quits or finishes sharing.
fn run(session: &mut Session, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    loop {
        let action = match session.view() {
            ScreenView::Welcome {
                title,
                description,
                email,
            } => {
                writeln!(out, "\n{title}")?;
                if !description.is_empty() {
                    writeln!(out, "{description}")?;
                }
                if email.is_empty() {
                    let Some(line) = prompt(input, out, "Your email (optional): ")? else {
                        bail!("input ended before the assessment started");
                    };
                    if !line.is_empty() {
                        session.apply(Action::SetEmail(line))?;
                    }
                }
                Action::Start
            }
            ScreenView::Instructions {
                question_count,
                lines,
            } => {
                writeln!(out, "\nThere are {question_count} question(s).")?;
                for line in lines {
                    writeln!(out, "  - {line}")?;
                }
                if prompt(input, out, "Press Enter to begin. ")?.is_none() {
                    bail!("input ended before the first question");
                }
                Action::Begin
            }
            ScreenView::Question {
                number,
                total,
                question,
                selected,
                can_go_back,
            } => {
                writeln!(out, "\nQuestion {number}/{total}: {}", question.title)?;
                for (i, option) in question.options.iter().enumerate() {
                    let marker = if selected == Some(option.scoring_key()) {
                        "*"
                    } else {
                        " "
                    };
                    writeln!(out, " {marker}{}. {}", i + 1, option.text)?;
                }
                let hint = if can_go_back {
                    format!("Choose 1-{}, Enter to skip, b to go back: ", question.options.len())
                } else {
                    format!("Choose 1-{}, Enter to skip: ", question.options.len())
                };
                let Some(line) = prompt(input, out, &hint)? else {
                    bail!("input ended at question {number}");
                };
                match line.as_str() {
                    "" | "n" => Action::Next,
                    "b" => Action::Back,
                    choice => match choice
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| question.options.get(i))
                    {
                        Some(option) => Action::SelectOption(option.id.clone()),
                        None => {
                            writeln!(out, "'{choice}' is not one of the listed answers.")?;
                            continue;
                        }
                    },
                }
            }
            ScreenView::ReadyToScore { answered, total } => {
                writeln!(out, "\nYou answered {answered} of {total} question(s).")?;
                if prompt(input, out, "Press Enter to see your result. ")?.is_none() {
                    bail!("input ended before scoring");
                }
                Action::Compute
            }
            ScreenView::Result { outcome } => {
                writeln!(out)?;
                print_outcome(out, outcome)?;
                let Some(line) = prompt(input, out, "s to share, r to start over, q to quit: ")?
                else {
                    return Ok(());
                };
                match line.as_str() {
                    "s" => Action::Share,
                    "r" => {
                        session.reset();
                        continue;
                    }
                    "q" | "" => return Ok(()),
                    other => {
                        writeln!(out, "Unknown choice '{other}'.")?;
                        continue;
                    }
                }
            }
            ScreenView::ShareMenu { .. } => {
                writeln!(out, "\nShare your result:")?;
                writeln!(out, "  1. By email")?;
                match prompt(input, out, "Choose 1, or q to quit: ")?.as_deref() {
                    Some("1") => Action::ShareViaEmail,
                    Some("q") | None => return Ok(()),
                    Some(other) => {
                        writeln!(out, "Unknown choice '{other}'.")?;
                        continue;
                    }
                }
            }
            ScreenView::ShareEmail { recipients, .. } => {
                match prompt(input, out, "Recipient email (blank to finish): ")? {
                    Some(address) if !address.is_empty() => Action::AddRecipient(address),
                    _ => {
                        if recipients.is_empty() {
                            writeln!(out, "No recipients added.")?;
                        } else {
                            writeln!(out, "Result will be shared with: {}", recipients.join(", "))?;
                        }
                        return Ok(());
                    }
                }
            }
        };

        match session.apply(action) {
            Ok(_) => {}
            // Recoverable: the user can type a different answer.
            Err(err @ (FlowError::EmailRequired | FlowError::UnknownOption { .. })) => {
                writeln!(out, "{err}")?;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Print `text` and read one trimmed line. `None` at end of input.
fn prompt(input: &mut impl BufRead, out: &mut impl Write, text: &str) -> Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
