//! The `voc-maturity tiers` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use voc_maturity_core::parser::load_questionnaire;

pub fn execute(questionnaire_path: PathBuf) -> Result<()> {
    let questionnaire = load_questionnaire(&questionnaire_path)?;

    let mut table = Table::new();
    table.set_header(vec!["Level", "Name", "Score range", "Icon"]);
    for tier in &questionnaire.tiers {
        table.add_row(vec![
            Cell::new(&tier.level),
            Cell::new(&tier.name),
            Cell::new(format!("[{}, {})", tier.range.low, tier.range.high)),
            Cell::new(&tier.icon),
        ]);
    }

    println!("{}", questionnaire.title);
    println!("{table}");
    println!("Max score: {}", questionnaire.max_score());

    Ok(())
}
