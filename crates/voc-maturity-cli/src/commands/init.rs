//! The `voc-maturity init` command.

use std::path::Path;

use anyhow::Result;

const STARTER_QUESTIONNAIRE: &str = include_str!("../../../../questionnaires/voc-maturity.toml");

pub fn execute() -> Result<()> {
    let path = Path::new("questionnaire.toml");
    if path.exists() {
        println!("questionnaire.toml already exists, skipping.");
    } else {
        std::fs::write(path, STARTER_QUESTIONNAIRE)?;
        println!("Created questionnaire.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit questions and tiers in questionnaire.toml");
    println!("  2. Run: voc-maturity validate --questionnaire questionnaire.toml");
    println!("  3. Run: voc-maturity take --questionnaire questionnaire.toml");

    Ok(())
}
