//! voc-maturity CLI: run and inspect maturity self-assessments.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "voc-maturity",
    version,
    about = "Voice of the Customer maturity self-assessment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take the assessment interactively
    Take {
        /// Questionnaire file (.toml or legacy .json)
        #[arg(long)]
        questionnaire: PathBuf,

        /// Save the JSON report here once scored
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Score a list of answers without prompting
    Score {
        /// Questionnaire file (.toml or legacy .json)
        #[arg(long)]
        questionnaire: PathBuf,

        /// Option IDs in question order, comma-separated; "-" skips a question
        #[arg(long, allow_hyphen_values = true)]
        answers: String,

        /// Email to record in the report
        #[arg(long)]
        email: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Save the JSON report here
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the result tiers of a questionnaire
    Tiers {
        /// Questionnaire file (.toml or legacy .json)
        #[arg(long)]
        questionnaire: PathBuf,
    },

    /// Validate questionnaire files
    Validate {
        /// Path to a questionnaire file or directory
        #[arg(long)]
        questionnaire: PathBuf,
    },

    /// Create a starter questionnaire
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("voc_maturity_core=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            questionnaire,
            output,
        } => commands::take::execute(questionnaire, output),
        Commands::Score {
            questionnaire,
            answers,
            email,
            format,
            output,
        } => commands::score::execute(questionnaire, answers, email, format, output),
        Commands::Tiers { questionnaire } => commands::tiers::execute(questionnaire),
        Commands::Validate { questionnaire } => commands::validate::execute(questionnaire),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
