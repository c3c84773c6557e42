//! sqlgrade CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "sqlgrade", version, about = "SQL assessment and answer grading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a candidate query with a reference solution
    Check {
        /// Candidate SQL
        #[arg(long)]
        candidate: String,

        /// Reference SQL
        #[arg(long)]
        reference: String,

        /// Print both normalized forms
        #[arg(long, short)]
        verbose: bool,

        /// Exit code 1 if the queries do not match
        #[arg(long)]
        fail_on_mismatch: bool,
    },

    /// Print the normalized form of a query
    Normalize {
        /// SQL text
        sql: String,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to question bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Take an assessment interactively
    Take {
        /// Candidate's full name
        #[arg(long)]
        name: String,

        /// Candidate's email address
        #[arg(long)]
        email: String,

        /// Question bank file (overrides config)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Submissions directory (overrides config)
        #[arg(long)]
        submissions: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Ask questions in bank order
        #[arg(long)]
        no_shuffle: bool,
    },

    /// Show saved submissions and aggregate results
    Results {
        /// Submissions directory (overrides config)
        #[arg(long)]
        submissions: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Export format: csv, html
        #[arg(long)]
        export: Option<String>,

        /// Export file path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create starter config and example question bank
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sqlgrade=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            candidate,
            reference,
            verbose,
            fail_on_mismatch,
        } => commands::check::execute(candidate, reference, verbose, fail_on_mismatch),
        Commands::Normalize { sql } => commands::normalize::execute(sql),
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Take {
            name,
            email,
            bank,
            submissions,
            config,
            no_shuffle,
        } => commands::take::execute(name, email, bank, submissions, config, no_shuffle),
        Commands::Results {
            submissions,
            config,
            format,
            export,
            output,
        } => commands::results::execute(submissions, config, format, export, output),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
