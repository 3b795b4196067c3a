// ABOUTME: CLI entry point for table-quirks
// ABOUTME: Parses commands and routes to appropriate handlers

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use table_quirks::commands;

#[derive(Parser)]
#[command(name = "table-quirks")]
#[command(about = "Apply hand-maintained table overrides to an introspected schema model", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every table with an override rule
    Rules {
        /// Path to an override file adding to or replacing built-in rules
        #[arg(long = "config")]
        config_path: Option<PathBuf>,
    },
    /// Apply override rules to a JSON table model
    Apply {
        /// JSON array of introspected tables
        #[arg(long)]
        input: PathBuf,
        /// Write the corrected model here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Path to an override file adding to or replacing built-in rules
        #[arg(long = "config")]
        config_path: Option<PathBuf>,
    },
    /// Check override rules against a JSON table model
    Check {
        /// JSON array of introspected tables
        #[arg(long)]
        input: PathBuf,
        /// Path to an override file adding to or replacing built-in rules
        #[arg(long = "config")]
        config_path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Rules { config_path } => {
            let listing = commands::rules(config_path.as_deref())?;
            println!("{}", listing);
        }
        Commands::Apply {
            input,
            output,
            config_path,
        } => {
            commands::apply(&input, output.as_deref(), config_path.as_deref())?;
        }
        Commands::Check { input, config_path } => {
            commands::check(&input, config_path.as_deref())?;
        }
    }

    Ok(())
}
