//! thesis CLI - Main entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thesis::ThesisConfig;
use thesis::commands::{assemble, bib, diagnostic_error, render_error};

#[derive(Parser)]
#[command(name = "thesis")]
#[command(about = "Merge article bibliographies and assemble their LaTeX sources into one thesis")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to thesis.yml in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print diagnostics as JSON lines on stderr
    #[arg(long, global = true)]
    json_errors: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with bibliography databases
    Bib {
        #[command(subcommand)]
        command: BibCommands,
    },

    /// Inline, namespace and rewrite LaTeX documents
    Assemble(assemble::AssembleArgs),
}

#[derive(Subcommand)]
enum BibCommands {
    /// Combine bibliographies into one database
    Merge(bib::MergeArgs),

    /// List duplicate and near-duplicate records
    Report(bib::ReportArgs),
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thesis=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", render_error(&e, json_errors));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let working_dir = std::env::current_dir()?;
    let config = ThesisConfig::load(cli.config.as_deref(), &working_dir)
        .map_err(|e| diagnostic_error(e.to_diagnostic()))?;

    match cli.command {
        Commands::Bib {
            command: BibCommands::Merge(args),
        } => {
            let summary = bib::merge(&config, &args)?;
            bib::print_merge(&summary, cli.json_errors);
        }
        Commands::Bib {
            command: BibCommands::Report(args),
        } => {
            let report = bib::report(&config, &args)?;
            bib::print_report(&report, args.json)?;
        }
        Commands::Assemble(args) => {
            let summary = assemble::assemble(&config, &args)?;
            assemble::print_assembly(&summary);
        }
    }

    Ok(())
}
