//! examforge CLI: validate, preview and import exam question files.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use examforge_core::model::Surface;

mod commands;

#[derive(Parser)]
#[command(name = "examforge", version, about = "Exam question authoring and import tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check question JSON against the import rules
    Validate {
        /// Target surface: questions, essays or qcm
        #[arg(long)]
        surface: Surface,

        /// JSON file holding one question or an array of questions
        #[arg(long)]
        file: PathBuf,
    },

    /// Print the normalized submission payload of question JSON
    Preview {
        /// Target surface: questions, essays or qcm
        #[arg(long)]
        surface: Surface,

        /// JSON file holding one question or an array of questions
        #[arg(long)]
        file: PathBuf,
    },

    /// Import question JSON into the store
    Import {
        /// Target surface: questions, essays or qcm
        #[arg(long)]
        surface: Surface,

        /// JSON file to import
        #[arg(long)]
        file: PathBuf,

        /// Exam id (questions, essays) or chapter id (qcm)
        #[arg(long)]
        target: i64,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use an in-memory store instead of the configured one
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the essay grading rubric
    Criteria {
        /// Print as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Create a starter config and a sample QCM file
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "examforge=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { surface, file } => commands::validate::execute(surface, file),
        Commands::Preview { surface, file } => commands::preview::execute(surface, file),
        Commands::Import {
            surface,
            file,
            target,
            config,
            dry_run,
        } => commands::import::execute(surface, file, target, config, dry_run).await,
        Commands::Criteria { json } => commands::criteria::execute(json),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
