//! # cpm CLI entry point
//!
//! Parses arguments, sets up logging and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cpm_cli::completion::{run_completion, CompletionArgs};
use cpm_cli::draw::{run_draw, DrawArgs};
use cpm_cli::init::{run_init, InitArgs};
use cpm_cli::project::ProjectDir;
use cpm_cli::task::{run_task, TaskArgs};

/// Construction project ledger.
///
/// Tracks task approvals, computes completed-work percentage and gates
/// fund draws on the project milestone.
#[derive(Parser, Debug)]
#[command(name = "cpm", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Project directory holding `project.yaml` and `.cpm/`.
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the project configuration.
    Init(InitArgs),

    /// Record tasks and their approvals.
    Task(TaskArgs),

    /// Show completed-work percentage and draw eligibility.
    Completion(CompletionArgs),

    /// Manage fund draws.
    Draw(DrawArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let project = ProjectDir::new(&cli.project_dir);
    tracing::debug!(project_dir = %project.root().display(), "using project directory");

    let result = match cli.command {
        Commands::Init(args) => run_init(&args, &project),
        Commands::Task(args) => run_task(&args, &project),
        Commands::Completion(args) => run_completion(&args, &project),
        Commands::Draw(args) => run_draw(&args, &project),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
