//! # Init Subcommand
//!
//! `cpm init --name "Maple Street" --total 110,000 --threshold 70`

use anyhow::{bail, Context, Result};
use clap::Args;

use cpm_core::{Money, Percentage};
use cpm_ledger::{ProjectConfig, DEFAULT_MILESTONE_THRESHOLD};

use crate::project::ProjectDir;

/// Arguments for `cpm init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project name, used in draw request notices.
    #[arg(long)]
    pub name: String,

    /// Total project value (e.g. "110,000.00"), the CWP denominator.
    #[arg(long)]
    pub total: String,

    /// Milestone percentage a draw requires (e.g. "70" or "72.5%").
    #[arg(long)]
    pub threshold: Option<String>,

    /// Replace an existing configuration. Recorded tasks and draws are kept.
    #[arg(long)]
    pub force: bool,
}

/// Execute `cpm init`.
pub fn run_init(args: &InitArgs, project: &ProjectDir) -> Result<u8> {
    if project.is_initialized() && !args.force {
        bail!(
            "{} already exists (use --force to replace it)",
            project.config_path().display()
        );
    }

    let total = Money::parse(&args.total).context("invalid --total")?;
    let threshold = match &args.threshold {
        Some(raw) => Percentage::parse(raw).context("invalid --threshold")?,
        None => DEFAULT_MILESTONE_THRESHOLD,
    };

    let config = if project.is_initialized() {
        // Keep the project id so stored draws still match.
        let mut existing = project.load_config()?;
        existing.name = args.name.trim().to_string();
        existing.total_project_value = total;
        existing.milestone_threshold = threshold;
        existing.validate()?;
        existing
    } else {
        ProjectConfig::new(args.name.as_str(), total, threshold)?
    };
    project.save_config(&config)?;
    std::fs::create_dir_all(project.state_dir())?;

    tracing::info!(project_id = %config.project_id, "project initialized");
    println!(
        "OK: initialized {} (total {}, milestone {})",
        config.name, config.total_project_value, config.milestone_threshold
    );
    Ok(0)
}
