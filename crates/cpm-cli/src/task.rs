//! # Task Subcommand
//!
//! Records work items and moves them through approval.
//!
//! - `add` — create a task, optionally under a parent.
//! - `start`, `submit`, `reject`, `rework` — lifecycle moves.
//! - `approve` — approve submitted work, optionally at a value other than
//!   the budget.
//! - `list` — all tasks with rolled-up status.
//!
//! Task ids may be given in full or as a unique prefix.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use cpm_core::Money;
use cpm_ledger::{apply_task_action, rollup_status, validate_new_task};
use cpm_state::{Task, TaskAction, TaskTransitionEvidence};

use crate::project::{resolve_task, short_id, ProjectDir};

/// Arguments for the `cpm task` subcommand.
#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommand,
}

/// Who did it and why, recorded in the transition log.
#[derive(Args, Debug, Clone, Default)]
pub struct EvidenceArgs {
    #[arg(long)]
    pub reason: Option<String>,
    #[arg(long)]
    pub actor: Option<String>,
}

impl EvidenceArgs {
    fn evidence(&self, default_reason: &str) -> TaskTransitionEvidence {
        let reason = self.reason.as_deref().unwrap_or(default_reason);
        let evidence = TaskTransitionEvidence::new(reason);
        match &self.actor {
            Some(actor) => evidence.by(actor.as_str()),
            None => evidence,
        }
    }
}

/// Task subcommands.
#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a task in NOT_STARTED.
    Add {
        #[arg(long)]
        title: String,
        /// Budgeted value (e.g. "12,500").
        #[arg(long)]
        budget: String,
        /// Parent task id, making this a subtask.
        #[arg(long)]
        parent: Option<String>,
    },

    /// Begin work (NOT_STARTED → IN_PROGRESS).
    Start {
        #[arg(long)]
        id: String,
        #[command(flatten)]
        evidence: EvidenceArgs,
    },

    /// Report work complete (IN_PROGRESS → SUBMITTED).
    Submit {
        #[arg(long)]
        id: String,
        #[command(flatten)]
        evidence: EvidenceArgs,
    },

    /// Approve submitted work (SUBMITTED → APPROVED). Final.
    Approve {
        #[arg(long)]
        id: String,
        /// Approved value; defaults to the task budget.
        #[arg(long)]
        value: Option<String>,
        #[command(flatten)]
        evidence: EvidenceArgs,
    },

    /// Send submitted work back (SUBMITTED → REJECTED).
    Reject {
        #[arg(long)]
        id: String,
        #[command(flatten)]
        evidence: EvidenceArgs,
    },

    /// Resume rejected work (REJECTED → IN_PROGRESS).
    Rework {
        #[arg(long)]
        id: String,
        #[command(flatten)]
        evidence: EvidenceArgs,
    },

    /// List tasks.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

/// Execute the task subcommand.
pub fn run_task(args: &TaskArgs, project: &ProjectDir) -> Result<u8> {
    match &args.command {
        TaskCommand::Add {
            title,
            budget,
            parent,
        } => cmd_add(project, title, budget, parent.as_deref()),
        TaskCommand::Start { id, evidence } => {
            cmd_transition(project, id, TaskAction::Start, None, evidence)
        }
        TaskCommand::Submit { id, evidence } => {
            cmd_transition(project, id, TaskAction::Submit, None, evidence)
        }
        TaskCommand::Approve {
            id,
            value,
            evidence,
        } => cmd_transition(project, id, TaskAction::Approve, value.as_deref(), evidence),
        TaskCommand::Reject { id, evidence } => {
            cmd_transition(project, id, TaskAction::Reject, None, evidence)
        }
        TaskCommand::Rework { id, evidence } => {
            cmd_transition(project, id, TaskAction::Rework, None, evidence)
        }
        TaskCommand::List { json } => cmd_list(project, *json),
    }
}

fn cmd_add(project: &ProjectDir, title: &str, budget: &str, parent: Option<&str>) -> Result<u8> {
    let config = project.load_config()?;
    let mut tasks = project.load_tasks()?;

    let budget = Money::parse(budget).context("invalid --budget")?;
    let mut task = Task::new(config.project_id, title, budget)?;
    if let Some(needle) = parent {
        task = task.with_parent(resolve_task(&tasks, needle).context("invalid --parent")?);
    }
    validate_new_task(&task, &tasks)?;

    let id = task.id;
    tasks.push(task);
    project.save_tasks(&tasks)?;

    println!("OK: added task {} ({})", id.as_uuid(), budget);
    Ok(0)
}

fn cmd_transition(
    project: &ProjectDir,
    needle: &str,
    action: TaskAction,
    value: Option<&str>,
    evidence: &EvidenceArgs,
) -> Result<u8> {
    project.load_config()?;
    let mut tasks = project.load_tasks()?;
    let id = resolve_task(&tasks, needle)?;
    let value = value
        .map(Money::parse)
        .transpose()
        .context("invalid --value")?;

    let task = apply_task_action(&mut tasks, id, action, evidence.evidence("cli"), value)?;
    let status = task.status;
    let credited = task.credited_value();
    project.save_tasks(&tasks)?;

    if credited.is_positive() {
        println!("OK: task {} is now {status} (credited {credited})", id.as_uuid());
    } else {
        println!("OK: task {} is now {status}", id.as_uuid());
    }
    Ok(0)
}

fn cmd_list(project: &ProjectDir, json: bool) -> Result<u8> {
    project.load_config()?;
    let tasks = project.load_tasks()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(0);
    }
    if tasks.is_empty() {
        println!("No tasks recorded.");
        return Ok(0);
    }
    println!(
        "{:<8}  {:<11}  {:<11}  {:>14}  {:>14}  TITLE",
        "ID", "STATUS", "ROLLED UP", "BUDGET", "CREDITED"
    );
    for task in &tasks {
        let indent = if task.is_subtask() { "  " } else { "" };
        println!(
            "{:<8}  {:<11}  {:<11}  {:>14}  {:>14}  {indent}{}",
            short_id(task.id.as_uuid()),
            task.status.as_str(),
            rollup_status(task, &tasks).as_str(),
            task.budget.to_string(),
            task.credited_value().to_string(),
            task.title,
        );
    }
    Ok(0)
}
