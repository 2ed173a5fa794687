//! # Draw Subcommand
//!
//! Opens, schedules, disburses and removes fund draws.
//!
//! `schedule` recomputes completed work from the stored tasks. When the
//! milestone has not been reached it prints `BLOCKED` and exits with code 2,
//! leaving the draw pending. On success it prints the draw request notice.
//!
//! Draws are addressed by number (`3`, `#3`) or id.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use cpm_core::Money;
use cpm_ledger::{DrawRegister, LedgerError};
use cpm_state::DrawError;

use crate::project::{resolve_draw, short_id, ProjectDir};

/// Arguments for the `cpm draw` subcommand.
#[derive(Args, Debug)]
pub struct DrawArgs {
    #[command(subcommand)]
    pub command: DrawCommand,
}

/// Draw subcommands.
#[derive(Subcommand, Debug)]
pub enum DrawCommand {
    /// Open a pending draw with the next draw number.
    Create {
        /// Amount requested (e.g. "25,000").
        #[arg(long)]
        amount: String,
    },

    /// Schedule a pending draw if the milestone has been reached.
    Schedule {
        /// Draw number or id.
        draw: String,
    },

    /// Confirm a scheduled draw was paid out. Final.
    Disburse {
        /// Draw number or id.
        draw: String,
    },

    /// Remove a draw that has not been disbursed.
    Delete {
        /// Draw number or id.
        draw: String,
    },

    /// List draws by number.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

/// Execute the draw subcommand.
pub fn run_draw(args: &DrawArgs, project: &ProjectDir) -> Result<u8> {
    match &args.command {
        DrawCommand::Create { amount } => cmd_create(project, amount),
        DrawCommand::Schedule { draw } => cmd_schedule(project, draw),
        DrawCommand::Disburse { draw } => cmd_disburse(project, draw),
        DrawCommand::Delete { draw } => cmd_delete(project, draw),
        DrawCommand::List { json } => cmd_list(project, *json),
    }
}

fn cmd_create(project: &ProjectDir, amount: &str) -> Result<u8> {
    let config = project.load_config()?;
    let mut register = project.load_draws(&config)?;
    let amount = Money::parse(amount).context("invalid --amount")?;

    let draw = register.create(amount)?;
    let line = format!("OK: opened draw {} for {}", draw.draw_number, draw.amount);
    project.save_draws(&register)?;
    println!("{line}");
    Ok(0)
}

fn cmd_schedule(project: &ProjectDir, needle: &str) -> Result<u8> {
    let config = project.load_config()?;
    let tasks = project.load_tasks()?;
    let mut register = project.load_draws(&config)?;
    let id = resolve_draw(register.list(), needle)?;

    match register.schedule(id, &tasks, &config) {
        Ok(notice) => {
            project.save_draws(&register)?;
            println!("OK: draw scheduled");
            println!();
            print!("{}", notice.to_text());
            Ok(0)
        }
        Err(LedgerError::Draw(DrawError::NotEligible {
            number,
            cwp,
            threshold,
        })) => {
            println!(
                "BLOCKED: draw {number} needs {threshold} completed work, currently {cwp}"
            );
            Ok(2)
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_disburse(project: &ProjectDir, needle: &str) -> Result<u8> {
    let config = project.load_config()?;
    let mut register = project.load_draws(&config)?;
    let id = resolve_draw(register.list(), needle)?;

    let draw = register.disburse(id)?;
    let line = format!("OK: draw {} disbursed ({})", draw.draw_number, draw.amount);
    project.save_draws(&register)?;
    println!("{line}");
    Ok(0)
}

fn cmd_delete(project: &ProjectDir, needle: &str) -> Result<u8> {
    let config = project.load_config()?;
    let mut register = project.load_draws(&config)?;
    let id = resolve_draw(register.list(), needle)?;

    let removed = register.delete(id)?;
    project.save_draws(&register)?;
    println!("OK: deleted draw {}", removed.draw_number);
    Ok(0)
}

fn cmd_list(project: &ProjectDir, json: bool) -> Result<u8> {
    let config = project.load_config()?;
    let register = project.load_draws(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(register.list())?);
        return Ok(0);
    }
    print!("{}", render_table(&register));
    Ok(0)
}

fn render_table(register: &DrawRegister) -> String {
    if register.list().is_empty() {
        return format!("No draws. Next draw number: {}\n", register.next_number());
    }
    let mut out = format!(
        "{:<5}  {:<8}  {:<10}  {:>14}\n",
        "DRAW", "ID", "STATUS", "AMOUNT"
    );
    for d in register.list() {
        out.push_str(&format!(
            "{:<5}  {:<8}  {:<10}  {:>14}\n",
            d.draw_number.to_string(),
            short_id(d.id.as_uuid()),
            d.status.as_str(),
            d.amount.to_string(),
        ));
    }
    out.push_str(&format!(
        "Scheduled: {}  Disbursed: {}\n",
        register.scheduled_total(),
        register.disbursed_total()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpm_core::{DrawNumber, Percentage};
    use cpm_ledger::ProjectConfig;
    use cpm_state::{DrawStatus, Task, TaskTransitionEvidence};

    fn setup(approved_cents: i64) -> (tempfile::TempDir, ProjectDir) {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectDir::new(dir.path());
        let config = ProjectConfig::new(
            "Maple Street",
            Money::from_cents(11_000_000),
            Percentage::from_basis_points(7_000),
        )
        .unwrap();
        project.save_config(&config).unwrap();

        let mut task =
            Task::new(config.project_id, "Foundation", Money::from_cents(approved_cents)).unwrap();
        task.start(TaskTransitionEvidence::new("t")).unwrap();
        task.submit(TaskTransitionEvidence::new("t")).unwrap();
        task.approve(TaskTransitionEvidence::new("t"), None).unwrap();
        project.save_tasks(&[task]).unwrap();
        (dir, project)
    }

    fn run(project: &ProjectDir, command: DrawCommand) -> Result<u8> {
        run_draw(&DrawArgs { command }, project)
    }

    fn create(project: &ProjectDir, amount: &str) {
        run(
            project,
            DrawCommand::Create {
                amount: amount.into(),
            },
        )
        .unwrap();
    }

    fn status_of(project: &ProjectDir, number: u32) -> DrawStatus {
        let config = project.load_config().unwrap();
        project
            .load_draws(&config)
            .unwrap()
            .get_by_number(DrawNumber(number))
            .unwrap()
            .status
    }

    #[test]
    fn schedule_blocked_below_milestone() {
        let (_dir, project) = setup(4_400_000);
        create(&project, "25,000");
        let code = run(
            &project,
            DrawCommand::Schedule {
                draw: "1".into(),
            },
        )
        .unwrap();
        assert_eq!(code, 2);
        assert_eq!(status_of(&project, 1), DrawStatus::Pending);
    }

    #[test]
    fn schedule_then_disburse() {
        let (_dir, project) = setup(7_700_000);
        create(&project, "25,000");
        assert_eq!(
            run(&project, DrawCommand::Schedule { draw: "#1".into() }).unwrap(),
            0
        );
        assert_eq!(status_of(&project, 1), DrawStatus::Scheduled);
        run(&project, DrawCommand::Disburse { draw: "1".into() }).unwrap();
        assert_eq!(status_of(&project, 1), DrawStatus::Disbursed);

        // Disbursed draws are final.
        assert!(run(&project, DrawCommand::Schedule { draw: "1".into() }).is_err());
        assert!(run(&project, DrawCommand::Delete { draw: "1".into() }).is_err());
        assert_eq!(status_of(&project, 1), DrawStatus::Disbursed);
    }

    #[test]
    fn disburse_requires_schedule() {
        let (_dir, project) = setup(7_700_000);
        create(&project, "100");
        assert!(run(&project, DrawCommand::Disburse { draw: "1".into() }).is_err());
        assert_eq!(status_of(&project, 1), DrawStatus::Pending);
    }

    #[test]
    fn numbers_are_not_reused_after_delete() {
        let (_dir, project) = setup(0);
        create(&project, "100");
        create(&project, "200");
        run(&project, DrawCommand::Delete { draw: "2".into() }).unwrap();
        create(&project, "300");

        let config = project.load_config().unwrap();
        let register = project.load_draws(&config).unwrap();
        let numbers: Vec<u32> = register.list().iter().map(|d| d.draw_number.0).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert!(render_table(&register).contains("#3"));
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let (_dir, project) = setup(0);
        assert!(run(
            &project,
            DrawCommand::Create {
                amount: "0".into()
            }
        )
        .is_err());
        let config = project.load_config().unwrap();
        assert_eq!(project.load_draws(&config).unwrap().next_number(), DrawNumber(1));
    }

    #[test]
    fn empty_register_table() {
        let register = DrawRegister::new(cpm_core::ProjectId::new());
        assert_eq!(render_table(&register), "No draws. Next draw number: #1\n");
    }
}
