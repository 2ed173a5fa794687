//! # Completion Subcommand
//!
//! Reports completed-work percentage against the draw milestone.
//! Exit code 0 when a draw may be scheduled, 2 when it may not.

use anyhow::Result;
use clap::Args;

use cpm_ledger::{summarize, CompletionSummary};

use crate::project::ProjectDir;

/// Arguments for `cpm completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute `cpm completion`.
pub fn run_completion(args: &CompletionArgs, project: &ProjectDir) -> Result<u8> {
    let config = project.load_config()?;
    let tasks = project.load_tasks()?;
    let summary = summarize(&tasks, &config);
    tracing::debug!(cwp = %summary.cwp, tasks = summary.task_count, "completion computed");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render(&summary));
    }
    Ok(if summary.can_schedule_draw { 0 } else { 2 })
}

fn render(s: &CompletionSummary) -> String {
    let mut out = format!(
        "Approved work:     {} of {}\n\
         Completed work:    {}\n\
         Milestone:         {}\n\
         Approved tasks:    {}/{}\n",
        s.approved_value,
        s.total_project_value,
        s.cwp,
        s.threshold,
        s.approved_task_count,
        s.task_count,
    );
    if s.cwp.exceeds_full() {
        out.push_str("NOTE: approved value exceeds the total project value\n");
    }
    if s.can_schedule_draw {
        out.push_str("OK: a draw may be scheduled\n");
    } else {
        out.push_str("BLOCKED: milestone not reached\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpm_core::{Money, Percentage};
    use cpm_ledger::ProjectConfig;
    use cpm_state::{Task, TaskTransitionEvidence};

    fn approved(config: &ProjectConfig, cents: i64) -> Task {
        let mut t = Task::new(config.project_id, "work", Money::from_cents(cents)).unwrap();
        t.start(TaskTransitionEvidence::new("t")).unwrap();
        t.submit(TaskTransitionEvidence::new("t")).unwrap();
        t.approve(TaskTransitionEvidence::new("t"), None).unwrap();
        t
    }

    fn setup(approved_cents: &[i64]) -> (tempfile::TempDir, ProjectDir) {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectDir::new(dir.path());
        let config = ProjectConfig::new(
            "Maple Street",
            Money::from_cents(11_000_000),
            Percentage::from_basis_points(7_000),
        )
        .unwrap();
        project.save_config(&config).unwrap();
        let tasks: Vec<Task> = approved_cents.iter().map(|&c| approved(&config, c)).collect();
        project.save_tasks(&tasks).unwrap();
        (dir, project)
    }

    #[test]
    fn below_milestone_exits_two() {
        let (_dir, project) = setup(&[4_400_000]);
        assert_eq!(run_completion(&CompletionArgs { json: false }, &project).unwrap(), 2);
    }

    #[test]
    fn at_milestone_exits_zero() {
        let (_dir, project) = setup(&[4_400_000, 3_300_000]);
        assert_eq!(run_completion(&CompletionArgs { json: true }, &project).unwrap(), 0);
    }

    #[test]
    fn render_reports_overrun() {
        let (_dir, project) = setup(&[12_000_000]);
        let config = project.load_config().unwrap();
        let summary = summarize(&project.load_tasks().unwrap(), &config);
        let text = render(&summary);
        assert!(text.contains("exceeds the total project value"));
        assert!(text.contains("OK: a draw may be scheduled"));
    }

    #[test]
    fn empty_project_reads_zero() {
        let (_dir, project) = setup(&[]);
        let config = project.load_config().unwrap();
        let text = render(&summarize(&[], &config));
        assert!(text.contains("0.00%"));
        assert!(text.contains("BLOCKED"));
    }
}
