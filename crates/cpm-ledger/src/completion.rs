//! # Completion Accounting
//!
//! Completed-work percentage (CWP) is the approved value of finished work
//! over the fixed total project value. It is always recomputed from the live
//! task set and never stored, so there is nothing to drift out of sync.
//!
//! All functions here are pure: same tasks and configuration in, same answer
//! out. Callers may invoke them on every change notification.

use serde::Serialize;

use cpm_core::{Money, Percentage};
use cpm_state::{Eligibility, Task};

use crate::config::ProjectConfig;

/// Sum of credited values across `tasks`.
///
/// Only approved tasks contribute. Records with a missing or negative
/// approved value contribute zero. The sum saturates instead of wrapping.
pub fn approved_value_total(tasks: &[Task]) -> Money {
    tasks.iter().map(Task::credited_value).sum()
}

/// Completed-work percentage of a project.
///
/// A zero or negative `total_project_value` yields 0% rather than a
/// division by zero. The result is not clamped at 100%.
pub fn compute_completed_work_percentage(tasks: &[Task], total_project_value: Money) -> Percentage {
    Percentage::ratio(approved_value_total(tasks), total_project_value)
}

/// Run the draw gate against the current task set.
pub fn evaluate_eligibility(tasks: &[Task], config: &ProjectConfig) -> Eligibility {
    let cwp = compute_completed_work_percentage(tasks, config.total_project_value);
    Eligibility::evaluate(cwp, config.milestone_threshold)
}

/// Everything a dashboard shows about project completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionSummary {
    pub approved_value: Money,
    pub total_project_value: Money,
    pub cwp: Percentage,
    pub threshold: Percentage,
    pub can_schedule_draw: bool,
    pub approved_task_count: usize,
    pub task_count: usize,
}

/// Build a [`CompletionSummary`] from a task snapshot.
pub fn summarize(tasks: &[Task], config: &ProjectConfig) -> CompletionSummary {
    let approved_value = approved_value_total(tasks);
    let cwp = Percentage::ratio(approved_value, config.total_project_value);
    let eligibility = Eligibility::evaluate(cwp, config.milestone_threshold);
    CompletionSummary {
        approved_value,
        total_project_value: config.total_project_value,
        cwp,
        threshold: config.milestone_threshold,
        can_schedule_draw: eligibility.is_eligible(),
        approved_task_count: tasks.iter().filter(|t| t.is_approved()).count(),
        task_count: tasks.len(),
    }
}
