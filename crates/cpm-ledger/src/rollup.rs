//! # Subtask Roll-Up
//!
//! Large line items are broken into subtasks. A parent task reports the
//! combined progress of its subtasks and may only be approved once every
//! direct subtask has been approved.
//!
//! Roll-up rules, applied to the effective status of each direct subtask:
//!
//! | Subtasks                               | Parent reports |
//! |----------------------------------------|----------------|
//! | all approved                           | approved       |
//! | all submitted or approved              | submitted      |
//! | all not started                        | not started    |
//! | anything else (including any rejected) | in progress    |
//!
//! An approved parent always reports approved. Completion accounting is
//! unaffected: it sums each approved record's own value.

use std::collections::HashSet;

use cpm_core::TaskId;
use cpm_state::{Task, TaskAction, TaskStatus, TaskTransitionEvidence};

use crate::error::LedgerError;

/// Direct subtasks of `parent_id`.
pub fn subtasks_of<'a>(parent_id: TaskId, tasks: &'a [Task]) -> impl Iterator<Item = &'a Task> {
    tasks.iter().filter(move |t| t.parent_id == Some(parent_id))
}

/// Effective status of `task` given the whole task set.
pub fn rollup_status(task: &Task, tasks: &[Task]) -> TaskStatus {
    let mut visiting = HashSet::new();
    rollup_inner(task, tasks, &mut visiting)
}

fn rollup_inner(task: &Task, tasks: &[Task], visiting: &mut HashSet<TaskId>) -> TaskStatus {
    if task.status.is_terminal() || !visiting.insert(task.id) {
        return task.status;
    }
    let children: Vec<TaskStatus> = subtasks_of(task.id, tasks)
        .map(|child| rollup_inner(child, tasks, visiting))
        .collect();
    visiting.remove(&task.id);

    if children.is_empty() {
        return task.status;
    }
    if children.iter().all(|s| *s == TaskStatus::Approved) {
        TaskStatus::Approved
    } else if children
        .iter()
        .all(|s| matches!(s, TaskStatus::Submitted | TaskStatus::Approved))
    {
        TaskStatus::Submitted
    } else if children.iter().all(|s| *s == TaskStatus::NotStarted) {
        TaskStatus::NotStarted
    } else {
        TaskStatus::InProgress
    }
}

/// Fail unless every direct subtask of `parent_id` is approved.
pub fn ensure_subtasks_approved(parent_id: TaskId, tasks: &[Task]) -> Result<(), LedgerError> {
    let open = subtasks_of(parent_id, tasks)
        .filter(|t| !t.is_approved())
        .count();
    if open > 0 {
        return Err(LedgerError::OpenSubtasks {
            parent: parent_id,
            open,
        });
    }
    Ok(())
}

/// Check that `task` may be added to `tasks`.
///
/// A subtask's parent must exist, belong to the same project, and not be
/// approved yet.
pub fn validate_new_task(task: &Task, tasks: &[Task]) -> Result<(), LedgerError> {
    let Some(parent_id) = task.parent_id else {
        return Ok(());
    };
    let parent = tasks
        .iter()
        .find(|t| t.id == parent_id)
        .ok_or(LedgerError::TaskNotFound(parent_id))?;
    if parent.project_id != task.project_id {
        return Err(LedgerError::ProjectMismatch {
            expected: parent.project_id,
            found: task.project_id,
        });
    }
    if parent.is_approved() {
        return Err(LedgerError::InvalidParent {
            parent: parent_id,
            reason: "parent is already approved".to_string(),
        });
    }
    Ok(())
}

/// Apply a lifecycle action to the task `id` within `tasks`.
///
/// Approving a parent requires all of its subtasks to be approved first.
/// On error no task is modified.
pub fn apply_task_action<'a>(
    tasks: &'a mut [Task],
    id: TaskId,
    action: TaskAction,
    evidence: TaskTransitionEvidence,
    value: Option<cpm_core::Money>,
) -> Result<&'a Task, LedgerError> {
    if action == TaskAction::Approve {
        ensure_subtasks_approved(id, tasks)?;
    }
    let task = tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or(LedgerError::TaskNotFound(id))?;
    task.apply(action, evidence, value)?;
    Ok(task)
}
