//! # Task Approval Lifecycle
//!
//! Every budget line item on site is tracked as a task. A task only counts
//! toward completed work once a project manager has approved it, and from
//! then on it is frozen: approved tasks are the audit trail behind every
//! fund draw.
//!
//! ## States
//!
//! ```text
//! NotStarted ──▶ InProgress ──▶ Submitted ──▶ Approved (terminal)
//!                    ▲              │
//!                    │              ▼
//!                    └─(rework)── Rejected
//! ```
//!
//! Each transition appends a [`TaskTransitionRecord`]. A rejected attempt
//! leaves the task exactly as it was.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cpm_core::{Money, ProjectId, TaskId, Timestamp};

// ─── Task Status ─────────────────────────────────────────────────────

/// Approval state of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, no work recorded yet.
    #[default]
    NotStarted,
    /// Work under way on site.
    InProgress,
    /// Reported complete, awaiting review.
    Submitted,
    /// Reviewed and credited toward completed work (terminal).
    Approved,
    /// Review found problems; work must be redone.
    Rejected,
}

impl TaskStatus {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Whether a task in this state contributes its approved value to CWP.
    pub fn counts_toward_completion(&self) -> bool {
        matches!(self, Self::Approved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Task Actions ────────────────────────────────────────────────────

/// A requested move through the approval lifecycle.
///
/// Used by callers that receive the action as data (HTTP body, CLI flag)
/// and dispatch through [`Task::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    Start,
    Submit,
    Approve,
    Reject,
    Rework,
}

impl TaskAction {
    /// The state this action leads to.
    pub fn target(&self) -> TaskStatus {
        match self {
            Self::Start | Self::Rework => TaskStatus::InProgress,
            Self::Submit => TaskStatus::Submitted,
            Self::Approve => TaskStatus::Approved,
            Self::Reject => TaskStatus::Rejected,
        }
    }
}

impl FromStr for TaskAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "submit" => Ok(Self::Submit),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "rework" => Ok(Self::Rework),
            other => Err(format!(
                "unknown task action {other:?}; expected start, submit, approve, reject or rework"
            )),
        }
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from task construction and lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Attempted transition is not valid from the current state.
    #[error("invalid task transition: {from} -> {to}")]
    InvalidTransition {
        from: TaskStatus,
        to: TaskStatus,
    },

    /// The task is approved and can no longer change.
    #[error("task {id} is approved and cannot change state")]
    TerminalState { id: TaskId },

    /// A task needs a title.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// Budgets and approved values cannot be negative.
    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Money },
}

// ─── Transition Records ──────────────────────────────────────────────

/// Who moved a task and why.
#[derive(Debug, Clone, Default)]
pub struct TaskTransitionEvidence {
    pub reason: String,
    /// Person or role that initiated the transition.
    pub actor: Option<String>,
}

impl TaskTransitionEvidence {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            actor: None,
        }
    }

    pub fn by(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// Record of a task state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTransitionRecord {
    pub from_state: TaskStatus,
    pub to_state: TaskStatus,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub reason: String,
}

// ─── Task ────────────────────────────────────────────────────────────

/// A task or subtask with its budget, approval state, and history.
///
/// Records loaded from storage may be incomplete; every field except the
/// identifiers and the title has a serde default, and a missing approved
/// value simply contributes nothing to completed work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    /// Parent task when this is a subtask.
    #[serde(default)]
    pub parent_id: Option<TaskId>,
    pub title: String,
    /// Budgeted value of the work.
    #[serde(default)]
    pub budget: Money,
    /// Value credited once approved.
    #[serde(default)]
    pub approved_value: Option<Money>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default = "Timestamp::now")]
    pub created_at: Timestamp,
    #[serde(default)]
    pub transitions: Vec<TaskTransitionRecord>,
}

impl Task {
    /// Create a task in `NotStarted`.
    pub fn new(
        project_id: ProjectId,
        title: impl Into<String>,
        budget: Money,
    ) -> Result<Self, TaskError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        if budget.is_negative() {
            return Err(TaskError::NegativeAmount {
                field: "budget",
                value: budget,
            });
        }
        Ok(Self {
            id: TaskId::new(),
            project_id,
            parent_id: None,
            title,
            budget,
            approved_value: None,
            status: TaskStatus::NotStarted,
            created_at: Timestamp::now(),
            transitions: Vec::new(),
        })
    }

    /// Attach this task under a parent task.
    pub fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Begin work (NOT_STARTED → IN_PROGRESS).
    pub fn start(&mut self, evidence: TaskTransitionEvidence) -> Result<(), TaskError> {
        self.require_state(TaskStatus::NotStarted, TaskStatus::InProgress)?;
        self.do_transition(TaskStatus::InProgress, evidence);
        Ok(())
    }

    /// Report the work complete (IN_PROGRESS → SUBMITTED).
    pub fn submit(&mut self, evidence: TaskTransitionEvidence) -> Result<(), TaskError> {
        self.require_state(TaskStatus::InProgress, TaskStatus::Submitted)?;
        self.do_transition(TaskStatus::Submitted, evidence);
        Ok(())
    }

    /// Approve submitted work (SUBMITTED → APPROVED).
    ///
    /// `value` sets the credited amount. Without it, an approved value already
    /// on the record is kept, otherwise the full budget is credited.
    pub fn approve(
        &mut self,
        evidence: TaskTransitionEvidence,
        value: Option<Money>,
    ) -> Result<(), TaskError> {
        self.require_state(TaskStatus::Submitted, TaskStatus::Approved)?;
        if let Some(v) = value.filter(|v| v.is_negative()) {
            return Err(TaskError::NegativeAmount {
                field: "approved_value",
                value: v,
            });
        }
        self.approved_value = value.or(self.approved_value).or(Some(self.budget));
        self.do_transition(TaskStatus::Approved, evidence);
        Ok(())
    }

    /// Send submitted work back (SUBMITTED → REJECTED).
    pub fn reject(&mut self, evidence: TaskTransitionEvidence) -> Result<(), TaskError> {
        self.require_state(TaskStatus::Submitted, TaskStatus::Rejected)?;
        self.do_transition(TaskStatus::Rejected, evidence);
        Ok(())
    }

    /// Resume rejected work (REJECTED → IN_PROGRESS).
    pub fn rework(&mut self, evidence: TaskTransitionEvidence) -> Result<(), TaskError> {
        self.require_state(TaskStatus::Rejected, TaskStatus::InProgress)?;
        self.do_transition(TaskStatus::InProgress, evidence);
        Ok(())
    }

    /// Dispatch an action received as data.
    ///
    /// `value` is only consulted for [`TaskAction::Approve`].
    pub fn apply(
        &mut self,
        action: TaskAction,
        evidence: TaskTransitionEvidence,
        value: Option<Money>,
    ) -> Result<(), TaskError> {
        match action {
            TaskAction::Start => self.start(evidence),
            TaskAction::Submit => self.submit(evidence),
            TaskAction::Approve => self.approve(evidence, value),
            TaskAction::Reject => self.reject(evidence),
            TaskAction::Rework => self.rework(evidence),
        }
    }

    /// The amount this task adds to completed work right now.
    ///
    /// Zero unless approved. A missing or negative approved value is a
    /// malformed record and also contributes zero.
    pub fn credited_value(&self) -> Money {
        if !self.status.counts_toward_completion() {
            return Money::ZERO;
        }
        self.approved_value
            .filter(|v| !v.is_negative())
            .unwrap_or(Money::ZERO)
    }

    pub fn is_approved(&self) -> bool {
        self.status == TaskStatus::Approved
    }

    pub fn is_subtask(&self) -> bool {
        self.parent_id.is_some()
    }

    fn require_state(&self, expected: TaskStatus, target: TaskStatus) -> Result<(), TaskError> {
        if self.status.is_terminal() {
            return Err(TaskError::TerminalState { id: self.id });
        }
        if self.status != expected {
            return Err(TaskError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        Ok(())
    }

    fn do_transition(&mut self, to: TaskStatus, evidence: TaskTransitionEvidence) {
        tracing::debug!(task_id = %self.id, from = %self.status, to = %to, "task transition");
        self.transitions.push(TaskTransitionRecord {
            from_state: self.status,
            to_state: to,
            timestamp: Timestamp::now(),
            actor: evidence.actor,
            reason: evidence.reason,
        });
        self.status = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(reason: &str) -> TaskTransitionEvidence {
        TaskTransitionEvidence::new(reason).by("site-super")
    }

    fn make_task(budget_cents: i64) -> Task {
        Task::new(ProjectId::new(), "Pour foundation", Money::from_cents(budget_cents)).unwrap()
    }

    fn make_submitted(budget_cents: i64) -> Task {
        let mut task = make_task(budget_cents);
        task.start(evidence("crew on site")).unwrap();
        task.submit(evidence("slab poured")).unwrap();
        task
    }

    #[test]
    fn new_task_is_not_started() {
        let task = make_task(500_000);
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.credited_value(), Money::ZERO);
        assert!(task.transitions.is_empty());
        assert!(!task.is_subtask());
    }

    #[test]
    fn new_task_validates() {
        assert_eq!(
            Task::new(ProjectId::new(), "   ", Money::ZERO).unwrap_err(),
            TaskError::EmptyTitle
        );
        assert!(matches!(
            Task::new(ProjectId::new(), "Framing", Money::from_cents(-1)),
            Err(TaskError::NegativeAmount { field: "budget", .. })
        ));
    }

    #[test]
    fn happy_path_to_approved_credits_budget() {
        let mut task = make_submitted(500_000);
        task.approve(evidence("inspected"), None).unwrap();
        assert!(task.is_approved());
        assert_eq!(task.credited_value(), Money::from_cents(500_000));
        assert_eq!(task.transitions.len(), 3);
        assert_eq!(task.transitions[2].actor.as_deref(), Some("site-super"));
    }

    #[test]
    fn approve_with_explicit_value() {
        let mut task = make_submitted(500_000);
        task.approve(evidence("partial credit"), Some(Money::from_cents(420_000)))
            .unwrap();
        assert_eq!(task.credited_value(), Money::from_cents(420_000));
    }

    #[test]
    fn approve_keeps_preexisting_value() {
        let mut task = make_submitted(500_000);
        task.approved_value = Some(Money::from_cents(100));
        task.approve(evidence("ok"), None).unwrap();
        assert_eq!(task.credited_value(), Money::from_cents(100));
    }

    #[test]
    fn approve_rejects_negative_value_without_change() {
        let mut task = make_submitted(500_000);
        let before = task.clone();
        let err = task
            .approve(evidence("typo"), Some(Money::from_cents(-5)))
            .unwrap_err();
        assert!(matches!(err, TaskError::NegativeAmount { .. }));
        assert_eq!(task, before);
    }

    #[test]
    fn reject_and_rework_cycle() {
        let mut task = make_submitted(10_000);
        task.reject(evidence("cracks")).unwrap();
        assert_eq!(task.status, TaskStatus::Rejected);
        assert_eq!(task.credited_value(), Money::ZERO);
        task.rework(evidence("re-pour")).unwrap();
        task.submit(evidence("done again")).unwrap();
        task.approve(evidence("passed"), None).unwrap();
        assert_eq!(task.transitions.len(), 6);
    }

    #[test]
    fn cannot_approve_without_submission() {
        let mut task = make_task(10_000);
        let err = task.approve(evidence("skip"), None).unwrap_err();
        assert_eq!(
            err,
            TaskError::InvalidTransition {
                from: TaskStatus::NotStarted,
                to: TaskStatus::Approved
            }
        );
        assert_eq!(task.approved_value, None);
    }

    #[test]
    fn approved_task_is_frozen() {
        let mut task = make_submitted(10_000);
        task.approve(evidence("ok"), None).unwrap();
        let before = task.clone();
        for action in [
            TaskAction::Start,
            TaskAction::Submit,
            TaskAction::Approve,
            TaskAction::Reject,
            TaskAction::Rework,
        ] {
            let err = task.apply(action, evidence("again"), None).unwrap_err();
            assert!(matches!(err, TaskError::TerminalState { .. }));
        }
        assert_eq!(task, before);
    }

    #[test]
    fn credited_value_ignores_malformed_records() {
        let mut task = make_submitted(10_000);
        task.approve(evidence("ok"), None).unwrap();
        task.approved_value = None;
        assert_eq!(task.credited_value(), Money::ZERO);
        task.approved_value = Some(Money::from_cents(-700));
        assert_eq!(task.credited_value(), Money::ZERO);
    }

    #[test]
    fn action_parsing() {
        assert_eq!("approve".parse::<TaskAction>().unwrap(), TaskAction::Approve);
        assert_eq!(" Rework ".parse::<TaskAction>().unwrap(), TaskAction::Rework);
        assert!("cancel".parse::<TaskAction>().is_err());
        assert_eq!(TaskAction::Rework.target(), TaskStatus::InProgress);
    }

    #[test]
    fn status_display_matches_serde() {
        for status in [
            TaskStatus::NotStarted,
            TaskStatus::InProgress,
            TaskStatus::Submitted,
            TaskStatus::Approved,
            TaskStatus::Rejected,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn sparse_record_deserializes_with_defaults() {
        let json = format!(
            r#"{{"id":"{}","project_id":"{}","title":"Roofing","status":"approved"}}"#,
            TaskId::new().0,
            ProjectId::new().0
        );
        let task: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(task.status, TaskStatus::Approved);
        assert_eq!(task.approved_value, None);
        assert_eq!(task.budget, Money::ZERO);
        assert_eq!(task.credited_value(), Money::ZERO);
    }
}
