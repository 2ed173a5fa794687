//! # cpm-ledger — Completion Accounting and Draw Gating
//!
//! Turns a snapshot of tasks into the numbers a lender cares about:
//!
//! ```text
//! tasks (status, approved value)
//!     └─▶ approved_value_total
//!           └─▶ ÷ total project value ─▶ CWP
//!                 └─▶ ≥ milestone threshold? ─▶ draw may be scheduled
//! ```
//!
//! - [`config`]: the fixed denominator and threshold, passed explicitly.
//! - [`completion`]: CWP and the eligibility verdict. Pure functions.
//! - [`rollup`]: parent/subtask status propagation and the approval gate on
//!   parent tasks.
//! - [`register`]: draw numbering, server-side scheduling gate, deletion.
//! - [`notice`]: the plain-text draw request sent when a draw is scheduled.
//!
//! Storage and change notification live with the caller; everything here
//! operates on an already-materialized snapshot.

pub mod completion;
pub mod config;
pub mod error;
pub mod notice;
pub mod register;
pub mod rollup;

pub use completion::{
    approved_value_total, compute_completed_work_percentage, evaluate_eligibility, summarize,
    CompletionSummary,
};
pub use config::{ProjectConfig, DEFAULT_MILESTONE_THRESHOLD};
pub use cpm_state::{can_schedule_draw, Eligibility};
pub use error::LedgerError;
pub use notice::DrawRequestNotice;
pub use register::DrawRegister;
pub use rollup::{
    apply_task_action, ensure_subtasks_approved, rollup_status, subtasks_of, validate_new_task,
};
