//! # cpm-state — Lifecycle State Machines
//!
//! ## State Machines
//!
//! - **Task** (`task.rs`): approval lifecycle
//!   `NotStarted → InProgress → Submitted → Approved`, with a
//!   `Rejected → InProgress` rework loop. Approved tasks are frozen.
//!
//! - **Draw** (`draw.rs`): `Pending → Scheduled → Disbursed`, strictly
//!   forward. Scheduling requires an open [`Eligibility`] verdict.
//!
//! ## Design
//!
//! States are closed enums, never strings. Every transition method checks
//! the current state first and returns a structured error without touching
//! the record when the move is not allowed, so callers can retry or repeat
//! a rejected request safely. Successful transitions append to the record's
//! own transition log.

pub mod draw;
pub mod task;

// ─── Task re-exports ────────────────────────────────────────────────

pub use task::{
    Task, TaskAction, TaskError, TaskStatus, TaskTransitionEvidence, TaskTransitionRecord,
};

// ─── Draw re-exports ────────────────────────────────────────────────

pub use draw::{can_schedule_draw, Draw, DrawError, DrawStatus, DrawTransitionRecord, Eligibility};
