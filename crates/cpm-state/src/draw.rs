//! # Fund Draw Lifecycle
//!
//! A draw is a request to release construction funds. It moves strictly
//! forward:
//!
//! ```text
//! Pending ──(CWP ≥ milestone)──▶ Scheduled ──(manual confirmation)──▶ Disbursed
//! ```
//!
//! - `Pending → Scheduled` is gated on completed work. The gate's verdict is
//!   passed in as an [`Eligibility`]; this module never computes CWP itself.
//! - `Scheduled → Disbursed` has no computed precondition.
//! - Nothing moves backwards and nothing leaves `Disbursed`. There is no
//!   cancelled state; removing a draw record is a separate operation owned by
//!   the register, and disbursed draws cannot be removed.
//!
//! A rejected request returns an error and leaves the draw untouched, so
//! repeating it is harmless.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cpm_core::{DrawId, DrawNumber, Money, Percentage, ProjectId, Timestamp};

// ─── Draw Status ─────────────────────────────────────────────────────

/// Lifecycle state of a draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawStatus {
    /// Requested, waiting for the completion milestone.
    #[default]
    Pending,
    /// Milestone met; funds scheduled for release.
    Scheduled,
    /// Funds released (terminal).
    Disbursed,
}

impl DrawStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disbursed)
    }

    /// The only state this one may move to, if any.
    pub fn successor(&self) -> Option<DrawStatus> {
        match self {
            Self::Pending => Some(Self::Scheduled),
            Self::Scheduled => Some(Self::Disbursed),
            Self::Disbursed => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scheduled => "scheduled",
            Self::Disbursed => "disbursed",
        }
    }
}

impl fmt::Display for DrawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Eligibility Gate ────────────────────────────────────────────────

/// Whether a pending draw may be scheduled: `cwp >= threshold`.
///
/// The boundary is inclusive. Over-complete projects (CWP above 100%) are
/// eligible like any other project past the threshold.
pub fn can_schedule_draw(cwp: Percentage, threshold: Percentage) -> bool {
    cwp >= threshold
}

/// Verdict of the draw gate at one instant.
///
/// Holds the inputs alongside the verdict so a rejected scheduling attempt
/// can say by how much the project falls short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    cwp: Percentage,
    threshold: Percentage,
    eligible: bool,
}

impl Eligibility {
    pub fn evaluate(cwp: Percentage, threshold: Percentage) -> Self {
        Self {
            cwp,
            threshold,
            eligible: can_schedule_draw(cwp, threshold),
        }
    }

    pub fn cwp(&self) -> Percentage {
        self.cwp
    }

    pub fn threshold(&self) -> Percentage {
        self.threshold
    }

    pub fn is_eligible(&self) -> bool {
        self.eligible
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from draw construction and lifecycle transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    /// The requested state is not the next state.
    #[error("invalid draw transition for draw {number}: {from} -> {to}")]
    InvalidTransition {
        number: DrawNumber,
        from: DrawStatus,
        to: DrawStatus,
    },

    /// The draw has been disbursed and can no longer change.
    #[error("draw {number} has been disbursed and cannot change state")]
    TerminalState { number: DrawNumber },

    /// Completed work has not reached the milestone.
    #[error("draw {number} cannot be scheduled: completed work {cwp} is below the {threshold} milestone")]
    NotEligible {
        number: DrawNumber,
        cwp: Percentage,
        threshold: Percentage,
    },

    /// Draw amounts must be strictly positive.
    #[error("draw amount must be positive, got {0}")]
    NonPositiveAmount(Money),
}

// ─── Transition Records ──────────────────────────────────────────────

/// Record of a draw state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawTransitionRecord {
    pub from_state: DrawStatus,
    pub to_state: DrawStatus,
    pub timestamp: Timestamp,
    /// Completed-work percentage the gate saw when scheduling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwp: Option<Percentage>,
}

// ─── Draw ────────────────────────────────────────────────────────────

/// A fund draw and its history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub id: DrawId,
    pub project_id: ProjectId,
    pub draw_number: DrawNumber,
    pub amount: Money,
    #[serde(default)]
    pub status: DrawStatus,
    #[serde(default = "Timestamp::now")]
    pub created_at: Timestamp,
    #[serde(default)]
    pub scheduled_at: Option<Timestamp>,
    #[serde(default)]
    pub disbursed_at: Option<Timestamp>,
    #[serde(default)]
    pub transitions: Vec<DrawTransitionRecord>,
}

impl Draw {
    /// Create a pending draw.
    pub fn new(
        project_id: ProjectId,
        draw_number: DrawNumber,
        amount: Money,
    ) -> Result<Self, DrawError> {
        if !amount.is_positive() {
            return Err(DrawError::NonPositiveAmount(amount));
        }
        Ok(Self {
            id: DrawId::new(),
            project_id,
            draw_number,
            amount,
            status: DrawStatus::Pending,
            created_at: Timestamp::now(),
            scheduled_at: None,
            disbursed_at: None,
            transitions: Vec::new(),
        })
    }

    /// Schedule the draw (PENDING → SCHEDULED) if the gate is open.
    pub fn schedule(&mut self, eligibility: &Eligibility) -> Result<(), DrawError> {
        self.require_state(DrawStatus::Pending, DrawStatus::Scheduled)?;
        if !eligibility.is_eligible() {
            return Err(DrawError::NotEligible {
                number: self.draw_number,
                cwp: eligibility.cwp(),
                threshold: eligibility.threshold(),
            });
        }
        let now = Timestamp::now();
        self.scheduled_at = Some(now);
        self.do_transition(DrawStatus::Scheduled, now, Some(eligibility.cwp()));
        Ok(())
    }

    /// Confirm the funds were released (SCHEDULED → DISBURSED).
    pub fn disburse(&mut self) -> Result<(), DrawError> {
        self.require_state(DrawStatus::Scheduled, DrawStatus::Disbursed)?;
        let now = Timestamp::now();
        self.disbursed_at = Some(now);
        self.do_transition(DrawStatus::Disbursed, now, None);
        Ok(())
    }

    /// Move to `target` if it is the next state, as when a client sets the
    /// status field directly.
    ///
    /// Requests for the current state or any earlier state are rejected.
    pub fn request_status(
        &mut self,
        target: DrawStatus,
        eligibility: &Eligibility,
    ) -> Result<(), DrawError> {
        match target {
            DrawStatus::Scheduled => self.schedule(eligibility),
            DrawStatus::Disbursed => self.disburse(),
            DrawStatus::Pending => Err(self.rejection(DrawStatus::Pending)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether the register may remove this record.
    pub fn is_deletable(&self) -> bool {
        !self.is_terminal()
    }

    fn require_state(&self, expected: DrawStatus, target: DrawStatus) -> Result<(), DrawError> {
        if self.status != expected {
            return Err(self.rejection(target));
        }
        Ok(())
    }

    fn rejection(&self, target: DrawStatus) -> DrawError {
        if self.status.is_terminal() {
            DrawError::TerminalState {
                number: self.draw_number,
            }
        } else {
            DrawError::InvalidTransition {
                number: self.draw_number,
                from: self.status,
                to: target,
            }
        }
    }

    fn do_transition(&mut self, to: DrawStatus, at: Timestamp, cwp: Option<Percentage>) {
        tracing::info!(
            draw_id = %self.id,
            draw_number = %self.draw_number,
            from = %self.status,
            to = %to,
            "draw transition"
        );
        self.transitions.push(DrawTransitionRecord {
            from_state: self.status,
            to_state: to,
            timestamp: at,
            cwp,
        });
        self.status = to;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
