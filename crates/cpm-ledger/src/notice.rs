//! # Draw Request Notices
//!
//! When a draw is scheduled the lender is told what work backs it. The
//! notice is plain text with a subject line and a body; delivering it (email,
//! portal upload) is someone else's job.

use std::fmt::Write as _;

use serde::Serialize;

use cpm_core::{Money, Percentage};
use cpm_state::{Draw, Task};

use crate::completion::approved_value_total;
use crate::config::ProjectConfig;

/// Subject and body of a draw request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawRequestNotice {
    pub subject: String,
    pub body: String,
}

impl DrawRequestNotice {
    /// Compose the notice for `draw`.
    ///
    /// Lists every approved task in input order with its credited value.
    pub fn compose(config: &ProjectConfig, draw: &Draw, tasks: &[Task], cwp: Percentage) -> Self {
        let subject = format!(
            "Draw Request {} - {}: {}",
            draw.draw_number, config.name, draw.amount
        );

        let mut body = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(body, "Draw request {} for {}", draw.draw_number, config.name);
        let _ = writeln!(body);
        let _ = writeln!(body, "Amount requested: {}", draw.amount);
        let _ = writeln!(
            body,
            "Completed work: {} of {} (milestone {})",
            cwp, config.total_project_value, config.milestone_threshold
        );
        let _ = writeln!(body);

        let approved: Vec<&Task> = tasks.iter().filter(|t| t.is_approved()).collect();
        if approved.is_empty() {
            let _ = writeln!(body, "Approved work: none");
        } else {
            let _ = writeln!(body, "Approved work:");
            for task in &approved {
                let _ = writeln!(body, "  - {}: {}", task.title, task.credited_value());
            }
        }
        let _ = writeln!(body);
        let total: Money = approved_value_total(tasks);
        let _ = write!(body, "Total approved: {total}");

        Self { subject, body }
    }

    /// Render as a single message with a `Subject:` header.
    pub fn to_text(&self) -> String {
        format!("Subject: {}\n\n{}\n", self.subject, self.body)
    }
}
