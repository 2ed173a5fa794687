//! # API Route Modules
//!
//! - `project`: the fixed project configuration and draw totals.
//! - `tasks`: task creation and approval lifecycle.
//! - `completion`: completed-work percentage and draw eligibility.
//! - `draws`: draw register, including the server-side scheduling gate.
//!
//! Amounts in request and response bodies are decimal strings
//! (`"12,500.00"` in, `"12500.00"` out). Percentages are decimal strings
//! floored to two places (`"70.00"`).

pub mod completion;
pub mod draws;
pub mod project;
pub mod tasks;
