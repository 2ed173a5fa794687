//! # cpm-cli — Construction Project Ledger CLI
//!
//! Works on a project directory (see [`project`]) so a lender's draw
//! workflow can be run without the HTTP service.
//!
//! ## Subcommands
//!
//! - `init` — write the project configuration
//! - `task` — add tasks and move them through approval
//! - `completion` — completed-work percentage and draw eligibility
//! - `draw` — create, schedule, disburse and delete draws
//!
//! Handlers return the process exit code: 0 on success, 2 when the draw
//! milestone blocks the request. Errors exit 1.
//! Business rules live in `cpm-ledger`; handlers load state, call it, save.

pub mod completion;
pub mod draw;
pub mod init;
pub mod project;
pub mod task;
