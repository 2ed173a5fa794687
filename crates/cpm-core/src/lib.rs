//! # cpm-core — Foundational Types for the Project Ledger
//!
//! Every other crate in the workspace depends on `cpm-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Money is integer cents.** [`Money`] wraps an `i64` count of cents.
//!    There is no floating point anywhere on a money path, so summing a few
//!    thousand line items never drifts.
//!
//! 2. **Percentages are exact ratios.** [`Percentage`] keeps the numerator and
//!    denominator it was built from and compares by cross-multiplication. A
//!    70% threshold compared against 77,000 / 110,000 is an exact equality,
//!    not a float comparison that depends on rounding.
//!
//! 3. **Newtype identifiers.** `TaskId`, `DrawId`, `ProjectId` cannot be
//!    confused with each other.
//!
//! 4. **UTC-only timestamps.** [`Timestamp`] is truncated to seconds and
//!    always renders with a `Z` suffix.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cpm-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod money;
pub mod percent;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{DrawId, DrawNumber, ProjectId, TaskId};
pub use money::Money;
pub use percent::Percentage;
pub use temporal::Timestamp;
