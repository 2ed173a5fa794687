//! # HTTP Middleware
//!
//! - `metrics`: request, error and conflict counters.

pub mod metrics;
