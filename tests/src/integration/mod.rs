//! # Integration Scenarios
//!
//! Monitor and supervisor wired together, driven by paused tokio time so
//! ticks and transaction timeouts share one deterministic clock.

pub mod scenarios;
pub mod supervision;
