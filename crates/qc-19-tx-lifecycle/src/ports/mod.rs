//! Ports layer for the Transaction Lifecycle subsystem.
//!
//! - Inbound (Driving) ports: API exposed to the strategy layer
//! - Outbound (Driven) ports: chain access, clock, alerting, resubmission, archive

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
