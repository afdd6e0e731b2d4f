//! # Transaction Lifecycle Subsystem
//!
//! **Subsystem ID:** 19
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Tracks submitted, not-yet-final transactions and drives each one to exactly
//! one terminal outcome. Evaluation runs once per tick of a
//! [`PeriodicSupervisor`](qc_18_periodic_supervisor::PeriodicSupervisor).
//!
//! ## Transaction State Machine
//!
//! ```text
//!                 ┌── receipt ok ─────────→ [FINALIZED]
//!                 ├── receipt failed ─────→ [REVERT]
//!                 ├── malformed/mismatch ─→ [ERROR]
//! [PENDING] ──────┼── timed out, capped ──→ [PAUSE]
//!     ↑           ├── timed out ──────────→ [TIMEOUT]
//!     │           ├── balance too low ────→ [INSUFFICIENT_FUNDS]
//!     └── Wait ───┴── otherwise (maybe resubmitted → Continue)
//! ```
//!
//! Checks run in that order: on-chain facts, then policy timers, then balance.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | One transaction per (sender, nonce) | `domain/tracker.rs` - `track()` |
//! | Exactly one terminal outcome | `service.rs` - publish only after removal |
//! | Faults never reach the error boundary | `service.rs` - only `ERROR` and archive failures do |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/ - in-memory chain state, clock, alert sinks, archive │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - TransactionLifecycleApi                    │
//! │  ports/outbound.rs - ChainStateReader, TimeSource, AlertSink,   │
//! │                      ResubmitStrategy, TransactionBroadcaster,  │
//! │                      TransactionArchive                         │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/classifier.rs - FaultClassifier (pure decision policy)  │
//! │  domain/tracker.rs    - TransactionTracker (tracked set)        │
//! │  domain/entities.rs   - PendingTransaction, TxPolicy            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod telemetry;

pub use config::{ConfigError, MonitorConfig};
pub use domain::*;
pub use error::*;
pub use ports::inbound::TransactionLifecycleApi;
pub use ports::outbound::*;
pub use service::{TransactionMonitor, TransactionSupervisor};
