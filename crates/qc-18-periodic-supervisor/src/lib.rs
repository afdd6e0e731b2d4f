//! # qc-18-periodic-supervisor
//!
//! Interval-driven execution primitive. Runs a caller-supplied
//! [`PeriodicTask`] on a fixed interval until stopped, and keeps running when
//! a single execution fails.
//!
//! ## Overview
//!
//! - **Idempotent lifecycle**: `start` on a running supervisor and `stop` on a
//!   stopped one are no-ops.
//! - **Single execution context**: at most one `run()` is in flight. An
//!   overrunning tick defers the next one; ticks never overlap or queue up.
//! - **Error boundary**: errors and panics escaping `run()` are routed to
//!   `handle_errors`, which decides whether the loop continues (default) or
//!   halts.
//!
//! ## Lifecycle
//!
//! ```text
//! [STOPPED] ──start(now)──→ [RUNNING] ──tick──→ run()
//!     ↑                        │  ↑                │
//!     │                        │  └──── Ok / Err ──┤ handle_errors() == Continue
//!     │                        │                   │
//!     └─────── stop() ─────────┘                   └── handle_errors() == Halt ──→ [STOPPED]
//! ```
//!
//! `stop()` never interrupts the in-flight tick; it takes effect once that
//! tick has returned.
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_18_periodic_supervisor::{PeriodicSupervisor, SupervisorConfig};
//!
//! let supervisor = PeriodicSupervisor::new(Arc::new(task), SupervisorConfig::default())?;
//! let handle = supervisor.start(true).expect("not running yet");
//!
//! // ... later
//! supervisor.stop();
//! handle.join().await?;
//! ```

pub mod config;
pub mod error;
pub mod supervisor;
pub mod task;

pub use config::SupervisorConfig;
pub use error::{SupervisorError, SupervisorResult, TickError};
pub use supervisor::{PeriodicSupervisor, SupervisorHandle};
pub use task::{ErrorAction, PeriodicTask};
