//! Domain layer: pure transaction lifecycle logic, no I/O.

pub mod classifier;
pub mod entities;
pub mod fault;
pub mod outcome;
pub mod tracker;

pub use classifier::{FaultClassifier, Observation};
pub use entities::{PendingTransaction, TxPolicy};
pub use fault::{Fault, TransactionFaulted};
pub use outcome::{MonitorStatus, OutcomeEvent, OutcomeKind, Outcome, TickReport};
pub use tracker::TransactionTracker;
