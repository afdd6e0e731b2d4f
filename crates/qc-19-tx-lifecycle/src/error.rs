//! Error types for the Transaction Lifecycle subsystem
//!
//! Faults are not errors: a [`TransactionFaulted`](crate::domain::TransactionFaulted)
//! is an expected, typed outcome. The types here cover everything else.

use crate::config::ConfigError;
use qc_18_periodic_supervisor::SupervisorError;
use shared_types::{short_hex, Address, Hash};
use std::time::Duration;
use thiserror::Error;

/// Lifecycle subsystem errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Transaction hash is already tracked
    #[error("Transaction already tracked: {}", short_hex(.0))]
    DuplicateTransaction(Hash),

    /// Another transaction already occupies this (sender, nonce) slot
    #[error(
        "Nonce {nonce} of {} already tracked by {}",
        short_hex(.sender),
        short_hex(.existing)
    )]
    NonceAlreadyTracked {
        sender: Address,
        nonce: u64,
        existing: Hash,
    },

    /// Transaction record failed validation
    #[error("Invalid transaction {}: {reason}", short_hex(.hash))]
    InvalidTransaction { hash: Hash, reason: String },

    /// Scheduler could not be created
    #[error("Supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),

    /// Monitor configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Failure reported by the chain-state reader.
///
/// Transient failures and timeouts are distinguishable from a definitive
/// "receipt not found yet", which is `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Network or node hiccup; retry next tick
    #[error("Transient RPC failure: {0}")]
    Transient(String),

    /// The call exceeded the call-level timeout
    #[error("RPC call timed out after {after:?}")]
    Timeout { after: Duration },

    /// The node answered with something unusable
    #[error("Malformed RPC response: {0}")]
    Malformed(String),
}

impl ChainError {
    /// True for failures worth retrying next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::Transient(_) | ChainError::Timeout { .. })
    }
}

/// Failure of the resubmission strategy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Strategy failure: {0}")]
pub struct StrategyError(pub String);

impl From<ChainError> for StrategyError {
    fn from(e: ChainError) -> Self {
        StrategyError(e.to_string())
    }
}

/// Failure to rebroadcast a transaction.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BroadcastError {
    /// Node rejected the transaction because the sender cannot pay for it
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Node rejected the transaction for another reason
    #[error("Broadcast rejected: {0}")]
    Rejected(String),

    /// Transport failure
    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// Failure to hand a terminal record to the archive.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Archive failure: {0}")]
pub struct ArchiveError(pub String);

impl From<ChainError> for ArchiveError {
    fn from(e: ChainError) -> Self {
        ArchiveError(e.to_string())
    }
}

/// Tick-level failures routed to the supervisor's error boundary.
///
/// Raised only after every tracked transaction was evaluated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MonitorError {
    /// One or more transactions ended with an `ERROR` fault
    #[error("{count} transaction(s) faulted unexpectedly: {summary}")]
    UnexpectedFaults { count: usize, summary: String },

    /// Terminal records could not be archived
    #[error("Failed to archive {count} terminal record(s): {summary}")]
    Archive { count: usize, summary: String },

    /// Several of the above in one tick
    #[error("Multiple tick failures: {}", .0.len())]
    Multiple(Vec<MonitorError>),
}
