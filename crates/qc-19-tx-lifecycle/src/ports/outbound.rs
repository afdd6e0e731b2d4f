//! Outbound (Driven) ports for the Transaction Lifecycle subsystem.
//!
//! Every network-facing call is bounded by the monitor's RPC timeout, so
//! implementations need not enforce one themselves.

use crate::domain::{OutcomeEvent, PendingTransaction};
use crate::error::{ArchiveError, BroadcastError, ChainError, StrategyError};
use async_trait::async_trait;
use shared_types::{Address, FeeParams, Hash, Timestamp, TransactionReceipt, U256};
use std::fmt;
use uuid::Uuid;

/// Read access to finalized chain state.
#[async_trait]
pub trait ChainStateReader: Send + Sync {
    /// Receipt of `hash` once its block is final.
    ///
    /// # Returns
    /// - `Ok(Some(receipt))`: included and final
    /// - `Ok(None)`: not found yet
    /// - `Err`: lookup failed
    async fn get_receipt(&self, hash: &Hash) -> Result<Option<TransactionReceipt>, ChainError>;

    /// Current balance of `address`.
    async fn get_balance(&self, address: &Address) -> Result<U256, ChainError>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// What the fee escalation policy wants to do with a pending transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyDecision {
    /// Leave it alone this tick.
    Hold(String),
    /// Rebroadcast with these fees.
    Resubmit(FeeParams),
    /// Fees cannot be raised any further.
    FeeCapReached,
}

/// Pluggable fee escalation policy.
///
/// Consulted only for transactions still unresolved after classification.
#[async_trait]
pub trait ResubmitStrategy: Send + Sync {
    async fn next_fees(
        &self,
        tx: &PendingTransaction,
        now: Timestamp,
    ) -> Result<StrategyDecision, StrategyError>;
}

/// Rebroadcasts a tracked transaction with new fees.
#[async_trait]
pub trait TransactionBroadcaster: Send + Sync {
    /// Returns the hash of the new broadcast.
    async fn broadcast(
        &self,
        tx: &PendingTransaction,
        fees: &FeeParams,
    ) -> Result<Hash, BroadcastError>;
}

/// Receives every terminal record. Optional.
#[async_trait]
pub trait TransactionArchive: Send + Sync {
    async fn archive(&self, event: &OutcomeEvent) -> Result<(), ArchiveError>;
}

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Info => write!(f, "info"),
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Error => write!(f, "error"),
            AlertLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Structured context attached to an alert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertContext {
    /// Task that raised the alert.
    pub task: String,
    /// Tick during which the failure happened, when known.
    pub tick_id: Option<Uuid>,
    /// Consecutive failed ticks including this one.
    pub consecutive_failures: u32,
    /// Free-form key/value pairs.
    pub fields: Vec<(String, String)>,
}

impl AlertContext {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.fields.push((key.into(), value.to_string()));
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Logging/alerting sink.
///
/// Written to only from the monitor's `handle_errors`.
pub trait AlertSink: Send + Sync {
    fn alert(&self, level: AlertLevel, message: &str, context: &AlertContext);
}
