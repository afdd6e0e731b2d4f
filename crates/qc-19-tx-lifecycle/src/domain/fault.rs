//! Terminal fault kinds and the value that carries them out of evaluation.

use crate::domain::entities::PendingTransaction;
use serde::{Deserialize, Serialize};
use shared_types::{short_hex, TransactionReceipt};
use std::fmt;
use thiserror::Error;

/// Terminal, typed exceptional outcome of a tracked transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    /// Not final within `max_wait`.
    Timeout,
    /// Timed out after the fee cap had already been reached.
    Pause,
    /// Included on chain with a failed execution status.
    Revert,
    /// Unexpected classification failure.
    Error,
    /// Sender cannot pay for the transaction.
    InsufficientFunds,
}

impl Fault {
    /// All kinds, in declaration order.
    pub const ALL: [Fault; 5] = [
        Fault::Timeout,
        Fault::Pause,
        Fault::Revert,
        Fault::Error,
        Fault::InsufficientFunds,
    ];

    /// Stable lowercase label, used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Fault::Timeout => "timeout",
            Fault::Pause => "pause",
            Fault::Revert => "revert",
            Fault::Error => "error",
            Fault::InsufficientFunds => "insufficient_funds",
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction that reached a fault.
///
/// Returned as a value from evaluation, never propagated as a failure.
/// Reverts additionally carry the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Transaction {} faulted ({fault}): {message}", short_hex(&.tx.hash))]
pub struct TransactionFaulted {
    /// The record as it was when the fault was raised.
    pub tx: PendingTransaction,
    /// Fault kind.
    pub fault: Fault,
    /// Human-readable diagnostic.
    pub message: String,
    /// Receipt, present for `Revert`.
    pub receipt: Option<TransactionReceipt>,
}

impl TransactionFaulted {
    /// Fault without a receipt.
    pub fn new(tx: PendingTransaction, fault: Fault, message: impl Into<String>) -> Self {
        Self {
            tx,
            fault,
            message: message.into(),
            receipt: None,
        }
    }

    /// `Revert` fault carrying the failed receipt.
    pub fn reverted(tx: PendingTransaction, receipt: TransactionReceipt) -> Self {
        let message = format!(
            "Execution reverted in block {} (gas used {})",
            receipt.block_number, receipt.gas_used
        );
        Self {
            tx,
            fault: Fault::Revert,
            message,
            receipt: Some(receipt),
        }
    }

    /// True for `Revert`.
    pub fn is_revert(&self) -> bool {
        self.fault == Fault::Revert
    }
}
