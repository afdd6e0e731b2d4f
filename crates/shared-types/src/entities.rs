//! # Core Chain Entities
//!
//! Primitive types observed by the transaction lifecycle supervisor.
//!
//! ## Clusters
//!
//! - **Identity**: `Hash`, `Address`, `Timestamp`
//! - **Fees**: `FeeParams`
//! - **Execution**: `TransactionReceipt`, `ReceiptStatus`

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte transaction or block hash.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// Timestamp in milliseconds since UNIX epoch.
pub type Timestamp = u64;

/// Renders the first four bytes of a hash or address as `0x12345678…`.
///
/// Used in log fields where the full value would only add noise.
pub fn short_hex(bytes: &[u8]) -> String {
    let end = bytes.len().min(4);
    format!("0x{}…", hex::encode(&bytes[..end]))
}

/// Renders the full value as `0x`-prefixed lowercase hex.
pub fn full_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

// =============================================================================
// CLUSTER B: FEES
// =============================================================================

/// EIP-1559 style fee parameters of a broadcast transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeParams {
    /// Maximum total fee per gas the sender is willing to pay.
    pub max_fee_per_gas: U256,
    /// Maximum tip per gas paid to the block producer.
    pub max_priority_fee_per_gas: U256,
    /// Gas limit of the transaction.
    pub gas_limit: u64,
}

impl FeeParams {
    /// Creates fee parameters.
    pub fn new(max_fee_per_gas: U256, max_priority_fee_per_gas: U256, gas_limit: u64) -> Self {
        Self {
            max_fee_per_gas,
            max_priority_fee_per_gas,
            gas_limit,
        }
    }

    /// Worst-case gas cost (`max_fee_per_gas * gas_limit`), saturating.
    pub fn max_gas_cost(&self) -> U256 {
        self.max_fee_per_gas.saturating_mul(U256::from(self.gas_limit))
    }

    /// Returns true if the fee per gas is above `cap`.
    pub fn exceeds(&self, cap: U256) -> bool {
        self.max_fee_per_gas > cap
    }

    /// Clamps both per-gas fees to `cap`.
    pub fn capped_at(self, cap: U256) -> Self {
        Self {
            max_fee_per_gas: self.max_fee_per_gas.min(cap),
            max_priority_fee_per_gas: self.max_priority_fee_per_gas.min(cap),
            gas_limit: self.gas_limit,
        }
    }
}

// =============================================================================
// CLUSTER C: EXECUTION
// =============================================================================

/// Execution status reported by a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    /// Execution succeeded (status `1`).
    Success,
    /// Execution reverted (status `0`).
    Failed,
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiptStatus::Success => write!(f, "success"),
            ReceiptStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Receipt of a mined transaction.
///
/// A receipt is only handed to the supervisor once the chain-state reader
/// considers the containing block final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Hash of the transaction this receipt belongs to.
    pub tx_hash: Hash,
    /// Block that included the transaction.
    pub block_number: u64,
    /// Hash of the including block.
    pub block_hash: Hash,
    /// Gas consumed by execution.
    pub gas_used: u64,
    /// Price per gas actually paid.
    pub effective_gas_price: U256,
    /// Execution status.
    pub status: ReceiptStatus,
}

impl TransactionReceipt {
    /// Returns true if execution succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.status, ReceiptStatus::Success)
    }

    /// Total fee paid (`gas_used * effective_gas_price`), saturating.
    pub fn fee_paid(&self) -> U256 {
        self.effective_gas_price
            .saturating_mul(U256::from(self.gas_used))
    }
}
