//! # Tracked Transaction Entities
//!
//! `PendingTransaction` is the one record the lifecycle subsystem owns. It is
//! created by `track()`, mutated only during evaluation, and handed back to the
//! caller when it reaches a terminal outcome.

use serde::{Deserialize, Serialize};
use shared_types::{Address, FeeParams, Hash, Timestamp, U256};
use std::time::Duration;

/// Per-transaction policy limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPolicy {
    /// Time since submission after which the transaction times out.
    pub max_wait: Duration,
    /// Ceiling on `max_fee_per_gas`. `None` means fees are never capped.
    pub fee_cap: Option<U256>,
}

impl Default for TxPolicy {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(300),
            fee_cap: None,
        }
    }
}

impl TxPolicy {
    /// Policy with the given wait limit and no fee cap.
    pub fn with_max_wait(max_wait: Duration) -> Self {
        Self {
            max_wait,
            fee_cap: None,
        }
    }

    /// Sets the fee cap.
    pub fn fee_cap(mut self, cap: U256) -> Self {
        self.fee_cap = Some(cap);
        self
    }
}

/// A submitted, not-yet-final transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Hash of the most recent broadcast.
    pub hash: Hash,
    /// Hashes of earlier broadcasts superseded by a resubmission, oldest
    /// first. Any of them may still be the one that gets mined.
    #[serde(default)]
    pub previous_hashes: Vec<Hash>,
    /// Sender address.
    pub sender: Address,
    /// Sender nonce.
    pub nonce: u64,
    /// Value transferred.
    pub value: U256,
    /// Fee parameters of the most recent broadcast.
    pub fees: FeeParams,
    /// Time of the first submission (ms). Not reset by resubmission.
    pub submitted_at: Timestamp,
    /// Number of broadcasts so far, starting at 1.
    pub attempts: u32,
    /// Policy limits.
    pub policy: TxPolicy,
    /// Set once the escalation policy refuses to raise fees any further.
    pub fee_capped: bool,
    /// Number of completed evaluations.
    pub evaluations: u64,
    /// Time of the last completed evaluation.
    pub last_evaluated_at: Option<Timestamp>,
}

impl PendingTransaction {
    /// New record for a transaction just broadcast at `submitted_at`.
    pub fn new(
        hash: Hash,
        sender: Address,
        nonce: u64,
        value: U256,
        fees: FeeParams,
        submitted_at: Timestamp,
        policy: TxPolicy,
    ) -> Self {
        Self {
            hash,
            previous_hashes: Vec::new(),
            sender,
            nonce,
            value,
            fees,
            submitted_at,
            attempts: 1,
            policy,
            fee_capped: false,
            evaluations: 0,
            last_evaluated_at: None,
        }
    }

    /// The (sender, nonce) slot this transaction occupies.
    pub fn key(&self) -> (Address, u64) {
        (self.sender, self.nonce)
    }

    /// Every hash this transaction was broadcast under, newest first.
    pub fn broadcast_hashes(&self) -> impl Iterator<Item = &Hash> {
        std::iter::once(&self.hash).chain(self.previous_hashes.iter().rev())
    }

    /// True if `hash` belongs to any broadcast of this transaction.
    pub fn is_broadcast_hash(&self, hash: &Hash) -> bool {
        self.broadcast_hashes().any(|h| h == hash)
    }

    /// Milliseconds since first submission. Zero if the clock went backwards.
    pub fn elapsed_ms(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.submitted_at)
    }

    /// True once elapsed time strictly exceeds `max_wait`.
    pub fn is_timed_out(&self, now: Timestamp) -> bool {
        u128::from(self.elapsed_ms(now)) > self.policy.max_wait.as_millis()
    }

    /// Balance the sender needs to cover value plus worst-case gas.
    pub fn required_funds(&self) -> U256 {
        self.value.saturating_add(self.fees.max_gas_cost())
    }

    /// True if current fees already sit at or above the policy cap.
    pub fn at_fee_cap(&self) -> bool {
        self.policy
            .fee_cap
            .is_some_and(|cap| self.fees.max_fee_per_gas >= cap)
    }
}
