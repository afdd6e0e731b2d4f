//! Scripted resubmission collaborators.

use crate::domain::PendingTransaction;
use crate::error::{BroadcastError, StrategyError};
use crate::ports::outbound::{ResubmitStrategy, StrategyDecision, TransactionBroadcaster};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{FeeParams, Hash, Timestamp};
use std::collections::VecDeque;

/// Strategy that replays a queue of decisions, then holds.
#[derive(Debug, Default)]
pub struct ScriptedStrategy {
    decisions: Mutex<VecDeque<Result<StrategyDecision, StrategyError>>>,
    consulted: Mutex<Vec<Hash>>,
}

impl ScriptedStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, decision: StrategyDecision) {
        self.decisions.lock().push_back(Ok(decision));
    }

    pub fn push_error(&self, error: StrategyError) {
        self.decisions.lock().push_back(Err(error));
    }

    /// Hashes the strategy was consulted for, in order.
    pub fn consulted(&self) -> Vec<Hash> {
        self.consulted.lock().clone()
    }
}

#[async_trait]
impl ResubmitStrategy for ScriptedStrategy {
    async fn next_fees(
        &self,
        tx: &PendingTransaction,
        _now: Timestamp,
    ) -> Result<StrategyDecision, StrategyError> {
        self.consulted.lock().push(tx.hash);
        self.decisions
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(StrategyDecision::Hold("no decision scripted".into())))
    }
}

/// Broadcaster that derives a new hash from the old one and the attempt
/// count, or fails with a queued error.
#[derive(Debug, Default)]
pub struct InMemoryBroadcaster {
    failures: Mutex<VecDeque<BroadcastError>>,
    sent: Mutex<Vec<(Hash, FeeParams)>>,
}

impl InMemoryBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next broadcast with `error`.
    pub fn fail_next(&self, error: BroadcastError) {
        self.failures.lock().push_back(error);
    }

    /// Successful broadcasts as (new hash, fees).
    pub fn sent(&self) -> Vec<(Hash, FeeParams)> {
        self.sent.lock().clone()
    }

    /// Hash the next rebroadcast of `tx` will get.
    pub fn next_hash(tx: &PendingTransaction) -> Hash {
        let mut hash = tx.hash;
        hash[31] = hash[31].wrapping_add(1);
        hash[30] = hash[30].wrapping_add(tx.attempts as u8);
        hash
    }
}

#[async_trait]
impl TransactionBroadcaster for InMemoryBroadcaster {
    async fn broadcast(
        &self,
        tx: &PendingTransaction,
        fees: &FeeParams,
    ) -> Result<Hash, BroadcastError> {
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        let hash = Self::next_hash(tx);
        self.sent.lock().push((hash, *fees));
        Ok(hash)
    }
}
