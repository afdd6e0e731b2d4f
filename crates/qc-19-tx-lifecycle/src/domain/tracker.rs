//! # Tracked Transaction Set
//!
//! INVARIANT: at most one transaction per (sender, nonce). The nonce index
//! and the pending map are always updated together.

use crate::domain::entities::PendingTransaction;
use crate::error::{LifecycleError, LifecycleResult};
use indexmap::IndexMap;
use shared_types::{Address, FeeParams, Hash, Timestamp};
use std::collections::HashMap;

/// Insertion-ordered set of pending transactions.
#[derive(Debug, Default)]
pub struct TransactionTracker {
    pending: IndexMap<Hash, PendingTransaction>,
    nonces: HashMap<(Address, u64), Hash>,
}

impl TransactionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a transaction.
    ///
    /// # Errors
    /// - `InvalidTransaction`: zero gas limit or zero `max_wait`
    /// - `DuplicateTransaction`: hash already tracked
    /// - `NonceAlreadyTracked`: (sender, nonce) slot occupied
    pub fn track(&mut self, tx: PendingTransaction) -> LifecycleResult<()> {
        if tx.fees.gas_limit == 0 {
            return Err(LifecycleError::InvalidTransaction {
                hash: tx.hash,
                reason: "gas limit is zero".into(),
            });
        }
        if tx.policy.max_wait.is_zero() {
            return Err(LifecycleError::InvalidTransaction {
                hash: tx.hash,
                reason: "max wait is zero".into(),
            });
        }
        if self.pending.contains_key(&tx.hash) {
            return Err(LifecycleError::DuplicateTransaction(tx.hash));
        }
        if let Some(existing) = self.nonces.get(&tx.key()) {
            return Err(LifecycleError::NonceAlreadyTracked {
                sender: tx.sender,
                nonce: tx.nonce,
                existing: *existing,
            });
        }

        self.nonces.insert(tx.key(), tx.hash);
        self.pending.insert(tx.hash, tx);
        Ok(())
    }

    /// Stop tracking `hash`, returning its record.
    pub fn remove(&mut self, hash: &Hash) -> Option<PendingTransaction> {
        let tx = self.pending.shift_remove(hash)?;
        self.nonces.remove(&tx.key());
        Some(tx)
    }

    /// Explicitly give up on `hash`. No fault is raised.
    pub fn abandon(&mut self, hash: &Hash) -> Option<PendingTransaction> {
        self.remove(hash)
    }

    pub fn get(&self, hash: &Hash) -> Option<&PendingTransaction> {
        self.pending.get(hash)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.pending.contains_key(hash)
    }

    /// Hash tracked for (sender, nonce), if any.
    pub fn by_nonce(&self, sender: &Address, nonce: u64) -> Option<&Hash> {
        self.nonces.get(&(*sender, nonce))
    }

    /// Cloned records in insertion order.
    pub fn snapshot(&self) -> Vec<PendingTransaction> {
        self.pending.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Bump the evaluation counter. Returns false if `hash` is not tracked.
    pub fn record_evaluation(&mut self, hash: &Hash, now: Timestamp) -> bool {
        match self.pending.get_mut(hash) {
            Some(tx) => {
                tx.evaluations += 1;
                tx.last_evaluated_at = Some(now);
                true
            }
            None => false,
        }
    }

    /// Mark `hash` as having reached its fee cap.
    pub fn mark_fee_capped(&mut self, hash: &Hash) -> bool {
        match self.pending.get_mut(hash) {
            Some(tx) => {
                tx.fee_capped = true;
                true
            }
            None => false,
        }
    }

    /// Replace `old` with the rebroadcast `new` hash, keeping its position.
    ///
    /// Bumps `attempts` and installs `fees`. `old` is kept in
    /// `previous_hashes` since it can still be mined. The (sender, nonce) slot
    /// moves with the record.
    ///
    /// # Errors
    /// `DuplicateTransaction` if `new` is already tracked as another record.
    pub fn record_resubmission(
        &mut self,
        old: &Hash,
        new: Hash,
        fees: FeeParams,
    ) -> LifecycleResult<Option<&PendingTransaction>> {
        if *old != new && self.pending.contains_key(&new) {
            return Err(LifecycleError::DuplicateTransaction(new));
        }

        let Some((index, _, mut tx)) = self.pending.shift_remove_full(old) else {
            return Ok(None);
        };

        if *old != new {
            tx.previous_hashes.push(*old);
        }
        tx.hash = new;
        tx.fees = fees;
        tx.attempts = tx.attempts.saturating_add(1);
        self.nonces.insert(tx.key(), new);
        self.pending.shift_insert(index, new, tx);
        Ok(self.pending.get(&new))
    }
}
