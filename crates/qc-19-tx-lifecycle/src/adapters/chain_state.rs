//! In-memory chain state reader.

use crate::error::ChainError;
use crate::ports::outbound::ChainStateReader;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{short_hex, Address, Hash, TransactionReceipt, U256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Chain state held in memory, with injectable failures and latency.
#[derive(Default)]
pub struct InMemoryChainState {
    receipts: RwLock<HashMap<Hash, TransactionReceipt>>,
    balances: RwLock<HashMap<Address, U256>>,
    receipt_failures: RwLock<HashMap<Hash, ChainError>>,
    balance_failures: RwLock<HashMap<Address, ChainError>>,
    latency: RwLock<Option<Duration>>,
    receipt_calls: AtomicU64,
    balance_calls: AtomicU64,
}

impl InMemoryChainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a receipt visible. Keyed by `receipt.tx_hash`.
    pub fn set_receipt(&self, receipt: TransactionReceipt) {
        self.receipts.write().insert(receipt.tx_hash, receipt);
    }

    /// Make a receipt visible under an arbitrary hash.
    pub fn set_receipt_for(&self, hash: Hash, receipt: TransactionReceipt) {
        self.receipts.write().insert(hash, receipt);
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        self.balances.write().insert(address, balance);
    }

    /// Fail every receipt lookup of `hash` until cleared.
    pub fn fail_receipt(&self, hash: Hash, error: ChainError) {
        self.receipt_failures.write().insert(hash, error);
    }

    /// Fail every balance lookup of `address` until cleared.
    pub fn fail_balance(&self, address: Address, error: ChainError) {
        self.balance_failures.write().insert(address, error);
    }

    pub fn clear_failures(&self) {
        self.receipt_failures.write().clear();
        self.balance_failures.write().clear();
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write() = latency;
    }

    pub fn receipt_calls(&self) -> u64 {
        self.receipt_calls.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> u64 {
        self.balance_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl ChainStateReader for InMemoryChainState {
    async fn get_receipt(&self, hash: &Hash) -> Result<Option<TransactionReceipt>, ChainError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        debug!(tx_hash = %short_hex(hash), "Receipt lookup");

        if let Some(error) = self.receipt_failures.read().get(hash) {
            return Err(error.clone());
        }
        Ok(self.receipts.read().get(hash).cloned())
    }

    async fn get_balance(&self, address: &Address) -> Result<U256, ChainError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if let Some(error) = self.balance_failures.read().get(address) {
            return Err(error.clone());
        }
        Ok(self
            .balances
            .read()
            .get(address)
            .copied()
            .unwrap_or_default())
    }
}
