//! # Inbound Port - TransactionLifecycleApi
//!
//! Driving port used by the strategy layer that submits transactions and
//! consumes their terminal outcomes.

use crate::domain::{MonitorStatus, OutcomeEvent, PendingTransaction};
use crate::error::LifecycleResult;
use shared_types::Hash;
use tokio::sync::broadcast;

/// Primary API of the Transaction Lifecycle subsystem.
///
/// Callers only ever see snapshots; records change solely through `track`,
/// `abandon` and evaluation.
///
/// # Example
///
/// ```rust,ignore
/// use qc_19_tx_lifecycle::TransactionLifecycleApi;
///
/// async fn example(api: &impl TransactionLifecycleApi, tx: PendingTransaction) {
///     let mut outcomes = api.subscribe();
///     api.track(tx)?;
///     while let Ok(event) = outcomes.recv().await {
///         println!("{:?} -> {:?}", event.hash(), event.fault());
///     }
/// }
/// ```
pub trait TransactionLifecycleApi: Send + Sync {
    /// Start tracking a submitted transaction.
    ///
    /// # Errors
    /// - `DuplicateTransaction`: hash already tracked
    /// - `NonceAlreadyTracked`: (sender, nonce) already tracked
    /// - `InvalidTransaction`: record failed validation
    fn track(&self, tx: PendingTransaction) -> LifecycleResult<()>;

    /// Stop tracking without raising a fault. Returns the record if it was tracked.
    fn abandon(&self, hash: &Hash) -> Option<PendingTransaction>;

    /// Tracked records in evaluation order.
    fn snapshot(&self) -> Vec<PendingTransaction>;

    /// True if `hash` is currently tracked.
    fn is_tracked(&self, hash: &Hash) -> bool;

    /// Current counters.
    fn status(&self) -> MonitorStatus;

    /// Receive every `Finalized`/`Faulted` outcome published after this call.
    fn subscribe(&self) -> broadcast::Receiver<OutcomeEvent>;
}
