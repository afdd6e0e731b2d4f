//! # Fault Classifier
//!
//! Pure decision policy mapping what was observed about a transaction to an
//! [`Outcome`]. Stages run in fixed precedence:
//!
//! 1. On-chain facts (receipt): finalized, reverted, malformed
//! 2. Policy timers: pause, timeout
//! 3. Balance: insufficient funds
//!
//! An earlier stage that resolves masks every later one. A transient receipt
//! failure leaves on-chain facts unknown, so the balance stage is skipped:
//! the transaction may already be mined and have spent the funds.

use crate::domain::entities::PendingTransaction;
use crate::domain::fault::{Fault, TransactionFaulted};
use crate::domain::outcome::Outcome;
use crate::error::ChainError;
use shared_types::{short_hex, Timestamp, TransactionReceipt, U256};

/// Everything observed about one transaction during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Clock reading for this evaluation.
    pub now: Timestamp,
    /// Receipt lookup result. `Ok(None)` means "not found yet".
    pub receipt: Result<Option<TransactionReceipt>, ChainError>,
    /// Sender balance lookup. `None` when it was not needed.
    pub balance: Option<Result<U256, ChainError>>,
}

impl Observation {
    /// Observation with no receipt and no balance lookup.
    pub fn pending(now: Timestamp) -> Self {
        Self {
            now,
            receipt: Ok(None),
            balance: None,
        }
    }

    /// Sets a found receipt.
    pub fn with_receipt(mut self, receipt: TransactionReceipt) -> Self {
        self.receipt = Ok(Some(receipt));
        self
    }

    /// Sets a failed receipt lookup.
    pub fn with_receipt_error(mut self, error: ChainError) -> Self {
        self.receipt = Err(error);
        self
    }

    /// Sets a sender balance.
    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = Some(Ok(balance));
        self
    }

    /// Sets a failed balance lookup.
    pub fn with_balance_error(mut self, error: ChainError) -> Self {
        self.balance = Some(Err(error));
        self
    }
}

/// Classifies observations into outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultClassifier {
    /// Report a timed-out, fee-capped transaction as `PAUSE` instead of `TIMEOUT`.
    pub pause_on_capped_timeout: bool,
}

impl Default for FaultClassifier {
    fn default() -> Self {
        Self {
            pause_on_capped_timeout: true,
        }
    }
}

impl FaultClassifier {
    pub fn new(pause_on_capped_timeout: bool) -> Self {
        Self {
            pause_on_capped_timeout,
        }
    }

    /// Classify one transaction.
    pub fn classify(&self, tx: &PendingTransaction, observation: &Observation) -> Outcome {
        if let Some(outcome) = self.resolve_before_balance(tx, observation.now, &observation.receipt)
        {
            return outcome;
        }

        if observation.receipt.is_ok() {
            if let Some(outcome) = observation
                .balance
                .as_ref()
                .and_then(|balance| self.check_balance(tx, balance))
            {
                return outcome;
            }
        }

        match &observation.receipt {
            Err(e) => Outcome::Wait(format!("Receipt unavailable: {e}")),
            Ok(_) => Outcome::Wait(format!(
                "Awaiting receipt ({} ms elapsed)",
                tx.elapsed_ms(observation.now)
            )),
        }
    }

    /// True if the receipt lookup succeeded and the receipt and policy stages
    /// leave the transaction unresolved, so a balance lookup could still
    /// change the outcome.
    pub fn needs_balance(
        &self,
        tx: &PendingTransaction,
        now: Timestamp,
        receipt: &Result<Option<TransactionReceipt>, ChainError>,
    ) -> bool {
        receipt.is_ok() && self.resolve_before_balance(tx, now, receipt).is_none()
    }

    fn resolve_before_balance(
        &self,
        tx: &PendingTransaction,
        now: Timestamp,
        receipt: &Result<Option<TransactionReceipt>, ChainError>,
    ) -> Option<Outcome> {
        self.check_receipt(tx, receipt)
            .or_else(|| self.check_policy(tx, now))
    }

    fn check_receipt(
        &self,
        tx: &PendingTransaction,
        receipt: &Result<Option<TransactionReceipt>, ChainError>,
    ) -> Option<Outcome> {
        match receipt {
            Ok(Some(receipt)) if !tx.is_broadcast_hash(&receipt.tx_hash) => {
                Some(Outcome::Faulted(TransactionFaulted::new(
                    tx.clone(),
                    Fault::Error,
                    format!(
                        "Receipt hash mismatch: expected {}, got {}",
                        short_hex(&tx.hash),
                        short_hex(&receipt.tx_hash)
                    ),
                )))
            }
            Ok(Some(receipt)) if receipt.is_success() => {
                Some(Outcome::Finalized(receipt.clone()))
            }
            Ok(Some(receipt)) => Some(Outcome::Faulted(TransactionFaulted::reverted(
                tx.clone(),
                receipt.clone(),
            ))),
            Err(e) if !e.is_transient() => Some(Outcome::Faulted(TransactionFaulted::new(
                tx.clone(),
                Fault::Error,
                format!("Receipt lookup failed: {e}"),
            ))),
            Ok(None) | Err(_) => None,
        }
    }

    fn check_policy(&self, tx: &PendingTransaction, now: Timestamp) -> Option<Outcome> {
        if !tx.is_timed_out(now) {
            return None;
        }

        let elapsed = tx.elapsed_ms(now);
        let max_wait = tx.policy.max_wait.as_millis();
        let capped = tx.fee_capped || tx.at_fee_cap();

        let faulted = if capped && self.pause_on_capped_timeout {
            TransactionFaulted::new(
                tx.clone(),
                Fault::Pause,
                format!(
                    "Fee cap reached and not final after {elapsed} ms (max {max_wait} ms)"
                ),
            )
        } else {
            TransactionFaulted::new(
                tx.clone(),
                Fault::Timeout,
                format!("Not final after {elapsed} ms (max {max_wait} ms)"),
            )
        };
        Some(Outcome::Faulted(faulted))
    }

    fn check_balance(
        &self,
        tx: &PendingTransaction,
        balance: &Result<U256, ChainError>,
    ) -> Option<Outcome> {
        match balance {
            Ok(balance) => {
                let required = tx.required_funds();
                (*balance < required).then(|| {
                    Outcome::Faulted(TransactionFaulted::new(
                        tx.clone(),
                        Fault::InsufficientFunds,
                        format!("Balance {balance} below required {required}"),
                    ))
                })
            }
            Err(e) if e.is_transient() => {
                Some(Outcome::Wait(format!("Balance unavailable: {e}")))
            }
            Err(e) => Some(Outcome::Faulted(TransactionFaulted::new(
                tx.clone(),
                Fault::Error,
                format!("Balance lookup failed: {e}"),
            ))),
        }
    }
}
