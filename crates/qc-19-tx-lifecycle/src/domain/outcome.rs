//! Outcome signals, subscriber events and per-tick reporting.

use crate::domain::entities::PendingTransaction;
use crate::domain::fault::{Fault, TransactionFaulted};
use serde::Serialize;
use shared_types::{Hash, Timestamp, TransactionReceipt};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Result of one evaluation of a tracked transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Successful receipt. Terminal.
    Finalized(TransactionReceipt),
    /// Fault raised. Terminal.
    Faulted(TransactionFaulted),
    /// Nothing resolved yet; check again next tick.
    Wait(String),
    /// Progress was made without resolution (the transaction was rebroadcast).
    Continue,
}

impl Outcome {
    /// True for `Finalized` and `Faulted`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Outcome::Finalized(_) | Outcome::Faulted(_))
    }

    /// Fault kind, if faulted.
    pub fn fault(&self) -> Option<Fault> {
        match self {
            Outcome::Faulted(f) => Some(f.fault),
            _ => None,
        }
    }

    /// Payload-free classification.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Finalized(_) => OutcomeKind::Finalized,
            Outcome::Faulted(f) => OutcomeKind::Faulted(f.fault),
            Outcome::Wait(_) => OutcomeKind::Wait,
            Outcome::Continue => OutcomeKind::Continue,
        }
    }
}

/// [`Outcome`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Finalized,
    Faulted(Fault),
    Wait,
    Continue,
}

impl OutcomeKind {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Finalized => "finalized",
            OutcomeKind::Faulted(_) => "faulted",
            OutcomeKind::Wait => "wait",
            OutcomeKind::Continue => "continue",
        }
    }
}

/// Terminal outcome published to subscribers.
///
/// Ownership of the record passes to the subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeEvent {
    Finalized {
        tx: PendingTransaction,
        receipt: TransactionReceipt,
    },
    Faulted(TransactionFaulted),
}

impl OutcomeEvent {
    /// Hash of the transaction the event concerns.
    pub fn hash(&self) -> Hash {
        self.tx().hash
    }

    /// The terminal record.
    pub fn tx(&self) -> &PendingTransaction {
        match self {
            OutcomeEvent::Finalized { tx, .. } => tx,
            OutcomeEvent::Faulted(f) => &f.tx,
        }
    }

    /// Fault kind, if faulted.
    pub fn fault(&self) -> Option<Fault> {
        match self {
            OutcomeEvent::Finalized { .. } => None,
            OutcomeEvent::Faulted(f) => Some(f.fault),
        }
    }
}

/// Summary of one `evaluate_all` pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Correlates log lines of one tick.
    pub tick_id: Uuid,
    /// Clock reading at the start of the tick.
    pub started_at: Timestamp,
    /// Outcome per evaluated transaction, in evaluation order.
    pub outcomes: Vec<(Hash, OutcomeKind)>,
    /// Terminal records the archive refused.
    pub archive_failures: Vec<(Hash, String)>,
}

impl TickReport {
    pub(crate) fn new(started_at: Timestamp) -> Self {
        Self {
            tick_id: Uuid::new_v4(),
            started_at,
            outcomes: Vec::new(),
            archive_failures: Vec::new(),
        }
    }

    /// Number of transactions evaluated.
    pub fn evaluated(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of outcomes of the given kind.
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|(_, k)| *k == kind).count()
    }

    /// Outcome recorded for `hash`, if it was evaluated.
    pub fn outcome_of(&self, hash: &Hash) -> Option<OutcomeKind> {
        self.outcomes
            .iter()
            .find(|(h, _)| h == hash)
            .map(|(_, k)| *k)
    }

    /// Transactions that faulted with `ERROR`.
    pub fn unexpected_faults(&self) -> impl Iterator<Item = &Hash> {
        self.outcomes
            .iter()
            .filter(|(_, k)| *k == OutcomeKind::Faulted(Fault::Error))
            .map(|(h, _)| h)
    }
}

/// Point-in-time counters of a monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStatus {
    /// Transactions currently tracked.
    pub tracked: usize,
    /// Completed `evaluate_all` passes.
    pub ticks: u64,
    /// Transactions finalized so far.
    pub finalized: u64,
    /// Faults raised so far, per kind.
    pub faulted: BTreeMap<Fault, u64>,
    /// Transactions removed through `abandon`.
    pub abandoned: u64,
    /// Rebroadcasts performed.
    pub resubmissions: u64,
}

impl MonitorStatus {
    /// Total faults of all kinds.
    pub fn total_faulted(&self) -> u64 {
        self.faulted.values().sum()
    }
}
