//! Transaction Monitor Service
//!
//! Evaluates every tracked transaction once per tick and applies the
//! outcome: terminal outcomes remove the record and are published, `Wait`
//! only bumps bookkeeping, `Continue` means the record was rebroadcast.

use crate::adapters::TracingAlertSink;
use crate::config::MonitorConfig;
use crate::domain::{
    Fault, FaultClassifier, MonitorStatus, Observation, Outcome, OutcomeEvent, OutcomeKind,
    PendingTransaction, TickReport, TransactionFaulted, TransactionTracker, TxPolicy,
};
use crate::error::{BroadcastError, ChainError, LifecycleResult, MonitorError};
use crate::metrics;
use crate::ports::inbound::TransactionLifecycleApi;
use crate::ports::outbound::{
    AlertContext, AlertLevel, AlertSink, ChainStateReader, ResubmitStrategy, StrategyDecision,
    TimeSource, TransactionArchive, TransactionBroadcaster,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use qc_18_periodic_supervisor::{
    ErrorAction, PeriodicSupervisor, PeriodicTask, SupervisorHandle, TickError,
};
use shared_types::{
    short_hex, Address, FeeParams, Hash, Timestamp, TransactionReceipt, U256,
};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

const TASK_NAME: &str = "tx-lifecycle-monitor";

/// Fee escalation collaborators. Both are needed to rebroadcast.
#[derive(Clone)]
pub struct Resubmission {
    pub strategy: Arc<dyn ResubmitStrategy>,
    pub broadcaster: Arc<dyn TransactionBroadcaster>,
}

/// The fault state machine, driven once per supervisor tick.
///
/// INVARIANT: an outcome event is published only by the evaluation that
/// removed the record from the tracker, so each transaction yields at most
/// one terminal event.
pub struct TransactionMonitor<C, T> {
    chain: Arc<C>,
    clock: Arc<T>,
    config: MonitorConfig,
    classifier: FaultClassifier,
    tracker: RwLock<TransactionTracker>,
    outcomes: broadcast::Sender<OutcomeEvent>,
    alerts: Arc<dyn AlertSink>,
    resubmission: Option<Resubmission>,
    archive: Option<Arc<dyn TransactionArchive>>,
    stats: Mutex<MonitorStatus>,
    last_report: Mutex<Option<TickReport>>,
    consecutive_failures: AtomicU32,
}

impl<C, T> TransactionMonitor<C, T>
where
    C: ChainStateReader,
    T: TimeSource,
{
    /// # Errors
    /// `Config` if `config` fails validation.
    pub fn new(chain: Arc<C>, clock: Arc<T>, config: MonitorConfig) -> LifecycleResult<Self> {
        config.validate()?;
        let (outcomes, _) = broadcast::channel(config.outcome_channel_capacity);

        Ok(Self {
            chain,
            clock,
            classifier: config.classifier(),
            config,
            tracker: RwLock::new(TransactionTracker::new()),
            outcomes,
            alerts: Arc::new(TracingAlertSink),
            resubmission: None,
            archive: None,
            stats: Mutex::new(MonitorStatus::default()),
            last_report: Mutex::new(None),
            consecutive_failures: AtomicU32::new(0),
        })
    }

    /// Replace the default tracing alert sink.
    pub fn with_alert_sink(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = alerts;
        self
    }

    /// Enable fee escalation for unresolved transactions.
    pub fn with_resubmission(
        mut self,
        strategy: Arc<dyn ResubmitStrategy>,
        broadcaster: Arc<dyn TransactionBroadcaster>,
    ) -> Self {
        self.resubmission = Some(Resubmission {
            strategy,
            broadcaster,
        });
        self
    }

    /// Hand every terminal record to `archive`.
    pub fn with_archive(mut self, archive: Arc<dyn TransactionArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Policy applied to records built by [`pending`](Self::pending).
    pub fn default_policy(&self) -> TxPolicy {
        self.config.default_policy
    }

    /// Record for a transaction broadcast just now under the default policy.
    pub fn pending(
        &self,
        hash: Hash,
        sender: Address,
        nonce: u64,
        value: U256,
        fees: FeeParams,
    ) -> PendingTransaction {
        PendingTransaction::new(
            hash,
            sender,
            nonce,
            value,
            fees,
            self.clock.now(),
            self.config.default_policy,
        )
    }

    /// Report of the most recent completed tick.
    pub fn last_report(&self) -> Option<TickReport> {
        self.last_report.lock().clone()
    }

    /// Evaluate every tracked transaction once, in insertion order.
    ///
    /// Never fails: per-transaction problems become outcomes, archive
    /// failures are collected in the report.
    pub async fn evaluate_all(&self) -> TickReport {
        let now = self.clock.now();
        let mut report = TickReport::new(now);
        let snapshot = self.tracker.read().snapshot();

        debug!(tick_id = %report.tick_id, tracked = snapshot.len(), "Evaluating tracked transactions");

        for tx in snapshot {
            let outcome = self.evaluate(&tx, now).await;
            let kind = outcome.kind();
            metrics::record_outcome(kind.as_str());
            self.apply(&tx, outcome, now, &mut report).await;
            report.outcomes.push((tx.hash, kind));
        }

        self.stats.lock().ticks += 1;
        metrics::record_tick();
        metrics::set_tracked(self.tracker.read().len());

        debug!(
            tick_id = %report.tick_id,
            evaluated = report.evaluated(),
            finalized = report.count(OutcomeKind::Finalized),
            waiting = report.count(OutcomeKind::Wait),
            "Tick evaluated"
        );
        report
    }

    /// Observe and classify one transaction, escalating fees if it is
    /// plainly still pending.
    async fn evaluate(&self, tx: &PendingTransaction, now: Timestamp) -> Outcome {
        let receipt = self.find_receipt(tx).await;

        let balance = if self.classifier.needs_balance(tx, now, &receipt) {
            Some(self.bounded(self.chain.get_balance(&tx.sender)).await)
        } else {
            None
        };

        let observation = Observation {
            now,
            receipt,
            balance,
        };
        let outcome = self.classifier.classify(tx, &observation);

        let plainly_pending = matches!(observation.receipt, Ok(None))
            && matches!(observation.balance, Some(Ok(_)));

        match outcome {
            Outcome::Wait(reason) if plainly_pending && self.resubmission.is_some() => {
                self.escalate(tx, now, reason).await
            }
            outcome => outcome,
        }
    }

    /// Receipt for any broadcast of `tx`, newest first. A failed lookup is
    /// reported only if no broadcast turned up a receipt.
    async fn find_receipt(
        &self,
        tx: &PendingTransaction,
    ) -> Result<Option<TransactionReceipt>, ChainError> {
        let mut failure = None;
        for hash in tx.broadcast_hashes() {
            match self.bounded(self.chain.get_receipt(hash)).await {
                Ok(Some(receipt)) => return Ok(Some(receipt)),
                Ok(None) => {}
                Err(e) => {
                    debug!(tx_hash = %short_hex(hash), error = %e, "Receipt lookup failed");
                    failure.get_or_insert(e);
                }
            }
        }
        failure.map_or(Ok(None), Err)
    }

    async fn escalate(&self, tx: &PendingTransaction, now: Timestamp, reason: String) -> Outcome {
        let Some(resubmission) = &self.resubmission else {
            return Outcome::Wait(reason);
        };
        if tx.fee_capped {
            return Outcome::Wait(reason);
        }

        let decision = match self.bounded(resubmission.strategy.next_fees(tx, now)).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(tx_hash = %short_hex(&tx.hash), error = %e, "Resubmit strategy failed");
                return Outcome::Wait(format!("Strategy unavailable: {e}"));
            }
        };

        let fees = match decision {
            StrategyDecision::Hold(reason) => return Outcome::Wait(reason),
            StrategyDecision::FeeCapReached => {
                self.tracker.write().mark_fee_capped(&tx.hash);
                info!(tx_hash = %short_hex(&tx.hash), "Fee cap reached");
                return Outcome::Wait("Fee cap reached".into());
            }
            StrategyDecision::Resubmit(fees) => fees,
        };

        let (fees, clamped) = match tx.policy.fee_cap {
            Some(cap) if fees.exceeds(cap) => (fees.capped_at(cap), true),
            _ => (fees, false),
        };

        if clamped && fees == tx.fees {
            self.tracker.write().mark_fee_capped(&tx.hash);
            info!(tx_hash = %short_hex(&tx.hash), "Fee cap reached at current fees");
            return Outcome::Wait("Fee cap reached".into());
        }

        match self
            .bounded(resubmission.broadcaster.broadcast(tx, &fees))
            .await
        {
            Ok(new_hash) => self.record_resubmission(tx, new_hash, fees, clamped),
            Err(BroadcastError::InsufficientFunds(message)) => {
                Outcome::Faulted(TransactionFaulted::new(
                    tx.clone(),
                    Fault::InsufficientFunds,
                    format!("Rebroadcast rejected: {message}"),
                ))
            }
            Err(e) => {
                warn!(tx_hash = %short_hex(&tx.hash), error = %e, "Rebroadcast failed");
                Outcome::Wait(format!("Rebroadcast failed: {e}"))
            }
        }
    }

    fn record_resubmission(
        &self,
        tx: &PendingTransaction,
        new_hash: Hash,
        fees: FeeParams,
        clamped: bool,
    ) -> Outcome {
        let mut tracker = self.tracker.write();

        let attempts = match tracker.record_resubmission(&tx.hash, new_hash, fees) {
            Ok(Some(updated)) => updated.attempts,
            Ok(None) => return Outcome::Wait("No longer tracked".into()),
            Err(e) => {
                warn!(tx_hash = %short_hex(&tx.hash), error = %e, "Rebroadcast not recorded");
                return Outcome::Wait(format!("Rebroadcast not recorded: {e}"));
            }
        };
        if clamped {
            tracker.mark_fee_capped(&new_hash);
        }
        drop(tracker);

        self.stats.lock().resubmissions += 1;
        metrics::record_resubmission();
        info!(
            tx_hash = %short_hex(&tx.hash),
            new_hash = %short_hex(&new_hash),
            attempts,
            fee_capped = clamped,
            "Transaction rebroadcast"
        );
        Outcome::Continue
    }

    async fn apply(
        &self,
        tx: &PendingTransaction,
        outcome: Outcome,
        now: Timestamp,
        report: &mut TickReport,
    ) {
        match outcome {
            Outcome::Finalized(receipt) => {
                let Some(record) = self.take(&tx.hash, now) else {
                    return;
                };
                self.stats.lock().finalized += 1;
                info!(
                    tx_hash = %short_hex(&record.hash),
                    block = receipt.block_number,
                    attempts = record.attempts,
                    "Transaction finalized"
                );
                self.finish(OutcomeEvent::Finalized { tx: record, receipt }, report)
                    .await;
            }
            Outcome::Faulted(faulted) => {
                let Some(record) = self.take(&tx.hash, now) else {
                    return;
                };
                *self.stats.lock().faulted.entry(faulted.fault).or_default() += 1;
                metrics::record_fault(faulted.fault.as_str());

                if faulted.fault == Fault::Error {
                    error!(
                        tx_hash = %short_hex(&record.hash),
                        fault = %faulted.fault,
                        message = %faulted.message,
                        "Transaction faulted unexpectedly"
                    );
                } else {
                    warn!(
                        tx_hash = %short_hex(&record.hash),
                        fault = %faulted.fault,
                        message = %faulted.message,
                        "Transaction faulted"
                    );
                }

                let event = OutcomeEvent::Faulted(TransactionFaulted {
                    tx: record,
                    ..faulted
                });
                self.finish(event, report).await;
            }
            Outcome::Wait(reason) => {
                self.tracker.write().record_evaluation(&tx.hash, now);
                debug!(tx_hash = %short_hex(&tx.hash), %reason, "Waiting");
            }
            Outcome::Continue => {
                let mut tracker = self.tracker.write();
                if let Some(hash) = tracker.by_nonce(&tx.sender, tx.nonce).copied() {
                    tracker.record_evaluation(&hash, now);
                }
            }
        }
    }

    /// Remove a record after bumping its evaluation count. `None` if it was
    /// abandoned since the snapshot was taken.
    fn take(&self, hash: &Hash, now: Timestamp) -> Option<PendingTransaction> {
        let mut tracker = self.tracker.write();
        tracker.record_evaluation(hash, now);
        tracker.remove(hash)
    }

    async fn finish(&self, event: OutcomeEvent, report: &mut TickReport) {
        if let Some(archive) = &self.archive {
            if let Err(e) = self.bounded(archive.archive(&event)).await {
                warn!(tx_hash = %short_hex(&event.hash()), error = %e, "Archive failed");
                report.archive_failures.push((event.hash(), e.to_string()));
            }
        }
        // No subscribers is fine.
        let _ = self.outcomes.send(event);
    }

    /// Bound a collaborator call by the configured RPC timeout.
    async fn bounded<F, O, E>(&self, call: F) -> Result<O, E>
    where
        F: Future<Output = Result<O, E>>,
        E: From<ChainError>,
    {
        let after = self.config.rpc_timeout;
        tokio::time::timeout(after, call)
            .await
            .unwrap_or_else(|_| Err(ChainError::Timeout { after }.into()))
    }
}

/// Tick-level failures raised by a completed evaluation pass.
fn tick_result(report: &TickReport) -> Result<(), MonitorError> {
    let mut errors = Vec::new();

    let unexpected: Vec<_> = report.unexpected_faults().map(|h| short_hex(h)).collect();
    if !unexpected.is_empty() {
        errors.push(MonitorError::UnexpectedFaults {
            count: unexpected.len(),
            summary: unexpected.join(", "),
        });
    }

    if !report.archive_failures.is_empty() {
        let summary = report
            .archive_failures
            .iter()
            .map(|(h, e)| format!("{}: {e}", short_hex(h)))
            .collect::<Vec<_>>()
            .join(", ");
        errors.push(MonitorError::Archive {
            count: report.archive_failures.len(),
            summary,
        });
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(MonitorError::Multiple(errors)),
    }
}

#[async_trait]
impl<C, T> PeriodicTask for TransactionMonitor<C, T>
where
    C: ChainStateReader + 'static,
    T: TimeSource + 'static,
{
    type Error = MonitorError;

    fn name(&self) -> &str {
        TASK_NAME
    }

    async fn run(&self) -> Result<(), MonitorError> {
        let report = self.evaluate_all().await;
        let result = tick_result(&report);
        *self.last_report.lock() = Some(report);

        if result.is_ok() {
            self.consecutive_failures.store(0, Ordering::SeqCst);
        }
        result
    }

    fn handle_errors(&self, error: TickError<MonitorError>) -> ErrorAction {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_tick_failure(error.kind());

        let level = match &error {
            TickError::Failed(_) => AlertLevel::Error,
            TickError::Panicked(_) => AlertLevel::Critical,
            TickError::Cancelled => AlertLevel::Warning,
        };
        let tick_id = match &error {
            TickError::Failed(_) => self.last_report.lock().as_ref().map(|r| r.tick_id),
            _ => None,
        };

        let context = AlertContext {
            task: TASK_NAME.to_string(),
            tick_id,
            consecutive_failures: failures,
            fields: vec![("kind".to_string(), error.kind().to_string())],
        };
        self.alerts.alert(level, &error.to_string(), &context);

        match self.config.max_consecutive_tick_failures {
            Some(max) if failures >= max => {
                self.alerts.alert(
                    AlertLevel::Critical,
                    &format!("Halting after {failures} consecutive failed ticks"),
                    &context,
                );
                ErrorAction::Halt
            }
            _ => ErrorAction::Continue,
        }
    }
}

impl<C, T> TransactionLifecycleApi for TransactionMonitor<C, T>
where
    C: ChainStateReader,
    T: TimeSource,
{
    fn track(&self, tx: PendingTransaction) -> LifecycleResult<()> {
        let hash = tx.hash;
        let nonce = tx.nonce;
        let tracked = {
            let mut tracker = self.tracker.write();
            tracker.track(tx)?;
            tracker.len()
        };

        metrics::set_tracked(tracked);
        info!(tx_hash = %short_hex(&hash), nonce, tracked, "Tracking transaction");
        Ok(())
    }

    fn abandon(&self, hash: &Hash) -> Option<PendingTransaction> {
        let record = self.tracker.write().abandon(hash)?;
        self.stats.lock().abandoned += 1;
        info!(tx_hash = %short_hex(hash), "Transaction abandoned");
        Some(record)
    }

    fn snapshot(&self) -> Vec<PendingTransaction> {
        self.tracker.read().snapshot()
    }

    fn is_tracked(&self, hash: &Hash) -> bool {
        self.tracker.read().contains(hash)
    }

    fn status(&self) -> MonitorStatus {
        let mut status = self.stats.lock().clone();
        status.tracked = self.tracker.read().len();
        status
    }

    fn subscribe(&self) -> broadcast::Receiver<OutcomeEvent> {
        self.outcomes.subscribe()
    }
}

/// A [`TransactionMonitor`] wired to its own [`PeriodicSupervisor`].
pub struct TransactionSupervisor<C, T>
where
    C: ChainStateReader + 'static,
    T: TimeSource + 'static,
{
    monitor: Arc<TransactionMonitor<C, T>>,
    supervisor: PeriodicSupervisor<TransactionMonitor<C, T>>,
}

impl<C, T> TransactionSupervisor<C, T>
where
    C: ChainStateReader + 'static,
    T: TimeSource + 'static,
{
    /// Schedule `monitor` at its configured tick interval.
    pub fn new(monitor: TransactionMonitor<C, T>) -> LifecycleResult<Self> {
        let config = monitor.config().supervisor_config();
        let monitor = Arc::new(monitor);
        let supervisor = PeriodicSupervisor::new(Arc::clone(&monitor), config)?;
        Ok(Self {
            monitor,
            supervisor,
        })
    }

    /// Start with the configured `run_immediately` flag.
    ///
    /// `None` if already running.
    pub fn start(&self) -> Option<SupervisorHandle> {
        self.supervisor.start_configured()
    }

    /// Start with an explicit `run_immediately` flag.
    pub fn start_with(&self, run_immediately: bool) -> Option<SupervisorHandle> {
        self.supervisor.start(run_immediately)
    }

    pub fn stop(&self) {
        self.supervisor.stop();
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// Ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.supervisor.ticks()
    }

    pub fn monitor(&self) -> &Arc<TransactionMonitor<C, T>> {
        &self.monitor
    }
}

impl<C, T> TransactionLifecycleApi for TransactionSupervisor<C, T>
where
    C: ChainStateReader + 'static,
    T: TimeSource + 'static,
{
    fn track(&self, tx: PendingTransaction) -> LifecycleResult<()> {
        self.monitor.track(tx)
    }

    fn abandon(&self, hash: &Hash) -> Option<PendingTransaction> {
        self.monitor.abandon(hash)
    }

    fn snapshot(&self) -> Vec<PendingTransaction> {
        self.monitor.snapshot()
    }

    fn is_tracked(&self, hash: &Hash) -> bool {
        self.monitor.is_tracked(hash)
    }

    fn status(&self) -> MonitorStatus {
        self.monitor.status()
    }

    fn subscribe(&self) -> broadcast::Receiver<OutcomeEvent> {
        self.monitor.subscribe()
    }
}
