//! Shared builders for lifecycle scenarios.

use qc_19_tx_lifecycle::adapters::{InMemoryChainState, RecordingAlertSink, TokioTimeSource};
use qc_19_tx_lifecycle::{MonitorConfig, TransactionMonitor, TransactionSupervisor, TxPolicy};
use shared_types::{Address, FeeParams, Hash, ReceiptStatus, TransactionReceipt, U256};
use std::sync::Arc;
use std::time::Duration;

/// Funded sender used by most scenarios.
pub const SENDER: Address = [0x5E; 20];

/// Sender with no balance.
pub const POOR_SENDER: Address = [0x0F; 20];

pub type Monitor = TransactionMonitor<InMemoryChainState, TokioTimeSource>;
pub type Supervisor = TransactionSupervisor<InMemoryChainState, TokioTimeSource>;

/// Fees with the given `max_fee_per_gas` and a 21k gas limit.
pub fn fees(max_fee: u64) -> FeeParams {
    FeeParams::new(U256::from(max_fee), U256::one(), 21_000)
}

pub fn receipt(hash: Hash, status: ReceiptStatus) -> TransactionReceipt {
    TransactionReceipt {
        tx_hash: hash,
        block_number: 1_024,
        block_hash: [0xB1; 32],
        gas_used: 21_000,
        effective_gas_price: U256::from(7u64),
        status,
    }
}

/// Config ticking every `tick_secs`, timing out after `max_wait_secs`.
pub fn config(tick_secs: u64, max_wait_secs: u64) -> MonitorConfig {
    MonitorConfig {
        tick_interval: Duration::from_secs(tick_secs),
        default_policy: TxPolicy::with_max_wait(Duration::from_secs(max_wait_secs)),
        ..MonitorConfig::for_testing()
    }
}

/// A supervisor over in-memory chain state, on the tokio clock.
///
/// Must be built inside a runtime so the clock follows paused time.
pub struct Env {
    pub chain: Arc<InMemoryChainState>,
    pub alerts: Arc<RecordingAlertSink>,
    pub supervisor: Supervisor,
}

impl Env {
    pub fn new(config: MonitorConfig) -> Self {
        Self::with(config, |monitor| monitor)
    }

    /// Build with extra monitor wiring (resubmission, archive).
    pub fn with(config: MonitorConfig, wire: impl FnOnce(Monitor) -> Monitor) -> Self {
        let chain = Arc::new(InMemoryChainState::new());
        let alerts = Arc::new(RecordingAlertSink::new());
        chain.set_balance(SENDER, U256::MAX);

        let monitor = TransactionMonitor::new(
            chain.clone(),
            Arc::new(TokioTimeSource::starting_at(0)),
            config,
        )
        .expect("valid config")
        .with_alert_sink(alerts.clone());

        let supervisor =
            TransactionSupervisor::new(wire(monitor)).expect("non-zero tick interval");

        Self {
            chain,
            alerts,
            supervisor,
        }
    }

    pub fn monitor(&self) -> &Monitor {
        self.supervisor.monitor()
    }
}
