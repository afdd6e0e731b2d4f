//! # Transaction Lifecycle Metrics
//!
//! Prometheus metrics for the transaction monitor.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-19-tx-lifecycle = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `txm_ticks_total` - Counter of evaluation passes
//! - `txm_tick_failures_total` - Counter of ticks routed to the error boundary (by kind)
//! - `txm_outcomes_total` - Counter of evaluation outcomes (by outcome)
//! - `txm_faults_total` - Counter of faults raised (by fault)
//! - `txm_resubmissions_total` - Counter of rebroadcasts
//! - `txm_tracked_transactions` - Gauge of currently tracked transactions

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total evaluation passes
    pub static ref TICKS: IntCounter = register_int_counter!(
        "txm_ticks_total",
        "Total number of evaluation passes"
    )
    .expect("Failed to create TICKS metric");

    /// Ticks routed to the error boundary, labeled by kind
    pub static ref TICK_FAILURES: IntCounterVec = register_int_counter_vec!(
        "txm_tick_failures_total",
        "Total number of failed ticks",
        &["kind"]
    )
    .expect("Failed to create TICK_FAILURES metric");

    /// Evaluation outcomes, labeled by outcome
    pub static ref OUTCOMES: IntCounterVec = register_int_counter_vec!(
        "txm_outcomes_total",
        "Total number of evaluation outcomes",
        &["outcome"]
    )
    .expect("Failed to create OUTCOMES metric");

    /// Faults raised, labeled by fault kind
    pub static ref FAULTS: IntCounterVec = register_int_counter_vec!(
        "txm_faults_total",
        "Total number of faults raised",
        &["fault"]
    )
    .expect("Failed to create FAULTS metric");

    /// Rebroadcasts performed
    pub static ref RESUBMISSIONS: IntCounter = register_int_counter!(
        "txm_resubmissions_total",
        "Total number of rebroadcasts"
    )
    .expect("Failed to create RESUBMISSIONS metric");

    /// Currently tracked transactions
    pub static ref TRACKED: IntGauge = register_int_gauge!(
        "txm_tracked_transactions",
        "Number of transactions currently tracked"
    )
    .expect("Failed to create TRACKED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_tick() {
    TICKS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_tick_failure(kind: &str) {
    TICK_FAILURES.with_label_values(&[kind]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_outcome(outcome: &str) {
    OUTCOMES.with_label_values(&[outcome]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_fault(fault: &str) {
    FAULTS.with_label_values(&[fault]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_resubmission() {
    RESUBMISSIONS.inc();
}

#[cfg(feature = "metrics")]
pub fn set_tracked(count: usize) {
    TRACKED.set(count as i64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_tick() {}

#[cfg(not(feature = "metrics"))]
pub fn record_tick_failure(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_outcome(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_fault(_fault: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_resubmission() {}

#[cfg(not(feature = "metrics"))]
pub fn set_tracked(_count: usize) {}
