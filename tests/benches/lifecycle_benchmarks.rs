//! # Transaction Lifecycle Benchmarks
//!
//! | Path | Target |
//! |------|--------|
//! | `FaultClassifier::classify` | < 1μs per transaction |
//! | `TransactionTracker::track` + `snapshot` (10k) | < 10ms |
//! | `evaluate_all` over 1k in-memory transactions | < 10ms per tick |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_19_tx_lifecycle::adapters::{InMemoryChainState, ManualTimeSource};
use qc_19_tx_lifecycle::{
    FaultClassifier, MonitorConfig, Observation, PendingTransaction, TransactionLifecycleApi,
    TransactionMonitor, TransactionTracker, TxPolicy,
};
use shared_types::{FeeParams, Hash, ReceiptStatus, TransactionReceipt, U256};
use std::sync::Arc;
use std::time::Duration;

fn hash_of(i: u64) -> Hash {
    let mut hash = [0u8; 32];
    hash[..8].copy_from_slice(&i.to_be_bytes());
    hash
}

fn pending(i: u64) -> PendingTransaction {
    PendingTransaction::new(
        hash_of(i),
        [0x5E; 20],
        i,
        U256::from(1_000u64),
        FeeParams::new(U256::from(30_000_000_000u64), U256::from(1_000_000_000u64), 21_000),
        0,
        TxPolicy::with_max_wait(Duration::from_secs(60)),
    )
}

fn bench_classifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-19-classifier");
    let classifier = FaultClassifier::default();
    let tx = pending(1);

    let waiting = Observation::pending(30_000).with_balance(U256::MAX);
    let reverted = Observation::pending(90_000).with_receipt(TransactionReceipt {
        tx_hash: hash_of(1),
        block_number: 10,
        block_hash: [0; 32],
        gas_used: 21_000,
        effective_gas_price: U256::one(),
        status: ReceiptStatus::Failed,
    });
    let timed_out = Observation::pending(90_000);

    for (name, observation) in [
        ("wait", &waiting),
        ("revert", &reverted),
        ("timeout", &timed_out),
    ] {
        group.bench_with_input(BenchmarkId::new("classify", name), observation, |b, obs| {
            b.iter(|| classifier.classify(black_box(&tx), black_box(obs)))
        });
    }
    group.finish();
}

fn bench_tracker(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-19-tracker");

    for count in [1_000u64, 10_000] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::new("track_snapshot", count), &count, |b, &n| {
            b.iter(|| {
                let mut tracker = TransactionTracker::new();
                for i in 0..n {
                    tracker.track(pending(i)).expect("unique nonce");
                }
                black_box(tracker.snapshot())
            })
        });
    }
    group.finish();
}

fn bench_evaluate_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-19-evaluate-all");
    group.measurement_time(Duration::from_secs(10));
    let runtime = tokio::runtime::Runtime::new().expect("runtime");

    for count in [100u64, 1_000] {
        let chain = Arc::new(InMemoryChainState::new());
        chain.set_balance([0x5E; 20], U256::MAX);
        let monitor = TransactionMonitor::new(
            chain,
            Arc::new(ManualTimeSource::new(1_000)),
            MonitorConfig::default(),
        )
        .expect("default config");
        for i in 0..count {
            monitor.track(pending(i)).expect("unique nonce");
        }

        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::new("all_waiting", count), &monitor, |b, m| {
            b.iter(|| runtime.block_on(m.evaluate_all()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classifier, bench_tracker, bench_evaluate_all);
criterion_main!(benches);
