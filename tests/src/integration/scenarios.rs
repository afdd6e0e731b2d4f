//! # Outcome Scenarios
//!
//! Transactions driven to their terminal outcomes by a running supervisor.

#[cfg(test)]
mod tests {
    use crate::fixtures::{config, fees, receipt, Env, POOR_SENDER, SENDER};
    use qc_19_tx_lifecycle::adapters::{InMemoryArchive, InMemoryBroadcaster, ScriptedStrategy};
    use qc_19_tx_lifecycle::{
        Fault, OutcomeEvent, OutcomeKind, StrategyDecision, TransactionLifecycleApi,
    };
    use shared_types::{Hash, ReceiptStatus, U256};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::broadcast;
    use tokio::time::{sleep, timeout};

    fn drain(rx: &mut broadcast::Receiver<OutcomeEvent>) -> Vec<OutcomeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Submit at t=0 with a 60s wait: pending at t=30s, TIMEOUT once past 60s.
    #[tokio::test(start_paused = true)]
    async fn test_wait_then_timeout() {
        let env = Env::new(config(10, 60));
        let mut outcomes = env.supervisor.subscribe();
        let t1 = env
            .monitor()
            .pending([0x71; 32], SENDER, 0, U256::zero(), fees(10));
        env.supervisor.track(t1).unwrap();
        let handle = env.supervisor.start().unwrap();

        sleep(Duration::from_secs(35)).await;
        assert!(env.supervisor.is_tracked(&[0x71; 32]));
        let report = env.monitor().last_report().unwrap();
        assert_eq!(report.started_at, 30_000);
        assert_eq!(report.outcome_of(&[0x71; 32]), Some(OutcomeKind::Wait));
        assert!(drain(&mut outcomes).is_empty());

        let event = timeout(Duration::from_secs(60), outcomes.recv())
            .await
            .expect("timeout fault within a minute")
            .unwrap();
        assert_eq!(event.fault(), Some(Fault::Timeout));
        assert_eq!(event.hash(), [0x71; 32]);
        assert!(!env.supervisor.is_tracked(&[0x71; 32]));
        assert!(env.supervisor.is_running());

        env.supervisor.stop();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_revert_carries_receipt() {
        let env = Env::new(config(10, 60));
        let mut outcomes = env.supervisor.subscribe();
        let t2 = env
            .monitor()
            .pending([0x72; 32], SENDER, 0, U256::zero(), fees(10));
        env.supervisor.track(t2).unwrap();
        env.chain
            .set_receipt(receipt([0x72; 32], ReceiptStatus::Failed));

        let _handle = env.supervisor.start().unwrap();

        match timeout(Duration::from_secs(1), outcomes.recv()).await {
            Ok(Ok(OutcomeEvent::Faulted(faulted))) => {
                assert_eq!(faulted.fault, Fault::Revert);
                assert_eq!(
                    faulted.receipt,
                    Some(receipt([0x72; 32], ReceiptStatus::Failed))
                );
            }
            other => panic!("expected revert, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exactly_one_terminal_outcome_each() {
        let env = Env::new(config(10, 60));
        let mut outcomes = env.supervisor.subscribe();
        env.chain.set_balance(POOR_SENDER, U256::zero());

        let monitor = env.monitor();
        let finalized = monitor.pending([0xA1; 32], SENDER, 0, U256::zero(), fees(10));
        let reverted = monitor.pending([0xA2; 32], SENDER, 1, U256::zero(), fees(10));
        let unfunded = monitor.pending([0xA3; 32], POOR_SENDER, 0, U256::one(), fees(10));
        let timed_out = monitor.pending([0xA4; 32], SENDER, 2, U256::zero(), fees(10));
        let abandoned = monitor.pending([0xA5; 32], SENDER, 3, U256::zero(), fees(10));
        let late = monitor.pending([0xA6; 32], SENDER, 4, U256::zero(), fees(10));
        for tx in [finalized, reverted, unfunded, timed_out, abandoned, late] {
            env.supervisor.track(tx).unwrap();
        }
        env.chain
            .set_receipt(receipt([0xA1; 32], ReceiptStatus::Success));
        env.chain
            .set_receipt(receipt([0xA2; 32], ReceiptStatus::Failed));

        let handle = env.supervisor.start().unwrap();

        sleep(Duration::from_secs(5)).await;
        assert!(env.supervisor.abandon(&[0xA5; 32]).is_some());

        sleep(Duration::from_secs(20)).await;
        env.chain
            .set_receipt(receipt([0xA6; 32], ReceiptStatus::Success));

        sleep(Duration::from_secs(75)).await;
        env.supervisor.stop();
        handle.join().await.unwrap();

        let events = drain(&mut outcomes);
        let mut per_hash: HashMap<Hash, Vec<Option<Fault>>> = HashMap::new();
        for event in &events {
            per_hash.entry(event.hash()).or_default().push(event.fault());
        }

        assert_eq!(events.len(), 5);
        assert!(per_hash.values().all(|outcomes| outcomes.len() == 1));
        assert_eq!(per_hash[&[0xA1; 32]], vec![None]);
        assert_eq!(per_hash[&[0xA2; 32]], vec![Some(Fault::Revert)]);
        assert_eq!(per_hash[&[0xA3; 32]], vec![Some(Fault::InsufficientFunds)]);
        assert_eq!(per_hash[&[0xA4; 32]], vec![Some(Fault::Timeout)]);
        assert_eq!(per_hash[&[0xA6; 32]], vec![None]);
        assert!(!per_hash.contains_key(&[0xA5; 32]));

        let status = env.supervisor.status();
        assert_eq!(status.tracked, 0);
        assert_eq!(status.finalized, 2);
        assert_eq!(status.total_faulted(), 3);
        assert_eq!(status.abandoned, 1);
    }

    /// Escalate once, get clamped at the cap, then PAUSE instead of TIMEOUT.
    #[tokio::test(start_paused = true)]
    async fn test_fee_escalation_ends_in_pause() {
        let strategy = Arc::new(ScriptedStrategy::new());
        let broadcaster = Arc::new(InMemoryBroadcaster::new());
        strategy.push(StrategyDecision::Resubmit(fees(11)));
        strategy.push(StrategyDecision::Resubmit(fees(20)));

        let env = Env::with(config(10, 60), |monitor| {
            monitor.with_resubmission(strategy.clone(), broadcaster.clone())
        });
        let mut outcomes = env.supervisor.subscribe();

        let mut tx = env
            .monitor()
            .pending([0x73; 32], SENDER, 0, U256::zero(), fees(10));
        tx.policy = tx.policy.fee_cap(U256::from(12u64));
        env.supervisor.track(tx).unwrap();
        let _handle = env.supervisor.start().unwrap();

        let event = timeout(Duration::from_secs(120), outcomes.recv())
            .await
            .expect("terminal outcome")
            .unwrap();

        assert_eq!(event.fault(), Some(Fault::Pause));
        let record = event.tx();
        assert_eq!(record.attempts, 3);
        assert!(record.fee_capped);
        assert_eq!(record.fees.max_fee_per_gas, U256::from(12u64));
        assert_eq!(record.hash, broadcaster.sent()[1].0);
        assert_eq!(strategy.consulted().len(), 2);
        assert_eq!(env.supervisor.status().resubmissions, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_archive_sees_every_terminal_record() {
        let archive = Arc::new(InMemoryArchive::new());
        let env = Env::with(config(10, 60), |monitor| monitor.with_archive(archive.clone()));

        for (id, nonce) in [(0xC1u8, 0u64), (0xC2, 1)] {
            let tx = env
                .monitor()
                .pending([id; 32], SENDER, nonce, U256::zero(), fees(10));
            env.supervisor.track(tx).unwrap();
            env.chain.set_receipt(receipt([id; 32], ReceiptStatus::Success));
        }

        let _handle = env.supervisor.start().unwrap();
        sleep(Duration::from_secs(1)).await;

        let archived: Vec<_> = archive.records().iter().map(|e| e.hash()).collect();
        assert_eq!(archived, vec![[0xC1; 32], [0xC2; 32]]);
        assert!(env.alerts.is_empty());
    }
}
