//! # Supervision Scenarios
//!
//! Scheduling and error-boundary behaviour of a monitor under its supervisor.

#[cfg(test)]
mod tests {
    use crate::fixtures::{config, fees, receipt, Env, SENDER};
    use async_trait::async_trait;
    use qc_18_periodic_supervisor::SupervisorError;
    use qc_19_tx_lifecycle::adapters::{RecordingAlertSink, TokioTimeSource};
    use qc_19_tx_lifecycle::{
        AlertLevel, ChainError, ChainStateReader, Fault, MonitorConfig, TransactionLifecycleApi,
        TransactionMonitor, TransactionSupervisor,
    };
    use shared_types::{Address, Hash, ReceiptStatus, TransactionReceipt, U256};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    /// Chain reader whose every receipt lookup panics.
    struct PanickingChain;

    #[async_trait]
    impl ChainStateReader for PanickingChain {
        async fn get_receipt(
            &self,
            _hash: &Hash,
        ) -> Result<Option<TransactionReceipt>, ChainError> {
            panic!("receipt decoder exploded")
        }

        async fn get_balance(&self, _address: &Address) -> Result<U256, ChainError> {
            Ok(U256::MAX)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent_and_stop_is_noop_when_stopped() {
        let env = Env::new(config(10, 60));

        let handle = env.supervisor.start().unwrap();
        assert!(env.supervisor.start().is_none());
        assert!(env.supervisor.is_running());

        sleep(Duration::from_secs(25)).await;
        assert_eq!(env.supervisor.ticks(), 3);
        assert_eq!(env.supervisor.status().ticks, 3);

        env.supervisor.stop();
        env.supervisor.stop();
        handle.join().await.unwrap();
        assert!(!env.supervisor.is_running());

        sleep(Duration::from_secs(30)).await;
        assert_eq!(env.supervisor.ticks(), 3);

        let handle = env.supervisor.start_with(false).unwrap();
        sleep(Duration::from_secs(5)).await;
        assert_eq!(env.supervisor.ticks(), 3);
        sleep(Duration::from_secs(10)).await;
        assert_eq!(env.supervisor.ticks(), 4);

        env.supervisor.stop();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_fault_is_alerted_and_loop_continues() {
        let env = Env::new(config(10, 60));
        let mut outcomes = env.supervisor.subscribe();

        let broken = env
            .monitor()
            .pending([0xE1; 32], SENDER, 0, U256::zero(), fees(10));
        let healthy = env
            .monitor()
            .pending([0xE2; 32], SENDER, 1, U256::zero(), fees(10));
        env.supervisor.track(broken).unwrap();
        env.supervisor.track(healthy).unwrap();
        env.chain
            .fail_receipt([0xE1; 32], ChainError::Malformed("status 7".into()));

        let handle = env.supervisor.start().unwrap();

        let first = timeout(Duration::from_secs(1), outcomes.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.fault(), Some(Fault::Error));

        sleep(Duration::from_secs(5)).await;
        assert!(env.supervisor.is_running());
        assert_eq!(env.alerts.count_at(AlertLevel::Error), 1);
        let alert = &env.alerts.alerts()[0];
        assert_eq!(alert.context.field("kind"), Some("failed"));
        assert_eq!(
            alert.context.tick_id,
            env.monitor().last_report().map(|r| r.tick_id)
        );

        env.chain
            .set_receipt(receipt([0xE2; 32], ReceiptStatus::Success));
        let second = timeout(Duration::from_secs(15), outcomes.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.hash(), [0xE2; 32]);
        assert_eq!(second.fault(), None);
        assert_eq!(env.alerts.len(), 1);

        env.supervisor.stop();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_tick_is_contained() {
        let alerts = Arc::new(RecordingAlertSink::new());
        let monitor = TransactionMonitor::new(
            Arc::new(PanickingChain),
            Arc::new(TokioTimeSource::starting_at(0)),
            config(10, 60),
        )
        .unwrap()
        .with_alert_sink(alerts.clone());
        let supervisor = TransactionSupervisor::new(monitor).unwrap();

        let tx = supervisor
            .monitor()
            .pending([0xF1; 32], SENDER, 0, U256::zero(), fees(10));
        supervisor.track(tx).unwrap();
        let handle = supervisor.start().unwrap();

        sleep(Duration::from_secs(25)).await;
        assert!(supervisor.is_running());
        assert_eq!(supervisor.ticks(), 3);
        assert_eq!(alerts.count_at(AlertLevel::Critical), 3);
        assert!(supervisor.is_tracked(&[0xF1; 32]));

        supervisor.stop();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_failures_halt_when_configured() {
        let alerts = Arc::new(RecordingAlertSink::new());
        let config = MonitorConfig {
            max_consecutive_tick_failures: Some(2),
            ..config(10, 60)
        };
        let monitor = TransactionMonitor::new(
            Arc::new(PanickingChain),
            Arc::new(TokioTimeSource::starting_at(0)),
            config,
        )
        .unwrap()
        .with_alert_sink(alerts.clone());
        let supervisor = TransactionSupervisor::new(monitor).unwrap();

        let tx = supervisor
            .monitor()
            .pending([0xF2; 32], SENDER, 0, U256::zero(), fees(10));
        supervisor.track(tx).unwrap();

        let handle = supervisor.start().unwrap();
        let result = timeout(Duration::from_secs(60), handle.join())
            .await
            .expect("loop halts on its own");

        assert!(matches!(
            result,
            Err(SupervisorError::Halted { tick: 2, .. })
        ));
        assert!(!supervisor.is_running());
        assert!(alerts
            .alerts()
            .iter()
            .any(|a| a.message.starts_with("Halting after 2")));

        // A halted supervisor can be started again.
        let handle = supervisor.start().unwrap();
        supervisor.stop();
        let _ = handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_supervisors_own_disjoint_sets() {
        let left = Env::new(config(10, 60));
        let right = Env::new(config(7, 60));

        let a = left
            .monitor()
            .pending([0xD1; 32], SENDER, 0, U256::zero(), fees(10));
        let b = right
            .monitor()
            .pending([0xD2; 32], SENDER, 0, U256::zero(), fees(10));
        left.supervisor.track(a).unwrap();
        right.supervisor.track(b).unwrap();
        right
            .chain
            .set_receipt(receipt([0xD2; 32], ReceiptStatus::Success));

        let _l = left.supervisor.start().unwrap();
        let _r = right.supervisor.start().unwrap();
        sleep(Duration::from_secs(1)).await;

        assert!(left.supervisor.is_tracked(&[0xD1; 32]));
        assert!(!right.supervisor.is_tracked(&[0xD2; 32]));
        assert_eq!(right.supervisor.status().finalized, 1);
        assert_eq!(left.supervisor.status().finalized, 0);
    }
}
