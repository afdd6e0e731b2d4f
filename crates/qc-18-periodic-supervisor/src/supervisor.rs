//! Periodic Supervisor - scheduling loop and error boundary

use crate::config::SupervisorConfig;
use crate::error::{SupervisorError, SupervisorResult, TickError};
use crate::task::{ErrorAction, PeriodicTask};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// State of the loop started by the most recent `start()`.
struct ActiveRun {
    stop_tx: watch::Sender<bool>,
    running: Arc<AtomicBool>,
}

/// Drives a [`PeriodicTask`] on a fixed interval.
///
/// INVARIANT: at most one `run()` is in flight per supervisor, including
/// across a `stop()` immediately followed by `start()`.
pub struct PeriodicSupervisor<T: PeriodicTask> {
    task: Arc<T>,
    config: SupervisorConfig,
    active: Mutex<Option<ActiveRun>>,
    /// Serializes executions between an old loop finishing its last tick and
    /// a freshly started one.
    execution: Arc<tokio::sync::Mutex<()>>,
    ticks: Arc<AtomicU64>,
}

impl<T: PeriodicTask> PeriodicSupervisor<T> {
    /// Create a stopped supervisor.
    ///
    /// # Errors
    /// `InvalidInterval` if the configured interval is zero.
    pub fn new(task: Arc<T>, config: SupervisorConfig) -> SupervisorResult<Self> {
        if config.interval.is_zero() {
            return Err(SupervisorError::InvalidInterval {
                interval: config.interval,
            });
        }

        Ok(Self {
            task,
            config,
            active: Mutex::new(None),
            execution: Arc::new(tokio::sync::Mutex::new(())),
            ticks: Arc::new(AtomicU64::new(0)),
        })
    }

    /// The supervised task.
    pub fn task(&self) -> &Arc<T> {
        &self.task
    }

    /// Configured tick interval.
    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// Number of ticks executed since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// True iff the loop is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|run| run.running.load(Ordering::SeqCst))
    }

    /// Start with the configured `run_immediately` flag.
    pub fn start_configured(&self) -> Option<SupervisorHandle> {
        self.start(self.config.run_immediately)
    }

    /// Begin scheduling.
    ///
    /// Returns `None` without side effects if the loop is already running.
    /// The returned handle resolves when the loop stops, either through
    /// `stop()` or a `Halt` decision from the error handler.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, run_immediately: bool) -> Option<SupervisorHandle> {
        let mut active = self.active.lock();

        if active
            .as_ref()
            .is_some_and(|run| run.running.load(Ordering::SeqCst))
        {
            debug!(task = self.task.name(), "Supervisor already running, start ignored");
            return None;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let running = Arc::new(AtomicBool::new(true));

        let supervisor_loop = SupervisorLoop {
            task: Arc::clone(&self.task),
            interval: self.config.interval,
            running: Arc::clone(&running),
            execution: Arc::clone(&self.execution),
            ticks: Arc::clone(&self.ticks),
        };

        // Replacing a previous run drops its sender, which also ends that loop.
        *active = Some(ActiveRun { stop_tx, running });

        info!(
            task = self.task.name(),
            interval_ms = self.config.interval.as_millis() as u64,
            run_immediately,
            "Supervisor started"
        );

        let join = tokio::spawn(supervisor_loop.run(run_immediately, stop_rx));
        Some(SupervisorHandle { join })
    }

    /// Halt scheduling after the in-flight tick (if any) completes.
    ///
    /// No-op if already stopped.
    pub fn stop(&self) {
        let active = self.active.lock();

        let Some(run) = active.as_ref() else {
            return;
        };

        if !run.running.swap(false, Ordering::SeqCst) {
            return;
        }

        // Receiver may already be gone if the loop halted concurrently.
        let _ = run.stop_tx.send(true);
        info!(task = self.task.name(), "Supervisor stop requested");
    }
}

impl<T: PeriodicTask> Drop for PeriodicSupervisor<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Handle to a started supervisor loop.
#[derive(Debug)]
pub struct SupervisorHandle {
    join: JoinHandle<SupervisorResult<()>>,
}

impl SupervisorHandle {
    /// Wait for the loop to end.
    ///
    /// # Errors
    /// - `Halted`: the error handler returned [`ErrorAction::Halt`]
    /// - `Join`: the loop task itself panicked or was aborted
    pub async fn join(self) -> SupervisorResult<()> {
        match self.join.await {
            Ok(result) => result,
            Err(e) => Err(SupervisorError::Join {
                reason: e.to_string(),
            }),
        }
    }

    /// True once the loop has ended.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Everything the spawned loop owns.
struct SupervisorLoop<T: PeriodicTask> {
    task: Arc<T>,
    interval: Duration,
    running: Arc<AtomicBool>,
    execution: Arc<tokio::sync::Mutex<()>>,
    ticks: Arc<AtomicU64>,
}

impl<T: PeriodicTask> SupervisorLoop<T> {
    async fn run(
        self,
        run_immediately: bool,
        mut stop_rx: watch::Receiver<bool>,
    ) -> SupervisorResult<()> {
        let first_tick = if run_immediately {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut interval = tokio::time::interval_at(first_tick, self.interval);
        // Overrun defers the next tick rather than bursting to catch up.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;

            if let Err(tick_error) = self.execute_tick(tick).await {
                warn!(
                    task = self.task.name(),
                    tick,
                    kind = tick_error.kind(),
                    error = %tick_error,
                    "Tick failed, routing to error handler"
                );

                if self.task.handle_errors(tick_error) == ErrorAction::Halt {
                    self.running.store(false, Ordering::SeqCst);
                    error!(task = self.task.name(), tick, "Supervisor halted by error handler");
                    return Err(SupervisorError::Halted {
                        task: self.task.name().to_string(),
                        tick,
                    });
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(task = self.task.name(), "Supervisor stopped");
        Ok(())
    }

    /// Runs one tick in its own task so a panic cannot take the loop down.
    async fn execute_tick(&self, tick: u64) -> Result<(), TickError<T::Error>> {
        let _guard = self.execution.lock().await;
        debug!(task = self.task.name(), tick, "Tick started");

        let task = Arc::clone(&self.task);
        match tokio::spawn(async move { task.run().await }).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TickError::Failed(e)),
            Err(join_error) if join_error.is_panic() => {
                Err(TickError::Panicked(panic_message(join_error.into_panic())))
            }
            Err(_) => Err(TickError::Cancelled),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
