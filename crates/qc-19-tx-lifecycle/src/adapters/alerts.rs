//! Alert sinks.

use crate::ports::outbound::{AlertContext, AlertLevel, AlertSink};
use parking_lot::Mutex;
use tracing::{error, info, warn};

/// Forwards alerts to `tracing`. `Critical` is logged at error level with
/// `critical = true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn alert(&self, level: AlertLevel, message: &str, context: &AlertContext) {
        let tick_id = context.tick_id.map(|id| id.to_string()).unwrap_or_default();
        let fields = context
            .fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");

        match level {
            AlertLevel::Info => info!(
                task = %context.task,
                tick_id = %tick_id,
                consecutive_failures = context.consecutive_failures,
                %fields,
                "{message}"
            ),
            AlertLevel::Warning => warn!(
                task = %context.task,
                tick_id = %tick_id,
                consecutive_failures = context.consecutive_failures,
                %fields,
                "{message}"
            ),
            AlertLevel::Error => error!(
                task = %context.task,
                tick_id = %tick_id,
                consecutive_failures = context.consecutive_failures,
                %fields,
                "{message}"
            ),
            AlertLevel::Critical => error!(
                critical = true,
                task = %context.task,
                tick_id = %tick_id,
                consecutive_failures = context.consecutive_failures,
                %fields,
                "{message}"
            ),
        }
    }
}

/// One alert captured by [`RecordingAlertSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAlert {
    pub level: AlertLevel,
    pub message: String,
    pub context: AlertContext,
}

/// Keeps every alert for later inspection.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<RecordedAlert>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<RecordedAlert> {
        self.alerts.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.lock().is_empty()
    }

    pub fn count_at(&self, level: AlertLevel) -> usize {
        self.alerts.lock().iter().filter(|a| a.level == level).count()
    }
}

impl AlertSink for RecordingAlertSink {
    fn alert(&self, level: AlertLevel, message: &str, context: &AlertContext) {
        self.alerts.lock().push(RecordedAlert {
            level,
            message: message.to_string(),
            context: context.clone(),
        });
    }
}
