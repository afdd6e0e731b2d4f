//! Error types for the periodic supervisor

use std::time::Duration;
use thiserror::Error;

/// Supervisor lifecycle errors
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Interval must be non-zero
    #[error("Invalid tick interval: {interval:?}")]
    InvalidInterval { interval: Duration },

    /// The error handler decided a tick failure was fatal
    #[error("Supervisor for '{task}' halted by error handler after tick {tick}")]
    Halted { task: String, tick: u64 },

    /// The loop task itself could not be joined
    #[error("Supervisor loop failed to join: {reason}")]
    Join { reason: String },
}

/// Result type for supervisor operations
pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// A failure escaping one execution of `run()`.
///
/// Handed to [`PeriodicTask::handle_errors`](crate::PeriodicTask::handle_errors).
#[derive(Debug, Error)]
pub enum TickError<E>
where
    E: std::error::Error + 'static,
{
    /// `run()` returned an error
    #[error("Tick failed: {0}")]
    Failed(#[source] E),

    /// `run()` panicked
    #[error("Tick panicked: {0}")]
    Panicked(String),

    /// The tick task was cancelled by the runtime
    #[error("Tick cancelled before completion")]
    Cancelled,
}

impl<E> TickError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the task error if the tick failed with one.
    pub fn task_error(&self) -> Option<&E> {
        match self {
            TickError::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Short label for log fields and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TickError::Failed(_) => "failed",
            TickError::Panicked(_) => "panicked",
            TickError::Cancelled => "cancelled",
        }
    }
}
