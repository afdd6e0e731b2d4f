//! The unit of work driven by the supervisor.

use crate::error::TickError;
use async_trait::async_trait;

/// Decision returned by [`PeriodicTask::handle_errors`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ErrorAction {
    /// Swallow the failure; the next tick runs on schedule.
    #[default]
    Continue,
    /// Stop the loop. The supervisor handle resolves with
    /// [`SupervisorError::Halted`](crate::SupervisorError::Halted).
    Halt,
}

/// Work executed once per supervisor tick.
///
/// Implementations are injected into [`PeriodicSupervisor`](crate::PeriodicSupervisor)
/// rather than subclassed. `run` is only ever invoked from the supervisor's
/// single execution context, so it never overlaps with itself.
#[async_trait]
pub trait PeriodicTask: Send + Sync + 'static {
    /// Error type returned by `run`.
    type Error: std::error::Error + Send + 'static;

    /// Name used in log fields.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Executes one tick.
    ///
    /// Must be safe to invoke repeatedly.
    async fn run(&self) -> Result<(), Self::Error>;

    /// Invoked whenever `run` fails or panics.
    ///
    /// This is the only place a task should raise alerts for tick failures.
    fn handle_errors(&self, error: TickError<Self::Error>) -> ErrorAction;
}
