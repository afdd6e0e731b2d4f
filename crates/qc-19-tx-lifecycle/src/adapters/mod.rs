//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-process implementations of the outbound ports. The in-memory ones are
//! the deterministic doubles used by unit and scenario tests; the tracing
//! sink and system/tokio clocks are fit for production wiring.

mod alerts;
mod archive;
mod broadcaster;
mod chain_state;
mod clock;

pub use alerts::{RecordedAlert, RecordingAlertSink, TracingAlertSink};
pub use archive::InMemoryArchive;
pub use broadcaster::{InMemoryBroadcaster, ScriptedStrategy};
pub use chain_state::InMemoryChainState;
pub use clock::{ManualTimeSource, TokioTimeSource};
