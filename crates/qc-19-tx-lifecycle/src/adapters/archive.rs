//! In-memory archive of terminal records.

use crate::domain::OutcomeEvent;
use crate::error::ArchiveError;
use crate::ports::outbound::TransactionArchive;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Collects terminal records. Can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct InMemoryArchive {
    records: Mutex<Vec<OutcomeEvent>>,
    failing: AtomicBool,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<OutcomeEvent> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl TransactionArchive for InMemoryArchive {
    async fn archive(&self, event: &OutcomeEvent) -> Result<(), ArchiveError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ArchiveError("archive unavailable".into()));
        }
        self.records.lock().push(event.clone());
        Ok(())
    }
}
