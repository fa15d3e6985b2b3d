//! Remote store port
//!
//! The controller pushes full [`RoomState`] documents through this trait and
//! never hears back on the same path: incoming updates arrive via the host
//! application calling [`crate::SessionController::apply_remote`], which
//! keeps the controller's event processing single-file.
//!
//! There is no retry or backpressure here; a failed publish surfaces as
//! [`crate::SyncError::Publish`] and retrying is the caller's decision. The store
//! is assumed durable once a write succeeds and last-write-wins per room.

use tracing::debug;

use crate::error::SyncResult;
use crate::room::RoomState;

/// Outbound half of the shared-store adapter
pub trait RemoteStore {
    /// Overwrite the room document with the complete state
    fn publish(&mut self, state: &RoomState) -> SyncResult<()>;
}

/// Store double for tests and single-process embedding
///
/// Records every published state in order; `latest()` is the room document
/// a subscriber would currently observe.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    published: Vec<RoomState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<&RoomState> {
        self.published.last()
    }

    pub fn publish_count(&self) -> usize {
        self.published.len()
    }
}

impl RemoteStore for InMemoryStore {
    fn publish(&mut self, state: &RoomState) -> SyncResult<()> {
        debug!(
            "[SYNC] publish: {} plies, cursor {}",
            state.history.len(),
            state.current_index
        );
        self.published.push(state.clone());
        Ok(())
    }
}
