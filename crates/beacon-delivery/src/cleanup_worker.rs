//! Cleanup worker: removes successfully delivered records.

use crate::DeliveryResult;
use beacon_store::{RequestState, Store};
use tracing::{debug, error, info, warn};

/// Deletes DONE records and their custom params in one batch.
///
/// Deletion failure is reported but not retried synchronously; the
/// records stay DONE and the next scheduled cleanup re-attempts them.
pub struct CleanupWorker {
    store: Store,
}

impl CleanupWorker {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Run one cleanup pass.
    pub async fn run(&self) -> DeliveryResult<()> {
        let done = self.store.fetch_by_state(&[RequestState::Done]).await?;

        if done.is_empty() {
            debug!("No completed track requests to clean");
            return Ok(());
        }

        info!(count = done.len(), "Cleaning up completed track requests");
        let ids: Vec<i64> = done.iter().map(|t| t.request.id).collect();

        match self.store.delete_requests(&ids).await {
            Ok(deleted) => {
                debug!(deleted, "Cleaned up completed track requests");
                let swept = self.store.sweep_orphaned_params().await?;
                if swept > 0 {
                    warn!(swept, "Removed orphaned custom params");
                }
            }
            Err(e) => {
                error!(error = %e, "Failed cleaning up completed track requests");
            }
        }

        Ok(())
    }
}
