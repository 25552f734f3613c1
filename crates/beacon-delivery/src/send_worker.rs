//! Delivery worker: drains eligible records to the collector.

use crate::{build_batch_request, build_single_request, BatchedExt, DeliveryResult, Transport};
use beacon_core::TrackingConfig;
use beacon_store::{RequestState, Store};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reads NEW/FAILED records in insertion order, transmits them, and
/// updates each record's state from its own result.
///
/// Transmission errors downgrade the affected unit (record or batch
/// group) to FAILED and the run continues with the next unit. Nothing is
/// retried within a run; FAILED records wait for the next scheduled one.
pub struct SendWorker<T: Transport> {
    store: Store,
    transport: Arc<T>,
    config: TrackingConfig,
    ever_id: String,
}

impl<T: Transport> SendWorker<T> {
    pub fn new(
        store: Store,
        transport: Arc<T>,
        config: TrackingConfig,
        ever_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            transport,
            config,
            ever_id: ever_id.into(),
        }
    }

    /// Run one delivery pass.
    pub async fn run(&self) -> DeliveryResult<()> {
        let tracks = self
            .store
            .fetch_by_state(&[RequestState::New, RequestState::Failed])
            .await?;

        if tracks.is_empty() {
            debug!("No pending track requests");
            return Ok(());
        }

        info!(count = tracks.len(), "Executing pending track requests");

        if self.config.batch_support {
            // Batch transmission is all-or-nothing per group: one failure
            // marks the whole group FAILED.
            for group in tracks
                .into_iter()
                .batched(self.config.requests_per_batch)
            {
                let batch_id = Uuid::new_v4();
                let ids: Vec<i64> = group.iter().map(|t| t.request.id).collect();
                let request = build_batch_request(&group, &self.config, &self.ever_id);

                match self.transport.send(&request).await {
                    Ok(()) => {
                        self.store.mark_state(&ids, RequestState::Done).await?;
                        debug!(%batch_id, count = ids.len(), "Batch sent");
                    }
                    Err(e) => {
                        warn!(%batch_id, count = ids.len(), error = %e, "Batch send failed");
                        self.store.mark_state(&ids, RequestState::Failed).await?;
                    }
                }
            }
        } else {
            for track in tracks {
                let id = track.request.id;
                let request = build_single_request(&track, &self.config, &self.ever_id);

                match self.transport.send(&request).await {
                    Ok(()) => {
                        self.store.mark_state(&[id], RequestState::Done).await?;
                        debug!(id, "Track request sent");
                    }
                    Err(e) => {
                        warn!(id, error = %e, "Track request send failed");
                        self.store.mark_state(&[id], RequestState::Failed).await?;
                    }
                }
            }
        }

        Ok(())
    }
}
