//! Embedded client facade.
//!
//! The host application holds one [`Tracker`] and feeds it pre-built
//! event payloads. Everything downstream (durable queueing, periodic
//! delivery, cleanup) is wired here through explicit dependencies rather
//! than process-wide state.

use crate::{
    CleanupWorker, DeliveryResult, HttpTransport, JobScheduler, SendWorker, TokioScheduler,
    Transport,
};
use beacon_core::{Paths, Session, TrackingConfig};
use beacon_store::{RequestState, Store};
use std::sync::Arc;
use tracing::debug;

/// Queue state snapshot for host introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatus {
    /// Records waiting for their first delivery attempt.
    pub new: i64,
    /// Records awaiting retry on the next run.
    pub failed: i64,
    /// Delivered records awaiting cleanup.
    pub done: i64,
}

/// Embedded telemetry client.
pub struct Tracker {
    store: Store,
    session: Session,
    config: TrackingConfig,
    scheduler: Arc<dyn JobScheduler>,
}

impl Tracker {
    /// Open a tracker with the default HTTP transport and in-process
    /// scheduler, storing runtime files under `paths`.
    pub async fn open(paths: &Paths, config: TrackingConfig) -> DeliveryResult<Self> {
        config.validate()?;

        let store = Store::open(&paths.database_file()).await?;
        let session = Session::load_or_create(paths)?;
        let transport = Arc::new(HttpTransport::new()?);

        Ok(Self::assemble(store, session, config, transport))
    }

    /// Assemble a tracker from an already-open store and a custom
    /// transport; the in-process scheduler is built around them.
    pub fn assemble<T: Transport>(
        store: Store,
        session: Session,
        config: TrackingConfig,
        transport: Arc<T>,
    ) -> Self {
        let send_worker = Arc::new(SendWorker::new(
            store.clone(),
            transport,
            config.clone(),
            session.ever_id(),
        ));
        let cleanup_worker = Arc::new(CleanupWorker::new(store.clone()));
        let scheduler = Arc::new(TokioScheduler::new(send_worker, cleanup_worker));

        Self {
            store,
            session,
            config,
            scheduler,
        }
    }

    /// Build a tracker around an externally provided scheduler (hosts
    /// that bridge to their own job system).
    pub fn with_scheduler(
        store: Store,
        session: Session,
        config: TrackingConfig,
        scheduler: Arc<dyn JobScheduler>,
    ) -> Self {
        Self {
            store,
            session,
            config,
            scheduler,
        }
    }

    /// Durably queue one event for delivery.
    ///
    /// The payload and its params are committed atomically; the returned
    /// id reflects insertion order.
    pub async fn enqueue(
        &self,
        payload: &str,
        params: &[(String, String)],
    ) -> DeliveryResult<i64> {
        let id = self.store.enqueue(payload, params).await?;
        debug!(id, "Queued track request");
        Ok(id)
    }

    /// Begin periodic delivery at the configured interval.
    ///
    /// Safe to call on every host startup: an already-scheduled job is
    /// kept as is.
    pub fn start(&self) {
        self.scheduler.schedule_periodic_delivery(
            self.config.request_interval(),
            self.config.constraints.clone(),
        );
    }

    /// Stop periodic delivery; an in-flight run completes.
    pub fn stop(&self) {
        self.scheduler.cancel_periodic_delivery();
    }

    /// Flush now: one delivery run chained into one cleanup run.
    pub fn flush(&self) {
        self.scheduler.trigger_delivery_then_cleanup();
    }

    /// Queue a standalone cleanup run.
    pub fn schedule_cleanup(&self) {
        self.scheduler.schedule_cleanup();
    }

    /// Current queue counts by state.
    pub async fn status(&self) -> DeliveryResult<QueueStatus> {
        Ok(QueueStatus {
            new: self.store.count_by_state(RequestState::New).await?,
            failed: self.store.count_by_state(RequestState::Failed).await?,
            done: self.store.count_by_state(RequestState::Done).await?,
        })
    }

    /// The install identifier attached to every delivered event.
    pub fn ever_id(&self) -> &str {
        self.session.ever_id()
    }

    /// The active configuration.
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::send_worker::tests::MockTransport;
    use tempfile::tempdir;

    fn test_config() -> TrackingConfig {
        TrackingConfig::new(vec!["123456".to_string()], "tracking.example.com")
    }

    async fn test_tracker(transport: Arc<MockTransport>) -> Tracker {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let store = Store::open_in_memory().await.unwrap();
        let session = Session::load_or_create(&paths).unwrap();
        Tracker::assemble(store, session, test_config(), transport)
    }

    #[tokio::test]
    async fn enqueue_reports_queue_status() {
        let tracker = test_tracker(Arc::new(MockTransport::default())).await;

        tracker.enqueue("p=1", &[]).await.unwrap();
        tracker
            .enqueue("p=2", &[("cp1".to_string(), "v".to_string())])
            .await
            .unwrap();

        let status = tracker.status().await.unwrap();
        assert_eq!(
            status,
            QueueStatus {
                new: 2,
                failed: 0,
                done: 0
            }
        );
    }

    #[tokio::test]
    async fn enqueue_ids_reflect_insertion_order() {
        let tracker = test_tracker(Arc::new(MockTransport::default())).await;

        let first = tracker.enqueue("p=1", &[]).await.unwrap();
        let second = tracker.enqueue("p=2", &[]).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn open_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let config = TrackingConfig::new(vec![], "tracking.example.com");

        assert!(Tracker::open(&paths, config).await.is_err());
    }

    #[tokio::test]
    async fn ever_id_is_stable_for_the_install() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let session = Session::load_or_create(&paths).unwrap();
        let expected = session.ever_id().to_string();

        let store = Store::open_in_memory().await.unwrap();
        let tracker = Tracker::assemble(
            store,
            session,
            test_config(),
            Arc::new(MockTransport::default()),
        );
        assert_eq!(tracker.ever_id(), expected);
    }

    #[derive(Default)]
    struct RecordingScheduler {
        calls: std::sync::Mutex<Vec<&'static str>>,
    }

    impl JobScheduler for RecordingScheduler {
        fn schedule_periodic_delivery(
            &self,
            _interval: std::time::Duration,
            _constraints: beacon_core::JobConstraints,
        ) {
            self.calls.lock().unwrap().push("periodic");
        }

        fn trigger_delivery_then_cleanup(&self) {
            self.calls.lock().unwrap().push("chain");
        }

        fn schedule_cleanup(&self) {
            self.calls.lock().unwrap().push("cleanup");
        }

        fn cancel_periodic_delivery(&self) {
            self.calls.lock().unwrap().push("cancel");
        }
    }

    #[tokio::test]
    async fn host_scheduler_receives_lifecycle_calls() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        let store = Store::open_in_memory().await.unwrap();
        let session = Session::load_or_create(&paths).unwrap();
        let scheduler = Arc::new(RecordingScheduler::default());

        let tracker =
            Tracker::with_scheduler(store, session, test_config(), scheduler.clone());
        tracker.start();
        tracker.flush();
        tracker.schedule_cleanup();
        tracker.stop();

        assert_eq!(
            *scheduler.calls.lock().unwrap(),
            vec!["periodic", "chain", "cleanup", "cancel"]
        );
    }

    #[tokio::test]
    async fn flush_drains_and_cleans_the_queue() {
        let transport = Arc::new(MockTransport::default());
        let tracker = test_tracker(transport.clone()).await;
        tracker.enqueue("p=1", &[]).await.unwrap();

        tracker.flush();

        for _ in 0..200 {
            let status = tracker.status().await.unwrap();
            if status == (QueueStatus { new: 0, failed: 0, done: 0 }) {
                assert_eq!(transport.call_count(), 1);
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("flush did not drain the queue in time");
    }
}
