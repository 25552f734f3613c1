//! Background job scheduling for the delivery pipeline.
//!
//! [`JobScheduler`] is the capability seam: schedule-periodic,
//! one-time chain, one-time cleanup, cancel. [`TokioScheduler`] is the
//! in-process adapter; hosts with their own job system (cron, WorkManager
//! bridges, …) provide their own implementation.

use crate::{CleanupWorker, SendWorker, Transport};
use beacon_core::JobConstraints;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

/// Delay before the first periodic delivery run.
const INITIAL_DELAY: Duration = Duration::from_secs(60);

/// Scheduling capabilities required by the tracking client.
pub trait JobScheduler: Send + Sync {
    /// Arrange recurring delivery runs.
    ///
    /// Keep-existing policy: when a periodic job is already live, the new
    /// request is dropped so repeated host startups do not reset the
    /// interval.
    fn schedule_periodic_delivery(&self, interval: Duration, constraints: JobConstraints);

    /// Enqueue one delivery run chained into one cleanup run. Cleanup
    /// runs after delivery completes, success or failure.
    fn trigger_delivery_then_cleanup(&self);

    /// Enqueue a single cleanup run, independent of delivery.
    fn schedule_cleanup(&self);

    /// Cancel periodic delivery. Future runs only: an in-flight run
    /// completes normally, and queued one-time cleanups are unaffected.
    fn cancel_periodic_delivery(&self);
}

/// Run one delivery pass followed by cleanup.
///
/// The chain always advances: a failed delivery still hands off to
/// cleanup.
pub async fn run_delivery_then_cleanup<T: Transport>(
    send_worker: &SendWorker<T>,
    cleanup_worker: &CleanupWorker,
) {
    if let Err(e) = send_worker.run().await {
        warn!(error = %e, "Immediate delivery run failed");
    }
    if let Err(e) = cleanup_worker.run().await {
        warn!(error = %e, "Chained cleanup run failed");
    }
}

struct PeriodicJob {
    handle: JoinHandle<()>,
    cancel: watch::Sender<bool>,
}

/// In-process scheduler backed by tokio tasks.
pub struct TokioScheduler<T: Transport> {
    send_worker: Arc<SendWorker<T>>,
    cleanup_worker: Arc<CleanupWorker>,
    periodic: Mutex<Option<PeriodicJob>>,
}

impl<T: Transport> TokioScheduler<T> {
    pub fn new(send_worker: Arc<SendWorker<T>>, cleanup_worker: Arc<CleanupWorker>) -> Self {
        Self {
            send_worker,
            cleanup_worker,
            periodic: Mutex::new(None),
        }
    }

    /// Whether a periodic delivery job is currently live.
    pub fn periodic_scheduled(&self) -> bool {
        self.periodic
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|job| !job.handle.is_finished())
    }
}

impl<T: Transport> JobScheduler for TokioScheduler<T> {
    fn schedule_periodic_delivery(&self, interval: Duration, constraints: JobConstraints) {
        let mut guard = self.periodic.lock().unwrap();
        if guard.as_ref().is_some_and(|job| !job.handle.is_finished()) {
            debug!("Periodic delivery already scheduled, keeping existing job");
            return;
        }

        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let worker = self.send_worker.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + INITIAL_DELAY, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if *cancel_rx.borrow() {
                            break;
                        }
                        // Cancellation is only observed between runs; a
                        // run in progress always completes.
                        if let Err(e) = worker.run().await {
                            warn!(error = %e, "Periodic delivery run failed");
                        }
                    }
                    _ = cancel_rx.changed() => break,
                }
            }
            debug!("Periodic delivery job stopped");
        });

        *guard = Some(PeriodicJob {
            handle,
            cancel: cancel_tx,
        });
        info!(
            interval_secs = interval.as_secs(),
            network_required = constraints.network_required,
            "Scheduled periodic delivery"
        );
    }

    fn trigger_delivery_then_cleanup(&self) {
        let send_worker = self.send_worker.clone();
        let cleanup_worker = self.cleanup_worker.clone();
        tokio::spawn(async move {
            run_delivery_then_cleanup(send_worker.as_ref(), cleanup_worker.as_ref()).await;
        });
        debug!("Enqueued immediate delivery-then-cleanup chain");
    }

    fn schedule_cleanup(&self) {
        let cleanup_worker = self.cleanup_worker.clone();
        tokio::spawn(async move {
            if let Err(e) = cleanup_worker.run().await {
                warn!(error = %e, "Cleanup run failed");
            }
        });
        debug!("Enqueued cleanup run");
    }

    fn cancel_periodic_delivery(&self) {
        let mut guard = self.periodic.lock().unwrap();
        if let Some(job) = guard.take() {
            let _ = job.cancel.send(true);
            info!("Cancelled periodic delivery");
        }
    }
}
