//! Delivery pipeline for queued tracking events.
//!
//! This crate drains the durable queue in `beacon-store` to a remote
//! collector:
//! - [`SendWorker`]: reads eligible records, builds requests (single or
//!   batched), transmits them, and updates record state
//! - [`CleanupWorker`]: sweeps successfully delivered records
//! - [`TokioScheduler`]: periodic delivery plus on-demand
//!   delivery-then-cleanup chains, behind the [`JobScheduler`] trait
//! - [`Tracker`]: the embedded client facade the host application holds

mod batch;
mod cleanup_worker;
mod error;
mod request;
mod scheduler;
mod send_worker;
mod tracker;
mod transport;

pub use batch::{Batched, BatchedExt};
pub use cleanup_worker::CleanupWorker;
pub use error::{DeliveryError, DeliveryResult};
pub use request::{build_batch_request, build_single_request, BuiltRequest};
pub use scheduler::{run_delivery_then_cleanup, JobScheduler, TokioScheduler};
pub use send_worker::SendWorker;
pub use tracker::{QueueStatus, Tracker};
pub use transport::{HttpTransport, Transport, TransportError};
