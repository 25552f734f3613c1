//! Durable store for queued tracking events.
//!
//! Events wait here as [`TrackRequest`] rows until the delivery pipeline
//! drains them. All SQL runs on a dedicated executor thread behind
//! [`Store`]; the raw query functions live in [`queries`] for callers that
//! already hold a connection.

mod error;
mod migrations;
mod models;
pub mod queries;
mod store;

pub use error::{StoreError, StoreResult};
pub use migrations::run_migrations;
pub use models::{CustomParam, DataTrack, RequestState, TrackRequest};
pub use store::Store;
