//! Delivery error types.

use crate::TransportError;
use thiserror::Error;

/// Delivery error type.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] beacon_store::StoreError),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Core/configuration error
    #[error("Configuration error: {0}")]
    Core(#[from] beacon_core::CoreError),
}

/// Result type alias using DeliveryError.
pub type DeliveryResult<T> = Result<T, DeliveryError>;
