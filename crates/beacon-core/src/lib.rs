//! Core types, configuration, and install identity for the Beacon client.

mod config;
mod error;
mod logging;
mod paths;
mod session;

pub use config::{JobConstraints, TrackingConfig, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
pub use session::{generate_ever_id, Session};
