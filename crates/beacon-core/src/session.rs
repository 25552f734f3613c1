//! Install-scoped identity.
//!
//! The install identifier correlates every event sent from one
//! installation. It is generated once, persisted next to the config file,
//! and handed to workers through an explicit [`Session`] value instead of
//! process-wide state.

use crate::{CoreResult, Paths};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Persisted install state (~/.beacon/install.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InstallState {
    ever_id: String,
}

/// Install-scoped session context passed to workers.
#[derive(Debug, Clone)]
pub struct Session {
    ever_id: String,
}

impl Session {
    /// Load the install state, generating and persisting it on first use.
    ///
    /// The identifier is stable for the life of the install: every later
    /// call returns the value written by the first one.
    pub fn load_or_create(paths: &Paths) -> CoreResult<Self> {
        let path = paths.install_file();
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let state: InstallState = serde_json::from_str(&content)?;
            return Ok(Self {
                ever_id: state.ever_id,
            });
        }

        let state = InstallState {
            ever_id: generate_ever_id(),
        };
        paths.ensure_dirs()?;
        std::fs::write(&path, serde_json::to_string_pretty(&state)?)?;
        debug!(ever_id = %state.ever_id, "Generated install identifier");

        Ok(Self {
            ever_id: state.ever_id,
        })
    }

    /// The cached install identifier.
    pub fn ever_id(&self) -> &str {
        &self.ever_id
    }
}

/// Generate a new install identifier: a fixed leading digit, the epoch
/// seconds zero-padded to 10 digits, and an 8-digit random suffix.
/// Globally unlikely to collide; not cryptographically secure.
pub fn generate_ever_id() -> String {
    let secs = Utc::now().timestamp();
    let suffix: u32 = rand::thread_rng().gen_range(0..100_000_000);
    format!("6{secs:010}{suffix:08}")
}
