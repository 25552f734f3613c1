//! Store model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A queued tracking event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRequest {
    pub id: i64,
    /// Opaque pre-built request body/URL fragment.
    pub payload: String,
    pub state: RequestState,
    pub created_at: DateTime<Utc>,
}

/// Request lifecycle state.
///
/// Created as `New`, moved to `Done` or `Failed` by the delivery worker,
/// deleted from `Done` by the cleanup worker. `Failed` records become
/// eligible again on the next delivery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    New,
    Failed,
    Done,
}

impl Default for RequestState {
    fn default() -> Self {
        Self::New
    }
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Failed => "failed",
            Self::Done => "done",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "failed" => Self::Failed,
            "done" => Self::Done,
            _ => Self::New,
        }
    }
}

/// Key/value parameter attached to a [`TrackRequest`].
///
/// Rows cascade away with their owning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomParam {
    pub id: i64,
    pub track_id: i64,
    pub param_key: String,
    pub param_value: String,
}

/// A track request together with its custom params, as fetched for
/// delivery.
#[derive(Debug, Clone)]
pub struct DataTrack {
    pub request: TrackRequest,
    pub params: Vec<CustomParam>,
}
