//! Collector request construction.
//!
//! Single records become one GET each; batch groups become one POST whose
//! body carries one request line per record. Every line ends with the
//! install identifier so the collector can correlate events.

use beacon_core::TrackingConfig;
use beacon_store::DataTrack;
use url::form_urlencoded;

/// A fully built collector request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltRequest {
    pub url: String,
    /// Batch body; `None` for single-record GET requests.
    pub body: Option<String>,
}

/// One request line: the cached payload plus url-encoded custom params
/// and the install identifier.
fn request_line(track: &DataTrack, ever_id: &str) -> String {
    let mut line = format!("wt?{}", track.request.payload);

    if !track.params.is_empty() {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for param in &track.params {
            serializer.append_pair(&param.param_key, &param.param_value);
        }
        line.push('&');
        line.push_str(&serializer.finish());
    }

    line.push_str("&eid=");
    line.push_str(ever_id);
    line
}

/// Build one GET request for a single record.
pub fn build_single_request(
    track: &DataTrack,
    config: &TrackingConfig,
    ever_id: &str,
) -> BuiltRequest {
    BuiltRequest {
        url: format!(
            "{}/{}/{}",
            config.collector_base(),
            config.track_ids.join(","),
            request_line(track, ever_id)
        ),
        body: None,
    }
}

/// Build one POST request for a batch group, one payload line per record,
/// in the group's order.
pub fn build_batch_request(
    group: &[DataTrack],
    config: &TrackingConfig,
    ever_id: &str,
) -> BuiltRequest {
    let body = group
        .iter()
        .map(|track| request_line(track, ever_id))
        .collect::<Vec<_>>()
        .join("\n");

    BuiltRequest {
        url: format!(
            "{}/{}/batch",
            config.collector_base(),
            config.track_ids.join(",")
        ),
        body: Some(body),
    }
}
