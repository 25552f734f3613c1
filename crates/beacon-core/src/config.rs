//! Configuration for the tracking client.
//!
//! The configuration doubles as the persisted snapshot read by background
//! workers that may start in a fresh process: [`TrackingConfig::to_json`] /
//! [`TrackingConfig::from_json`] round-trip everything a worker needs to
//! rebuild requests without the host's live configuration object.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default interval between periodic delivery runs, in minutes.
const DEFAULT_REQUEST_INTERVAL_MINUTES: u64 = 15;

/// Default number of records combined into one batch request.
const DEFAULT_REQUESTS_PER_BATCH: usize = 5000;

/// Execution constraints attached to scheduled delivery jobs.
///
/// Carried with the periodic job registration so host job-system adapters
/// can gate runs on device conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConstraints {
    /// Only run delivery while the device has network connectivity.
    pub network_required: bool,
}

impl Default for JobConstraints {
    fn default() -> Self {
        Self {
            network_required: true,
        }
    }
}

/// Main tracking client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Collector account identifiers; at least one is required.
    pub track_ids: Vec<String>,
    /// Collector domain, with or without a scheme.
    pub track_domain: String,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Interval between periodic delivery runs, in minutes.
    #[serde(default = "default_request_interval_minutes")]
    pub request_interval_minutes: u64,
    /// Whether the collector accepts combined batch requests.
    #[serde(default)]
    pub batch_support: bool,
    /// Maximum records per combined batch request.
    #[serde(default = "default_requests_per_batch")]
    pub requests_per_batch: usize,
    /// Constraints for scheduled delivery jobs.
    #[serde(default)]
    pub constraints: JobConstraints,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_request_interval_minutes() -> u64 {
    DEFAULT_REQUEST_INTERVAL_MINUTES
}

fn default_requests_per_batch() -> usize {
    DEFAULT_REQUESTS_PER_BATCH
}

impl TrackingConfig {
    /// Create a configuration with the required fields and defaults for the
    /// rest, then apply environment overrides.
    pub fn new(track_ids: Vec<String>, track_domain: impl Into<String>) -> Self {
        let mut config = Self {
            track_ids,
            track_domain: track_domain.into(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            request_interval_minutes: DEFAULT_REQUEST_INTERVAL_MINUTES,
            batch_support: false,
            requests_per_batch: DEFAULT_REQUESTS_PER_BATCH,
            constraints: JobConstraints::default(),
        };
        config.load_from_env();
        config
    }

    /// Validate required fields.
    ///
    /// Track ids must be present and non-blank, and the track domain must
    /// resolve to a well-formed collector URL.
    pub fn validate(&self) -> CoreResult<()> {
        if self.track_ids.is_empty() || self.track_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(CoreError::InvalidConfig(
                "track_ids is required and entries must not be blank".to_string(),
            ));
        }
        if self.track_domain.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "track_domain is required".to_string(),
            ));
        }
        Url::parse(&self.collector_base())?;
        Ok(())
    }

    /// The collector base URL, defaulting to https when the configured
    /// domain carries no scheme.
    pub fn collector_base(&self) -> String {
        let domain = self.track_domain.trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        }
    }

    /// Interval between periodic delivery runs.
    pub fn request_interval(&self) -> Duration {
        Duration::from_secs(self.request_interval_minutes * 60)
    }

    /// Serialize the configuration snapshot to JSON.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reconstruct a configuration snapshot from JSON.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Load configuration from the config file under `paths`.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();
        let mut config = Self::load_from_file(&config_path)?;
        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to the config file under `paths`.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override configuration from environment variables. Only the log
    /// level can be overridden at runtime.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("BEACON_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config() -> TrackingConfig {
        TrackingConfig::new(
            vec!["123456789".to_string(), "123".to_string()],
            "tracking.example.com",
        )
    }

    #[test]
    fn defaults_are_applied() {
        let config = test_config();
        assert_eq!(config.request_interval_minutes, 15);
        assert_eq!(config.requests_per_batch, 5000);
        assert!(!config.batch_support);
        assert!(config.constraints.network_required);
    }

    #[test]
    fn json_roundtrip_preserves_track_ids() {
        let config = test_config();
        let json = config.to_json().unwrap();
        let restored = TrackingConfig::from_json(&json).unwrap();
        assert_eq!(restored.track_ids, config.track_ids);
        assert_eq!(restored, config);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let json = r#"{"track_ids": ["1"], "track_domain": "t.example.com"}"#;
        let config = TrackingConfig::from_json(json).unwrap();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.request_interval_minutes, 15);
        assert!(config.constraints.network_required);
    }

    #[test]
    fn validate_rejects_empty_track_ids() {
        let config = TrackingConfig::new(vec![], "t.example.com");
        assert!(config.validate().is_err());

        let config = TrackingConfig::new(vec!["  ".to_string()], "t.example.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_domain() {
        let config = TrackingConfig::new(vec!["1".to_string()], "");
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_domain_with_and_without_scheme() {
        assert!(test_config().validate().is_ok());

        let config = TrackingConfig::new(vec!["1".to_string()], "https://t.example.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn collector_base_adds_scheme_and_strips_trailing_slash() {
        let config = TrackingConfig::new(vec!["1".to_string()], "t.example.com/");
        assert_eq!(config.collector_base(), "https://t.example.com");

        let config = TrackingConfig::new(vec!["1".to_string()], "http://t.example.com");
        assert_eq!(config.collector_base(), "http://t.example.com");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = test_config();
        config.batch_support = true;
        config.requests_per_batch = 200;
        config.save(&paths).unwrap();

        let loaded = TrackingConfig::load(&paths).unwrap();
        assert_eq!(loaded.track_ids, config.track_ids);
        assert!(loaded.batch_support);
        assert_eq!(loaded.requests_per_batch, 200);
    }

    #[test]
    fn request_interval_converts_minutes() {
        let config = test_config();
        assert_eq!(config.request_interval(), Duration::from_secs(15 * 60));
    }
}
