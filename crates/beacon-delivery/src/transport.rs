//! HTTP transport to the collector.

use crate::BuiltRequest;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Transport error type.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request error (connection, DNS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Collector rejected the request
    #[error("Collector returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Sends built requests to the collector.
///
/// One call per unbatched record or per batch group; any error marks the
/// whole unit failed. Timeouts are the implementation's concern and
/// surface as ordinary errors.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: &BuiltRequest,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Collector transport over reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with the default timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &BuiltRequest) -> Result<(), TransportError> {
        debug!(url = %request.url, batched = request.body.is_some(), "Sending track request");

        let response = match &request.body {
            Some(body) => {
                self.client
                    .post(&request.url)
                    .body(body.clone())
                    .send()
                    .await?
            }
            None => self.client.get(&request.url).send().await?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_builds_with_custom_timeout() {
        assert!(HttpTransport::new().is_ok());
        assert!(HttpTransport::with_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn status_error_displays_code() {
        let err = TransportError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("unavailable"));
    }
}
