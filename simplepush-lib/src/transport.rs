//! HTTP access to the service.
//!
//! The dispatch and feedback logic is written once against [`HttpTransport`].
//! [`ReqwestTransport`] is the production implementation; tests can inject
//! [`MockTransport`](crate::test_utils::MockTransport) instead.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Result, SimplepushError};

/// Status and body of an HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl HttpResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A 200 response with a JSON body.
    pub fn json_ok(body: &Value) -> Self {
        Self::new(200, body.to_string())
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(SimplepushError::from)
    }
}

/// Network capability used by the client.
///
/// Implementations return `Ok` for any HTTP status; only failures to complete
/// the exchange are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST `body` as JSON to `url`, bounded by `timeout`.
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<HttpResponse>;

    /// GET `url`.
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for std::sync::Arc<T> {
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<HttpResponse> {
        (**self).post_json(url, body, timeout).await
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        (**self).get(url).await
    }
}

/// [`HttpTransport`] over a shared `reqwest::Client`.
#[cfg(feature = "http-client")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http-client")]
impl ReqwestTransport {
    /// Build a transport whose requests default to `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::build(reqwest::Client::builder().timeout(timeout))
    }

    /// Like [`new`](Self::new) but keeps no idle connections.
    ///
    /// Pooled connections belong to the runtime that opened them, so a client
    /// driven by a fresh runtime per call must not reuse them.
    pub fn unpooled(timeout: Duration) -> Result<Self> {
        Self::build(
            reqwest::Client::builder()
                .timeout(timeout)
                .pool_max_idle_per_host(0),
        )
    }

    fn build(builder: reqwest::ClientBuilder) -> Result<Self> {
        let client = builder
            .user_agent(concat!("simplepush-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SimplepushError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn read(&self, response: reqwest::Response, url: &str) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, url, 0))?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(feature = "http-client")]
#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<HttpResponse> {
        tracing::debug!(url, "POST");
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, url, timeout.as_millis() as u64))?;

        self.read(response, url).await
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, url, 0))?;

        self.read(response, url).await
    }
}

/// Map reqwest errors to SimplepushError.
#[cfg(feature = "http-client")]
fn map_reqwest_error(e: reqwest::Error, url: &str, timeout_ms: u64) -> SimplepushError {
    if e.is_timeout() {
        SimplepushError::ConnectionTimeout {
            operation: format!("request to {}", url),
            timeout_ms,
        }
    } else if e.is_connect() {
        SimplepushError::ConnectionFailed {
            target: url.to_string(),
            reason: e.to_string(),
        }
    } else {
        SimplepushError::Transport(format!("request to {} failed: {}", url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(400, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }

    #[test]
    fn test_response_json() {
        let response = HttpResponse::json_ok(&json!({"status": "OK"}));
        let value: Value = response.json().unwrap();
        assert_eq!(value["status"], "OK");

        let garbage = HttpResponse::new(200, "<html>");
        let err = garbage.json::<Value>().unwrap_err();
        assert!(matches!(err, SimplepushError::Serialization(_)));
    }

    #[cfg(feature = "http-client")]
    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(Duration::from_secs(5)).is_ok());
        assert!(ReqwestTransport::unpooled(Duration::from_secs(5)).is_ok());
    }

    #[cfg(feature = "http-client")]
    #[tokio::test]
    async fn test_connection_refused_maps_to_connection_failed() {
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        // port 9 (discard) on localhost is closed in test environments
        let err = transport.get("http://127.0.0.1:9/").await.unwrap_err();
        assert!(
            matches!(err, SimplepushError::ConnectionFailed { ref target, .. } if target == "http://127.0.0.1:9/"),
            "unexpected error: {:?}",
            err
        );
        assert!(err.is_retryable());
    }

    #[cfg(feature = "http-client")]
    #[tokio::test]
    async fn test_from_client_uses_given_client() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        let transport = ReqwestTransport::from_client(client);
        let err = transport.get("http://127.0.0.1:9/").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
