//! Configuration for the Simplepush client.
//!
//! The constants here are fixed at build time. [`ClientConfig`] is built once
//! and never mutated by the client.
//!
//! # Environment Variables
//!
//! [`ClientConfig::from_env`] overlays the defaults with:
//! - `SIMPLEPUSH_URL` - service base URL (e.g., a staging host)
//! - `SIMPLEPUSH_TIMEOUT_SECS` - send request timeout in seconds

use serde::{Deserialize, Serialize};

/// Production service base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.simplepush.io";

/// Send request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// How long to wait for a feedback action, in seconds.
pub const DEFAULT_FEEDBACK_TIMEOUT_SECS: u64 = 60;

/// Salt used when an encrypted send does not supply one.
///
/// Clients released before the salt became configurable derived their keys
/// with this value, so it must not change.
pub const LEGACY_SALT: &str = "1789F0B8C4A051E5";

/// Path of the send endpoint.
pub const SEND_PATH: &str = "/send";

/// Path prefix of the feedback status endpoint.
pub const FEEDBACK_PATH: &str = "/1/feedback";

/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "SIMPLEPUSH_URL";

/// Environment variable overriding the send timeout.
pub const ENV_TIMEOUT_SECS: &str = "SIMPLEPUSH_TIMEOUT_SECS";

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Service base URL (e.g., `https://api.simplepush.io`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Send request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given base URL with default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout(),
        }
    }

    /// Defaults overlaid with `SIMPLEPUSH_URL` / `SIMPLEPUSH_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL).filter(|url| !url.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(0) => {
                    tracing::warn!("ignoring {ENV_TIMEOUT_SECS}=0: timeout must be positive");
                }
                Ok(secs) => config.timeout_secs = secs,
                Err(err) => {
                    tracing::warn!("ignoring {ENV_TIMEOUT_SECS}={raw:?}: {err}");
                }
            }
        }

        config
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the send request timeout. Zero keeps the current value.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        if secs == 0 {
            tracing::warn!("ignoring zero send timeout");
        } else {
            self.timeout_secs = secs;
        }
        self
    }

    /// Send timeout as a [`Duration`](std::time::Duration).
    ///
    /// A zero `timeout_secs` (e.g. from deserialized config) means the default.
    pub fn timeout(&self) -> std::time::Duration {
        let secs = match self.timeout_secs {
            0 => DEFAULT_TIMEOUT_SECS,
            secs => secs,
        };
        std::time::Duration::from_secs(secs)
    }

    /// Build the full URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// URL of the send endpoint.
    pub fn send_url(&self) -> String {
        self.url(SEND_PATH)
    }

    /// URL of the feedback status endpoint for `feedback_id`.
    pub fn feedback_url(&self, feedback_id: &str) -> String {
        self.url(&format!(
            "{}/{}",
            FEEDBACK_PATH,
            urlencoding::encode(feedback_id)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.simplepush.io");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.send_url(), "https://api.simplepush.io/send");
    }

    #[test]
    fn test_url_building() {
        let config = ClientConfig::new("http://127.0.0.1:8080/");
        assert_eq!(config.url("/send"), "http://127.0.0.1:8080/send");
        assert_eq!(
            config.feedback_url("abc123"),
            "http://127.0.0.1:8080/1/feedback/abc123"
        );
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::default()
            .with_base_url("https://staging.example.com")
            .with_timeout(30);
        assert_eq!(config.base_url, "https://staging.example.com");
        assert_eq!(config.timeout(), std::time::Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_BASE_URL, "http://localhost:9000"),
            (ENV_TIMEOUT_SECS, "12"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout_secs, 12);
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = ClientConfig::from_lookup(|name| match name {
            ENV_BASE_URL => Some("  ".to_string()),
            ENV_TIMEOUT_SECS => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ClientConfig::from_lookup(|name| match name {
            ENV_TIMEOUT_SECS => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);

        let config = ClientConfig::default().with_timeout(7).with_timeout(0);
        assert_eq!(config.timeout_secs, 7);

        let config: ClientConfig = serde_json::from_str(r#"{"timeout_secs": 0}"#).unwrap();
        assert_eq!(config.timeout(), std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_feedback_id_is_escaped() {
        let config = ClientConfig::default();
        assert_eq!(
            config.feedback_url("a/b?c#d"),
            "https://api.simplepush.io/1/feedback/a%2Fb%3Fc%23d"
        );
        assert_eq!(
            config.feedback_url("3f9c-41ab"),
            "https://api.simplepush.io/1/feedback/3f9c-41ab"
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"timeout_secs": 9}"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 9);
    }

    #[test]
    fn test_legacy_salt_is_sixteen_hex_chars() {
        assert_eq!(LEGACY_SALT.len(), 16);
        assert!(LEGACY_SALT.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
