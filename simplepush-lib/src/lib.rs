//! Simplepush client library.
//!
//! Sends push notifications through the [Simplepush](https://simplepush.io)
//! service, optionally end-to-end encrypted, and waits for the recipient to
//! pick one of the notification's actions.
//!
//! # Features
//!
//! - **Plain and encrypted sends**: AES-128-CBC payload encryption compatible
//!   with the Simplepush apps
//! - **Actions**: feedback labels or `{name, url}` GET actions, validated
//!   before anything is sent
//! - **Feedback polling**: backoff-scheduled polling with an optional timeout
//! - **Async and blocking**: [`SimplepushClient`] and [`blocking::SimplepushClient`]
//!   share one implementation over the [`HttpTransport`] trait
//!
//! # Example
//!
//! ```ignore
//! use simplepush_lib::{Actions, Encryption, FeedbackHandler, Notification};
//!
//! let notification = Notification::new("HuxgBB", "Restart the server?")
//!     .title("ops")
//!     .actions(Actions::labels(["yes", "no"]));
//!
//! let handler = FeedbackHandler::new(|action| {
//!     println!("{} picked {}", action.feedback_id, action.action_selected);
//! });
//!
//! simplepush_lib::send_encrypted(&notification, &Encryption::new("pw"), Some(handler)).await?;
//! ```

pub mod actions;
pub mod blocking;
pub mod client;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod feedback;
pub mod payload;
pub mod prelude;
pub mod transport;

/// Test utilities: in-memory transport, fixtures and assertions.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use actions::{validate_actions, Actions};
pub use client::SimplepushClient;
pub use config::ClientConfig;
pub use crypto::{EncryptionError, EncryptionKey};
pub use errors::{SimplepushError, SimplepushErrorCode};
pub use feedback::{FeedbackAction, FeedbackHandler, FeedbackRecord};
pub use payload::{build_payload, Encryption, Notification, SendPayload};
pub use transport::{HttpResponse, HttpTransport};

#[cfg(feature = "http-client")]
pub use transport::ReqwestTransport;

/// Common result alias for Simplepush operations.
pub type Result<T> = std::result::Result<T, SimplepushError>;

/// Send with a default client.
#[cfg(feature = "http-client")]
pub async fn send(notification: &Notification, feedback: Option<FeedbackHandler>) -> Result<()> {
    SimplepushClient::new(ClientConfig::default())?
        .send(notification, feedback)
        .await
}

/// Send encrypted with a default client.
#[cfg(feature = "http-client")]
pub async fn send_encrypted(
    notification: &Notification,
    encryption: &Encryption,
    feedback: Option<FeedbackHandler>,
) -> Result<()> {
    SimplepushClient::new(ClientConfig::default())?
        .send_encrypted(notification, encryption, feedback)
        .await
}
