//! Async dispatch.
//!
//! [`SimplepushClient`] validates a notification, builds the `/send` body,
//! posts it, interprets the service's reply and, when asked, waits for the
//! recipient's feedback action. The blocking wrapper in
//! [`crate::blocking`] drives the same code on a private runtime.

use serde::Deserialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::feedback::{self, FeedbackHandler, FeedbackRecord};
use crate::payload::{build_payload, Encryption, Notification};
use crate::transport::{HttpResponse, HttpTransport};
use crate::{Result, SimplepushError};

#[cfg(feature = "http-client")]
use crate::transport::ReqwestTransport;

/// Service status for an accepted send.
const STATUS_OK: &str = "OK";
/// Service status for a rejected send.
const STATUS_BAD_REQUEST: &str = "BadRequest";
/// Message accompanying an oversized title or message.
const MESSAGE_TOO_LONG: &str = "Title or message too long";

/// Envelope returned by `POST /send`.
#[derive(Debug, Deserialize)]
struct SendResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "feedbackId")]
    feedback_id: Option<String>,
}

/// Async Simplepush client.
///
/// Holds no per-send state, so one client can serve any number of concurrent
/// sends.
///
/// # Example
///
/// ```ignore
/// use simplepush_lib::{ClientConfig, FeedbackHandler, Actions, Notification, SimplepushClient};
///
/// let client = SimplepushClient::new(ClientConfig::default())?;
/// let notification = Notification::new("HuxgBB", "Deploy?")
///     .actions(Actions::labels(["yes", "no"]));
/// let handler = FeedbackHandler::new(|action| println!("{}", action.action_selected));
/// client.send(&notification, Some(handler)).await?;
/// ```
#[derive(Clone, Debug)]
pub struct SimplepushClient<T: HttpTransport> {
    config: ClientConfig,
    transport: T,
}

#[cfg(feature = "http-client")]
impl SimplepushClient<ReqwestTransport> {
    /// Create a client backed by reqwest.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self { config, transport })
    }
}

impl<T: HttpTransport> SimplepushClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a plain notification.
    ///
    /// With a `feedback` handler and a feedback id in the reply, this waits
    /// for the recipient's action before returning.
    #[tracing::instrument(
        skip(self, notification, feedback),
        fields(feedback = feedback.is_some())
    )]
    pub async fn send(&self, notification: &Notification, feedback: Option<FeedbackHandler>) -> Result<()> {
        self.dispatch(notification, None, feedback).await
    }

    /// Send a notification with title and message encrypted.
    #[tracing::instrument(
        skip(self, notification, encryption, feedback),
        fields(feedback = feedback.is_some())
    )]
    pub async fn send_encrypted(
        &self,
        notification: &Notification,
        encryption: &Encryption,
        feedback: Option<FeedbackHandler>,
    ) -> Result<()> {
        self.dispatch(notification, Some(encryption), feedback).await
    }

    /// Fetch the feedback record for `feedback_id` once, without waiting.
    pub async fn feedback_status(&self, feedback_id: &str) -> Result<FeedbackRecord> {
        feedback::fetch_feedback(&self.transport, &self.config, feedback_id).await
    }

    async fn dispatch(
        &self,
        notification: &Notification,
        encryption: Option<&Encryption>,
        feedback: Option<FeedbackHandler>,
    ) -> Result<()> {
        let payload = build_payload(notification, encryption)?;
        let body = serde_json::to_value(&payload)?;

        let response = self
            .transport
            .post_json(&self.config.send_url(), &body, self.config.timeout())
            .await?;

        let feedback_id = interpret_send_response(&response)?;

        match (feedback_id, feedback) {
            (Some(id), Some(handler)) => {
                feedback::poll_feedback(&self.transport, &self.config, &id, handler).await?;
            }
            (Some(id), None) => tracing::debug!(feedback_id = %id, "sent, feedback not requested"),
            (None, _) => tracing::debug!("sent"),
        }
        Ok(())
    }
}

/// Interpret a `/send` reply, returning the feedback id if one was issued.
fn interpret_send_response(response: &HttpResponse) -> Result<Option<String>> {
    let envelope: SendResponse = match serde_json::from_str(&response.body) {
        Ok(envelope) => envelope,
        Err(err) if response.is_success() => return Err(err.into()),
        Err(_) => return Err(http_status_error(response)),
    };

    if envelope.status == STATUS_BAD_REQUEST && envelope.message.as_deref() == Some(MESSAGE_TOO_LONG) {
        tracing::warn!("send rejected: {}", MESSAGE_TOO_LONG);
        return Err(SimplepushError::BadRequest(MESSAGE_TOO_LONG.to_string()));
    }

    if envelope.status != STATUS_OK {
        tracing::warn!(status = %envelope.status, message = ?envelope.message, "send rejected");
        return Err(SimplepushError::UnknownError {
            status: envelope.status,
            message: envelope.message,
        });
    }

    if !response.is_success() {
        return Err(http_status_error(response));
    }

    Ok(envelope.feedback_id.filter(|id| !id.is_empty()))
}

fn http_status_error(response: &HttpResponse) -> SimplepushError {
    SimplepushError::HttpStatus {
        status: response.status,
        body: response.body.clone(),
    }
}

/// Parse a raw `/send` body as the service would return it.
///
/// Exposed for callers that drive their own transport and only want the
/// reply semantics.
pub fn parse_send_response(status: u16, body: &str) -> Result<Option<String>> {
    interpret_send_response(&HttpResponse::new(status, body))
}

/// JSON body a send of `notification` would post, with a fresh IV.
pub fn preview_payload(notification: &Notification, encryption: Option<&Encryption>) -> Result<Value> {
    Ok(serde_json::to_value(build_payload(notification, encryption)?)?)
}
