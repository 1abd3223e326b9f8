//! Blocking dispatch.
//!
//! Each call builds a single-threaded tokio runtime, drives the async client
//! to completion on it and drops it. Use these from synchronous code only;
//! calling them from inside a runtime fails with
//! [`SimplepushError::Internal`] instead of panicking.

use std::future::Future;

use crate::client;
use crate::config::ClientConfig;
use crate::feedback::{FeedbackHandler, FeedbackRecord};
use crate::payload::{Encryption, Notification};
use crate::transport::HttpTransport;
use crate::{Result, SimplepushError};

#[cfg(feature = "http-client")]
use crate::transport::ReqwestTransport;

/// Blocking Simplepush client.
#[derive(Clone, Debug)]
pub struct SimplepushClient<T: HttpTransport> {
    inner: client::SimplepushClient<T>,
}

#[cfg(feature = "http-client")]
impl SimplepushClient<ReqwestTransport> {
    /// Create a client backed by reqwest.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::unpooled(config.timeout())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: HttpTransport> SimplepushClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            inner: client::SimplepushClient::with_transport(config, transport),
        }
    }

    /// The async client this wraps.
    pub fn inner(&self) -> &client::SimplepushClient<T> {
        &self.inner
    }

    /// Send a plain notification, blocking until done.
    pub fn send(&self, notification: &Notification, feedback: Option<FeedbackHandler>) -> Result<()> {
        block_on(self.inner.send(notification, feedback))?
    }

    /// Send an encrypted notification, blocking until done.
    pub fn send_encrypted(
        &self,
        notification: &Notification,
        encryption: &Encryption,
        feedback: Option<FeedbackHandler>,
    ) -> Result<()> {
        block_on(self.inner.send_encrypted(notification, encryption, feedback))?
    }

    /// Fetch the feedback record for `feedback_id` once.
    pub fn feedback_status(&self, feedback_id: &str) -> Result<FeedbackRecord> {
        block_on(self.inner.feedback_status(feedback_id))?
    }
}

/// Send with a default client, blocking until done.
#[cfg(feature = "http-client")]
pub fn send(notification: &Notification, feedback: Option<FeedbackHandler>) -> Result<()> {
    SimplepushClient::new(ClientConfig::default())?.send(notification, feedback)
}

/// Send encrypted with a default client, blocking until done.
#[cfg(feature = "http-client")]
pub fn send_encrypted(
    notification: &Notification,
    encryption: &Encryption,
    feedback: Option<FeedbackHandler>,
) -> Result<()> {
    SimplepushClient::new(ClientConfig::default())?.send_encrypted(notification, encryption, feedback)
}

fn block_on<F: Future>(future: F) -> Result<F::Output> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(SimplepushError::Internal(
            "blocking client called from within an async runtime; use the async client".to_string(),
        ));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| SimplepushError::Internal(format!("Failed to build runtime: {}", e)))?;

    Ok(runtime.block_on(future))
}
