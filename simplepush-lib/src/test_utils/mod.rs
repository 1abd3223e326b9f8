//! Test utilities for the Simplepush client.
//!
//! - [`MockTransport`]: in-memory [`HttpTransport`](crate::transport::HttpTransport)
//!   with scripted replies and a request log
//! - fixtures for the service's JSON responses
//! - assertion helpers for recorded `/send` bodies
//!
//! ## Usage
//!
//! ```rust,ignore
//! use simplepush_lib::test_utils::{feedback_selected, send_ok, MockTransport};
//!
//! let transport = MockTransport::new();
//! transport.on_post("/send", send_ok(Some("abc")));
//! transport.on_get("/1/feedback/abc", feedback_selected("yes", 100, 90));
//!
//! let client = SimplepushClient::with_transport(ClientConfig::default(), transport.clone());
//! ```

mod assertions;
mod fixtures;
mod mock_transport;

pub use fixtures::{
    bad_request, feedback_failure, feedback_pending, feedback_selected, send_ok, send_status,
};

pub use mock_transport::{MockReply, MockTransport, RecordedRequest};

pub use assertions::{assert_encrypted_send, assert_plain_send, last_send_body};
