//! Scripted in-memory transport.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::transport::{HttpResponse, HttpTransport};
use crate::{Result, SimplepushError};

/// What a scripted route answers with.
#[derive(Clone, Debug)]
pub enum MockReply {
    /// Complete the exchange with this response.
    Response(HttpResponse),
    /// Fail the exchange with [`SimplepushError::Transport`].
    TransportError(String),
}

impl From<HttpResponse> for MockReply {
    fn from(response: HttpResponse) -> Self {
        Self::Response(response)
    }
}

/// A request seen by [`MockTransport`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    /// `"GET"` or `"POST"`.
    pub method: &'static str,
    /// Full request URL.
    pub url: String,
    /// JSON body for POST requests.
    pub body: Option<Value>,
    /// Per-request timeout for POST requests.
    pub timeout: Option<Duration>,
}

/// In-memory transport keyed by method and URL path.
///
/// Replies queued for a route are served in order; the last one repeats
/// forever. Unscripted routes answer 404. Clones share state, so a test can
/// keep a handle after giving one to a client.
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<HashMap<(&'static str, String), VecDeque<MockReply>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    /// Create a transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `POST path`.
    pub fn on_post(&self, path: &str, reply: impl Into<MockReply>) {
        self.push("POST", path, reply.into());
    }

    /// Queue a reply for `GET path`.
    pub fn on_get(&self, path: &str, reply: impl Into<MockReply>) {
        self.push("GET", path, reply.into());
    }

    /// Queue a transport failure for `POST path`.
    pub fn fail_post(&self, path: &str, reason: &str) {
        self.push("POST", path, MockReply::TransportError(reason.to_string()));
    }

    /// Queue a transport failure for `GET path`.
    pub fn fail_get(&self, path: &str, reason: &str) {
        self.push("GET", path, MockReply::TransportError(reason.to_string()));
    }

    /// Every request so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose path equals `path`.
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| path_of(&r.url) == path)
            .collect()
    }

    fn push(&self, method: &'static str, path: &str, reply: MockReply) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    fn next_reply(&self, method: &'static str, url: &str) -> Option<MockReply> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(&(method, path_of(url).to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn answer(&self, request: RecordedRequest) -> Result<HttpResponse> {
        let reply = self.next_reply(request.method, &request.url);
        self.requests.lock().unwrap().push(request);

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::TransportError(reason)) => Err(SimplepushError::Transport(reason)),
            None => Ok(HttpResponse::new(404, "no mock route")),
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<HttpResponse> {
        self.answer(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            body: Some(body.clone()),
            timeout: Some(timeout),
        })
    }

    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.answer(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            body: None,
            timeout: None,
        })
    }
}

/// Path component of `url`, without scheme, authority or query.
fn path_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = rest.find('/').map_or("/", |i| &rest[i..]);
    path.split('?').next().unwrap_or(path)
}
