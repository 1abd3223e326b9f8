//! Feedback polling.
//!
//! After a send with feedback actions, the service returns a feedback id.
//! [`poll_feedback`] queries `GET /1/feedback/{id}` until the recipient picks
//! an action, the endpoint fails, or the timeout passes:
//!
//! ```text
//!            +---------+  action selected   +----------+
//!  start --> | POLLING | -----------------> | RESOLVED | --> callback
//!            +---------+                    +----------+
//!              |     |   error / success=false  +--------+
//!              |     +------------------------> | FAILED |
//!              |                                +--------+
//!              |   elapsed > timeout        +-----------+
//!              +--------------------------> | TIMED_OUT |
//!                                           +-----------+
//! ```
//!
//! The timeout is checked between polls, not enforced as a deadline, so a
//! poll may finish up to one sleep interval after it nominally expired.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::config::{ClientConfig, DEFAULT_FEEDBACK_TIMEOUT_SECS};
use crate::transport::{HttpResponse, HttpTransport};
use crate::{Result, SimplepushError};

/// Polls before the interval grows from 1 s to 3 s (about one minute).
pub const FAST_POLL_ITERATIONS: u32 = 60;

/// Polls before the interval grows from 3 s to 5 s (about ten more minutes).
pub const MEDIUM_POLL_ITERATIONS: u32 = 260;

/// Sleep before the next poll, given how many pending polls came before.
pub fn poll_interval(iteration: u32) -> Duration {
    if iteration < FAST_POLL_ITERATIONS {
        Duration::from_secs(1)
    } else if iteration < MEDIUM_POLL_ITERATIONS {
        Duration::from_secs(3)
    } else {
        Duration::from_secs(5)
    }
}

/// Body of `GET /1/feedback/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    /// Whether the service could look up the feedback id.
    pub success: bool,
    /// Label of the selected action, once there is one.
    #[serde(default)]
    pub action_selected: Option<String>,
    /// Unix time the action was selected.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub action_selected_at: Option<i64>,
    /// Unix time the notification was delivered.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub action_delivered_at: Option<i64>,
}

/// Read a unix timestamp from an integer, a float or a numeric string.
///
/// Anything else becomes `None`; a malformed timestamp never fails the record.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    })
}

impl FeedbackRecord {
    /// The selected action, ignoring empty labels.
    pub fn selected(&self) -> Option<&str> {
        self.action_selected.as_deref().filter(|a| !a.is_empty())
    }
}

/// The action a recipient picked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackAction {
    /// Label of the selected action.
    pub action_selected: String,
    /// Unix time the action was selected.
    pub action_selected_at: Option<i64>,
    /// Unix time the notification was delivered.
    pub action_delivered_at: Option<i64>,
    /// Feedback id the action belongs to.
    pub feedback_id: String,
}

impl FeedbackAction {
    /// Selection time as a UTC datetime.
    pub fn selected_at(&self) -> Option<DateTime<Utc>> {
        self.action_selected_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Delivery time as a UTC datetime.
    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.action_delivered_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}

/// Callback invoked once with the selected action.
pub type FeedbackCallback = Box<dyn FnOnce(FeedbackAction) + Send + 'static>;

/// What to do with a feedback id returned by a send.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use simplepush_lib::FeedbackHandler;
///
/// let handler = FeedbackHandler::new(|action| println!("picked {}", action.action_selected))
///     .with_timeout(Duration::from_secs(120));
/// assert_eq!(handler.timeout(), Some(Duration::from_secs(120)));
/// ```
pub struct FeedbackHandler {
    callback: FeedbackCallback,
    timeout: Option<Duration>,
}

impl FeedbackHandler {
    /// Handler with the default 60 second timeout.
    pub fn new(callback: impl FnOnce(FeedbackAction) + Send + 'static) -> Self {
        Self {
            callback: Box::new(callback),
            timeout: Some(Duration::from_secs(DEFAULT_FEEDBACK_TIMEOUT_SECS)),
        }
    }

    /// Give up after `timeout`. A zero duration disables the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Poll until an action is selected or the endpoint fails.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Configured timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl std::fmt::Debug for FeedbackHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackHandler")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Result of one poll.
#[derive(Debug)]
enum PollOutcome {
    Pending,
    Selected(FeedbackRecord),
    Failed(String),
}

fn evaluate(response: Result<HttpResponse>) -> PollOutcome {
    let response = match response {
        Ok(response) => response,
        Err(err) => return PollOutcome::Failed(err.to_string()),
    };

    if !response.is_success() {
        return PollOutcome::Failed(format!("HTTP {}", response.status));
    }

    let record: FeedbackRecord = match response.json() {
        Ok(record) => record,
        Err(err) => return PollOutcome::Failed(err.to_string()),
    };

    if !record.success {
        return PollOutcome::Failed("feedback endpoint reported success=false".to_string());
    }

    if record.selected().is_some() {
        PollOutcome::Selected(record)
    } else {
        PollOutcome::Pending
    }
}

/// Fetch the current feedback record once.
pub async fn fetch_feedback<T: HttpTransport + ?Sized>(
    transport: &T,
    config: &ClientConfig,
    feedback_id: &str,
) -> Result<FeedbackRecord> {
    let response = transport
        .get(&config.feedback_url(feedback_id))
        .await
        .map_err(|e| SimplepushError::feedback_failed(feedback_id, e.to_string()))?;

    if !response.is_success() {
        return Err(SimplepushError::feedback_failed(
            feedback_id,
            format!("HTTP {}", response.status),
        ));
    }

    response
        .json()
        .map_err(|e| SimplepushError::feedback_failed(feedback_id, e.to_string()))
}

/// Poll the feedback endpoint until an action is selected.
///
/// On success the handler's callback runs exactly once and the action is also
/// returned. Fails with [`SimplepushError::FeedbackActionError`] when a poll
/// fails and [`SimplepushError::FeedbackActionTimeout`] when the timeout
/// passes; the callback is not invoked in either case.
#[tracing::instrument(skip(transport, config, handler), fields(timeout = ?handler.timeout))]
pub async fn poll_feedback<T: HttpTransport + ?Sized>(
    transport: &T,
    config: &ClientConfig,
    feedback_id: &str,
    handler: FeedbackHandler,
) -> Result<FeedbackAction> {
    let url = config.feedback_url(feedback_id);
    let start = Instant::now();
    let mut iteration: u32 = 0;

    loop {
        match evaluate(transport.get(&url).await) {
            PollOutcome::Selected(record) => {
                let action = FeedbackAction {
                    action_selected: record.action_selected.unwrap_or_default(),
                    action_selected_at: record.action_selected_at,
                    action_delivered_at: record.action_delivered_at,
                    feedback_id: feedback_id.to_string(),
                };
                tracing::debug!(action = %action.action_selected, polls = iteration + 1, "feedback resolved");
                (handler.callback)(action.clone());
                return Ok(action);
            }
            PollOutcome::Failed(reason) => {
                tracing::warn!(%reason, "feedback poll failed");
                return Err(SimplepushError::feedback_failed(feedback_id, reason));
            }
            PollOutcome::Pending => {
                if let Some(timeout) = handler.timeout {
                    if start.elapsed() > timeout {
                        tracing::warn!(polls = iteration + 1, "feedback timed out");
                        return Err(SimplepushError::FeedbackActionTimeout {
                            feedback_id: feedback_id.to_string(),
                            timeout_secs: timeout.as_secs(),
                        });
                    }
                }

                let delay = poll_interval(iteration);
                tracing::debug!(iteration, ?delay, "feedback pending");
                tokio::time::sleep(delay).await;
                iteration = iteration.saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{feedback_failure, feedback_pending, feedback_selected, MockTransport};
    use std::sync::{Arc, Mutex};

    fn recording_handler() -> (FeedbackHandler, Arc<Mutex<Vec<FeedbackAction>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let handler = FeedbackHandler::new(move |action| sink.lock().unwrap().push(action));
        (handler, calls)
    }

    fn assert_virtual_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_secs(1),
            "elapsed {:?}, expected {:?}",
            elapsed,
            expected
        );
    }

    #[test]
    fn test_poll_interval_tiers() {
        assert_eq!(poll_interval(0), Duration::from_secs(1));
        assert_eq!(poll_interval(59), Duration::from_secs(1));
        assert_eq!(poll_interval(60), Duration::from_secs(3));
        assert_eq!(poll_interval(259), Duration::from_secs(3));
        assert_eq!(poll_interval(260), Duration::from_secs(5));
        assert_eq!(poll_interval(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_handler_timeout_options() {
        let handler = FeedbackHandler::new(|_| {});
        assert_eq!(handler.timeout(), Some(Duration::from_secs(60)));
        assert_eq!(handler.with_timeout(Duration::ZERO).timeout(), None);
        assert_eq!(FeedbackHandler::new(|_| {}).without_timeout().timeout(), None);
    }

    #[test]
    fn test_record_selected_ignores_empty() {
        let record = FeedbackRecord {
            success: true,
            action_selected: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(record.selected(), None);
    }

    #[test]
    fn test_action_datetimes() {
        let action = FeedbackAction {
            action_selected: "yes".into(),
            action_selected_at: Some(1_700_000_000),
            action_delivered_at: None,
            feedback_id: "abc".into(),
        };
        assert_eq!(action.selected_at().unwrap().timestamp(), 1_700_000_000);
        assert!(action.delivered_at().is_none());
    }

    #[tokio::test]
    async fn test_resolves_on_first_poll() {
        let transport = MockTransport::new();
        transport.on_get("/1/feedback/abc", feedback_selected("yes", 100, 90));
        let (handler, calls) = recording_handler();

        let action = poll_feedback(&transport, &ClientConfig::default(), "abc", handler)
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], action);
        assert_eq!(action.action_selected, "yes");
        assert_eq!(action.action_selected_at, Some(100));
        assert_eq!(action.action_delivered_at, Some(90));
        assert_eq!(action.feedback_id, "abc");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_selected() {
        let transport = MockTransport::new();
        transport.on_get("/1/feedback/abc", feedback_pending());
        transport.on_get("/1/feedback/abc", feedback_pending());
        transport.on_get("/1/feedback/abc", feedback_selected("no", 5, 1));
        let (handler, calls) = recording_handler();

        let start = Instant::now();
        poll_feedback(&transport, &ClientConfig::default(), "abc", handler)
            .await
            .unwrap();

        assert_eq!(transport.requests().len(), 3);
        assert_virtual_elapsed(start, Duration::from_secs(2));
        assert_eq!(calls.lock().unwrap()[0].action_selected, "no");
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_schedule_without_timeout() {
        let transport = MockTransport::new();
        for _ in 0..100 {
            transport.on_get("/1/feedback/slow", feedback_pending());
        }
        transport.on_get("/1/feedback/slow", feedback_selected("yes", 1, 1));
        let (handler, _calls) = recording_handler();

        let start = Instant::now();
        poll_feedback(
            &transport,
            &ClientConfig::default(),
            "slow",
            handler.without_timeout(),
        )
        .await
        .unwrap();

        // 60 polls at 1 s, then 40 at 3 s
        assert_virtual_elapsed(start, Duration::from_secs(60 + 40 * 3));
        assert_eq!(transport.requests().len(), 101);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_nothing_selected() {
        let transport = MockTransport::new();
        transport.on_get("/1/feedback/abc", feedback_pending());
        let (handler, calls) = recording_handler();

        let start = Instant::now();
        let err = poll_feedback(
            &transport,
            &ClientConfig::default(),
            "abc",
            handler.with_timeout(Duration::from_secs(10)),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            SimplepushError::FeedbackActionTimeout { ref feedback_id, timeout_secs: 10 } if feedback_id == "abc"
        ));
        // checked between polls, so overrun is at most one interval
        let elapsed = start.elapsed();
        assert!(elapsed > Duration::from_secs(10));
        assert!(elapsed < Duration::from_secs(12));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_odd_timestamps_still_resolve() {
        let transport = MockTransport::new();
        transport.on_get(
            "/1/feedback/abc",
            HttpResponse::json_ok(&serde_json::json!({
                "success": true,
                "action_selected": "yes",
                "action_selected_at": 1700000000.25,
                "action_delivered_at": "2024-01-01 00:00:00"
            })),
        );
        let (handler, calls) = recording_handler();

        let action = poll_feedback(&transport, &ClientConfig::default(), "abc", handler)
            .await
            .unwrap();

        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(action.action_selected, "yes");
        assert_eq!(action.action_selected_at, Some(1_700_000_000));
        assert_eq!(action.action_delivered_at, None);
    }

    #[test]
    fn test_record_timestamp_forms() {
        let record: FeedbackRecord = serde_json::from_str(
            r#"{"success":true,"action_selected_at":"42","action_delivered_at":{"t":1}}"#,
        )
        .unwrap();
        assert_eq!(record.action_selected_at, Some(42));
        assert_eq!(record.action_delivered_at, None);

        let record: FeedbackRecord =
            serde_json::from_str(r#"{"success":true,"action_selected_at":null}"#).unwrap();
        assert_eq!(record.action_selected_at, None);
    }

    #[tokio::test]
    async fn test_success_false_fails() {
        let transport = MockTransport::new();
        transport.on_get("/1/feedback/abc", feedback_failure());
        let (handler, calls) = recording_handler();

        let err = poll_feedback(&transport, &ClientConfig::default(), "abc", handler)
            .await
            .unwrap_err();

        assert!(matches!(err, SimplepushError::FeedbackActionError { .. }));
        assert_eq!(err.feedback_id(), Some("abc"));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_http_error_fails() {
        let transport = MockTransport::new();
        transport.on_get("/1/feedback/abc", HttpResponse::new(502, "bad gateway"));
        let (handler, _calls) = recording_handler();

        let err = poll_feedback(&transport, &ClientConfig::default(), "abc", handler)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[tokio::test]
    async fn test_transport_error_fails() {
        let transport = MockTransport::new();
        transport.fail_get("/1/feedback/abc", "connection reset");
        let (handler, _calls) = recording_handler();

        let err = poll_feedback(&transport, &ClientConfig::default(), "abc", handler)
            .await
            .unwrap_err();
        assert!(matches!(err, SimplepushError::FeedbackActionError { .. }));
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_fetch_feedback_once() {
        let transport = MockTransport::new();
        transport.on_get("/1/feedback/abc", feedback_pending());

        let record = fetch_feedback(&transport, &ClientConfig::default(), "abc")
            .await
            .unwrap();
        assert!(record.success);
        assert_eq!(record.selected(), None);
    }
}
