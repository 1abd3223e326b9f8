//! Canned service responses.

use serde_json::json;

use crate::transport::HttpResponse;

/// `/send` success envelope, with a feedback id when given.
pub fn send_ok(feedback_id: Option<&str>) -> HttpResponse {
    match feedback_id {
        Some(id) => HttpResponse::json_ok(&json!({"status": "OK", "feedbackId": id})),
        None => HttpResponse::json_ok(&json!({"status": "OK"})),
    }
}

/// `/send` envelope with an arbitrary HTTP status and service status.
pub fn send_status(http_status: u16, status: &str, message: Option<&str>) -> HttpResponse {
    let body = match message {
        Some(message) => json!({"status": status, "message": message}),
        None => json!({"status": status}),
    };
    HttpResponse::new(http_status, body.to_string())
}

/// The service's answer to an over-long title or message.
pub fn bad_request() -> HttpResponse {
    send_status(400, "BadRequest", Some("Title or message too long"))
}

/// Feedback record with no action selected yet.
pub fn feedback_pending() -> HttpResponse {
    HttpResponse::json_ok(&json!({
        "success": true,
        "action_selected": null,
        "action_selected_at": null,
        "action_delivered_at": null
    }))
}

/// Feedback record with `action` selected.
pub fn feedback_selected(action: &str, selected_at: i64, delivered_at: i64) -> HttpResponse {
    HttpResponse::json_ok(&json!({
        "success": true,
        "action_selected": action,
        "action_selected_at": selected_at,
        "action_delivered_at": delivered_at
    }))
}

/// Feedback lookup the service could not satisfy.
pub fn feedback_failure() -> HttpResponse {
    HttpResponse::json_ok(&json!({"success": false}))
}
