//! Assertions over recorded `/send` requests.

use serde_json::Value;

use super::MockTransport;
use crate::config::SEND_PATH;

/// Body of the most recent `/send` request.
///
/// # Panics
/// Panics if nothing was sent.
pub fn last_send_body(transport: &MockTransport) -> Value {
    transport
        .requests_to(SEND_PATH)
        .pop()
        .and_then(|r| r.body)
        .unwrap_or_else(|| panic!("no /send request recorded"))
}

/// Assert the last send was plain with the given key and message.
///
/// # Panics
/// Panics on mismatch or if the body carries encryption fields.
pub fn assert_plain_send(transport: &MockTransport, key: &str, msg: &str) {
    let body = last_send_body(transport);
    assert_eq!(body["key"], key, "unexpected key in {}", body);
    assert_eq!(body["msg"], msg, "unexpected msg in {}", body);
    assert!(body.get("encrypted").is_none(), "plain send carried encrypted: {}", body);
    assert!(body.get("iv").is_none(), "plain send carried iv: {}", body);
}

/// Assert the last send was encrypted and return its IV hex.
///
/// # Panics
/// Panics if `encrypted` is not `"true"` or the IV is not 32 uppercase hex digits.
pub fn assert_encrypted_send(transport: &MockTransport) -> String {
    let body = last_send_body(transport);
    assert_eq!(body["encrypted"], "true", "send was not encrypted: {}", body);

    let iv = body["iv"]
        .as_str()
        .unwrap_or_else(|| panic!("encrypted send without iv: {}", body))
        .to_string();
    assert_eq!(iv.len(), 32, "iv should be 32 hex digits: {}", iv);
    assert!(
        iv.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)),
        "iv should be uppercase hex: {}",
        iv
    );
    iv
}
