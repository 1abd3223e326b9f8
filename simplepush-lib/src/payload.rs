//! Notification requests and the `/send` body built from them.

use serde::{Deserialize, Serialize};

use crate::actions::{validate_actions, Actions};
use crate::crypto::{self, IV_SIZE};
use crate::{Result, SimplepushError};

/// A notification to deliver to one Simplepush key.
///
/// # Example
///
/// ```
/// use simplepush_lib::{Actions, Notification};
///
/// let notification = Notification::new("HuxgBB", "Backup finished")
///     .title("nightly")
///     .event("backups")
///     .actions(Actions::labels(["ok", "retry"]));
/// assert_eq!(notification.title.as_deref(), Some("nightly"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Recipient key.
    pub key: String,
    /// Message body.
    pub message: String,
    /// Optional title.
    #[serde(default)]
    pub title: Option<String>,
    /// Optional event tag used for routing on the device.
    #[serde(default)]
    pub event: Option<String>,
    /// Optional interactive actions.
    #[serde(default)]
    pub actions: Option<Actions>,
}

impl Notification {
    /// Create a notification with the required fields.
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the event tag.
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Attach actions.
    pub fn actions(mut self, actions: Actions) -> Self {
        self.actions = Some(actions);
        self
    }

    /// Check required fields and action shape.
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(SimplepushError::invalid_argument("key", "must be set"));
        }
        if self.message.is_empty() {
            return Err(SimplepushError::invalid_argument("message", "must be set"));
        }
        if let Some(actions) = &self.actions {
            validate_actions(Some(&actions.to_value()))?;
        }
        Ok(())
    }
}

/// Password (and optional salt) for an encrypted send.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encryption {
    /// Password configured in the Simplepush app.
    pub password: String,
    /// Salt configured in the app. `None` selects the legacy salt.
    #[serde(default)]
    pub salt: Option<String>,
}

impl Encryption {
    /// Encrypt with `password` and the legacy salt.
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            salt: None,
        }
    }

    /// Use an explicit salt.
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Check that a password is present.
    pub fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            return Err(SimplepushError::invalid_argument("password", "must be set"));
        }
        Ok(())
    }

    /// Derive the payload key.
    pub fn key(&self) -> crypto::EncryptionKey {
        crypto::derive_key(&self.password, self.salt.as_deref())
    }
}

impl std::fmt::Debug for Encryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encryption")
            .field("password", &"<redacted>")
            .field("salt", &self.salt)
            .finish()
    }
}

/// JSON body of `POST /send`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPayload {
    /// Recipient key.
    pub key: String,
    /// Message, ciphertext when `encrypted` is set.
    pub msg: String,
    /// Title, ciphertext when `encrypted` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Event tag, never encrypted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// `"true"` for encrypted payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<String>,
    /// Uppercase hex IV shared by every encrypted field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    /// Actions, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Actions>,
}

impl SendPayload {
    /// True when title and message are ciphertext.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted.as_deref() == Some("true")
    }
}

/// Build the `/send` body, generating a fresh IV when encrypting.
pub fn build_payload(notification: &Notification, encryption: Option<&Encryption>) -> Result<SendPayload> {
    build_payload_with_iv(notification, encryption, crypto::generate_iv())
}

/// Build the `/send` body with a caller-chosen IV.
///
/// The IV is ignored for plain payloads. Reusing an IV across requests leaks
/// equality of message prefixes; use [`build_payload`] outside tests.
pub fn build_payload_with_iv(
    notification: &Notification,
    encryption: Option<&Encryption>,
    iv: [u8; IV_SIZE],
) -> Result<SendPayload> {
    notification.validate()?;

    let title = notification.title.clone().filter(|t| !t.is_empty());
    let event = notification.event.clone().filter(|e| !e.is_empty());
    let actions = notification.actions.clone().filter(|a| !a.is_empty());

    let Some(encryption) = encryption else {
        return Ok(SendPayload {
            key: notification.key.clone(),
            msg: notification.message.clone(),
            title,
            event,
            encrypted: None,
            iv: None,
            actions,
        });
    };

    encryption.validate()?;
    let key = encryption.key();

    Ok(SendPayload {
        key: notification.key.clone(),
        msg: crypto::encrypt(&key, &iv, &notification.message),
        title: title.map(|t| crypto::encrypt(&key, &iv, &t)),
        event,
        encrypted: Some("true".to_string()),
        iv: Some(crypto::iv_to_hex(&iv)),
        actions,
    })
}
