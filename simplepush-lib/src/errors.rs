//! Error types for Simplepush operations.
//!
//! Every fallible call in the crate returns [`SimplepushError`]. Each variant
//! maps to a stable [`SimplepushErrorCode`] so bindings can branch on numbers
//! instead of message text.

use std::fmt;

use crate::crypto::EncryptionError;

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SimplepushErrorCode {
    /// Required argument missing or empty
    InvalidArgument = 1000,
    /// Actions have the wrong shape
    MalformedActions = 1001,
    /// Service rejected the content as oversized
    BadRequest = 2000,
    /// Service answered with an unexpected status
    UnknownError = 2001,
    /// Feedback endpoint unreachable or reported failure
    FeedbackActionError = 3000,
    /// No action selected before the feedback timeout
    FeedbackActionTimeout = 3001,
    /// Transport/network layer error
    Transport = 4000,
    /// Connection failed
    ConnectionFailed = 4001,
    /// Connection timeout
    ConnectionTimeout = 4002,
    /// Non-success HTTP status
    HttpStatus = 4003,
    /// Serialization error
    Serialization = 5000,
    /// Payload encryption or decryption failed
    Encryption = 6000,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Comprehensive error type for Simplepush operations.
#[derive(Debug)]
pub enum SimplepushError {
    /// A required argument was missing or empty.
    InvalidArgument {
        /// Argument name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Actions were not a homogeneous list of labels or `{name, url}` objects.
    MalformedActions(String),

    /// The service considered title or message too long.
    BadRequest(String),

    /// The service answered with a status other than `OK`.
    UnknownError {
        /// Status string from the response envelope
        status: String,
        /// Optional detail message from the envelope
        message: Option<String>,
    },

    /// The feedback endpoint could not be reached or reported failure.
    FeedbackActionError {
        /// Feedback identifier being polled
        feedback_id: String,
        /// Underlying reason
        reason: String,
    },

    /// No action was selected within the feedback timeout.
    FeedbackActionTimeout {
        /// Feedback identifier being polled
        feedback_id: String,
        /// Configured timeout in seconds
        timeout_secs: u64,
    },

    /// Transport/network layer error.
    Transport(String),

    /// Connection failed.
    ConnectionFailed {
        /// Target endpoint or service
        target: String,
        /// Underlying error message
        reason: String,
    },

    /// Connection timeout.
    ConnectionTimeout {
        /// Operation that timed out
        operation: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// The service answered with a non-success HTTP status and no usable envelope.
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// Serialization/deserialization error.
    Serialization(String),

    /// Payload encryption or decryption failed.
    Encryption(EncryptionError),

    /// Internal/unexpected error.
    Internal(String),
}

impl SimplepushError {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> SimplepushErrorCode {
        match self {
            Self::InvalidArgument { .. } => SimplepushErrorCode::InvalidArgument,
            Self::MalformedActions(_) => SimplepushErrorCode::MalformedActions,
            Self::BadRequest(_) => SimplepushErrorCode::BadRequest,
            Self::UnknownError { .. } => SimplepushErrorCode::UnknownError,
            Self::FeedbackActionError { .. } => SimplepushErrorCode::FeedbackActionError,
            Self::FeedbackActionTimeout { .. } => SimplepushErrorCode::FeedbackActionTimeout,
            Self::Transport(_) => SimplepushErrorCode::Transport,
            Self::ConnectionFailed { .. } => SimplepushErrorCode::ConnectionFailed,
            Self::ConnectionTimeout { .. } => SimplepushErrorCode::ConnectionTimeout,
            Self::HttpStatus { .. } => SimplepushErrorCode::HttpStatus,
            Self::Serialization(_) => SimplepushErrorCode::Serialization,
            Self::Encryption(_) => SimplepushErrorCode::Encryption,
            Self::Internal(_) => SimplepushErrorCode::Internal,
        }
    }

    /// Get the error message as an owned String (useful for FFI).
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Returns true if this error is potentially recoverable by retrying.
    ///
    /// Nothing in this crate retries automatically; the flag is for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::ConnectionFailed { .. } | Self::ConnectionTimeout { .. } => {
                true
            }
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// The feedback identifier this error refers to, if any.
    pub fn feedback_id(&self) -> Option<&str> {
        match self {
            Self::FeedbackActionError { feedback_id, .. }
            | Self::FeedbackActionTimeout { feedback_id, .. } => Some(feedback_id),
            _ => None,
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a feedback failure for `feedback_id`.
    pub fn feedback_failed(feedback_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FeedbackActionError {
            feedback_id: feedback_id.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SimplepushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { field, reason } => {
                write!(f, "invalid argument {}: {}", field, reason)
            }
            Self::MalformedActions(msg) => write!(f, "actions malformed: {}", msg),
            Self::BadRequest(msg) => write!(f, "bad request: {}", msg),
            Self::UnknownError { status, message } => match message {
                Some(message) => write!(f, "unexpected service status {}: {}", status, message),
                None => write!(f, "unexpected service status {}", status),
            },
            Self::FeedbackActionError {
                feedback_id,
                reason,
            } => {
                write!(
                    f,
                    "failed to reach feedback API (feedback action ID: {}): {}",
                    feedback_id, reason
                )
            }
            Self::FeedbackActionTimeout {
                feedback_id,
                timeout_secs,
            } => {
                write!(
                    f,
                    "feedback action ID {} timed out after {}s",
                    feedback_id, timeout_secs
                )
            }
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::ConnectionFailed { target, reason } => {
                write!(f, "connection to {} failed: {}", target, reason)
            }
            Self::ConnectionTimeout {
                operation,
                timeout_ms,
            } => {
                write!(f, "{} timed out after {}ms", operation, timeout_ms)
            }
            Self::HttpStatus { status, body } => {
                write!(f, "request failed with HTTP {}: {}", status, body)
            }
            Self::Serialization(msg) => write!(f, "serialization error: {}", msg),
            Self::Encryption(err) => write!(f, "encryption error: {}", err),
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for SimplepushError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encryption(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SimplepushError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<EncryptionError> for SimplepushError {
    fn from(err: EncryptionError) -> Self {
        Self::Encryption(err)
    }
}
