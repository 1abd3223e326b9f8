//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use simplepush_lib::prelude::*;
//! ```

// Requests
pub use crate::actions::Actions;
pub use crate::payload::{Encryption, Notification};

// Client
pub use crate::client::SimplepushClient;
pub use crate::config::ClientConfig;
pub use crate::feedback::{FeedbackAction, FeedbackHandler};

// Error handling
pub use crate::errors::{SimplepushError, SimplepushErrorCode};
pub use crate::Result;

// Transport
pub use crate::transport::{HttpResponse, HttpTransport};
