//! Shared API request/response types

use serde::{Deserialize, Serialize};

/// Error response body
///
/// `status` is optional on the way in so bodies from older deployments
/// (`{"error": "..."}` only) still parse.
///
/// # Examples
///
/// ```
/// use nmrl_common::api::ErrorEnvelope;
///
/// let body: ErrorEnvelope = serde_json::from_str(r#"{"error": "Missing token"}"#).unwrap();
/// assert_eq!(body.error, "Missing token");
/// assert_eq!(body.status, None);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// Human-readable error message
    pub error: String,
    /// HTTP status code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorEnvelope {
    /// Parse an error body, falling back to the raw text when it isn't an envelope
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| ErrorEnvelope {
            error: body.trim().to_string(),
            status: None,
        })
    }
}
