//! Bearer token extraction
//!
//! Pure header parsing. Whether the token is any good is decided by the
//! gateway against GitHub.

use axum::http::{header::AUTHORIZATION, HeaderMap};

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// Returns `None` when the header is absent, not valid UTF-8, uses another
/// scheme, or carries an empty token.
///
/// # Examples
///
/// ```
/// use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue};
/// use nmrl_common::api::bearer_token;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer gho_abc"));
/// assert_eq!(bearer_token(&headers), Some("gho_abc"));
/// ```
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}
