//! API module for shared HTTP API functionality
//!
//! Both services answer with the same envelope: the payload itself on
//! success, `{"error": ..., "status": ...}` on failure.

pub mod auth;
pub mod response;
pub mod types;

pub use auth::bearer_token;
pub use response::{ApiError, ApiResult};
pub use types::ErrorEnvelope;
