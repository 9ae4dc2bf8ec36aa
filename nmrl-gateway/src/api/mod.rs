//! HTTP API handlers for nmrl-gateway

pub mod admin;
pub mod health;
pub mod oauth;
pub mod upload;

pub use admin::user_admin_check;
pub use health::health_routes;
pub use oauth::{awake, verify_code};
pub use upload::upload;
