//! GitHub REST integration
//!
//! - [`client`]: typed wrapper over the handful of endpoints the gateway uses
//! - [`app_auth`]: GitHub App JWTs and the per-repository installation token cache
//! - [`types`]: request/response payloads and [`RepoName`]

pub mod app_auth;
pub mod client;
pub mod types;

pub use app_auth::{AppCredentials, InstallationToken, TokenCache};
pub use client::{GitHubClient, GitHubError};
pub use types::{Permission, RepoName};
