//! nmrl-gateway library - GitHub gateway for the NMRlipids upload portal
//!
//! Holds every GitHub credential the portal uses: the OAuth app that logs
//! users in and the GitHub App that commits uploads and opens pull requests.

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod auth;
pub mod config;
pub mod databank;
pub mod github;
pub mod upload;

use config::GatewayConfig;
use databank::DatabankClient;
use github::{AppCredentials, GitHubClient, TokenCache};
use upload::UploadTarget;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub github: GitHubClient,
    /// Installation tokens for the work and target repositories
    pub tokens: Arc<TokenCache>,
    pub databank: DatabankClient,
    pub upload_target: Arc<UploadTarget>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Build clients from resolved configuration
    pub fn new(config: GatewayConfig) -> nmrl_common::Result<Self> {
        let github = GitHubClient::with_base_urls(
            config.github_api_url.as_str(),
            config.github_web_url.as_str(),
            config.timeout,
        )
        .map_err(|e| nmrl_common::Error::Config(e.to_string()))?;

        let credentials = AppCredentials::from_pem(config.app_id, config.app_private_key.expose())
            .map_err(|e| nmrl_common::Error::Config(e.to_string()))?;

        let databank = DatabankClient::new(config.databank_url.as_str(), config.timeout)
            .map_err(|e| nmrl_common::Error::Config(e.to_string()))?;

        let upload_target = UploadTarget {
            work_repo: config.work_repo.clone(),
            target_repo: config.target_repo.clone(),
            base_branch: config.base_branch.clone(),
        };

        Ok(Self {
            tokens: Arc::new(TokenCache::new(github.clone(), credentials)),
            github,
            databank,
            upload_target: Arc::new(upload_target),
            config: Arc::new(config),
            startup_time: nmrl_common::time::now(),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/awake", get(api::awake))
        .route("/verifyCode", post(api::verify_code))
        .route("/user-admin-check", post(api::user_admin_check))
        .route("/upload", post(api::upload))
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
