//! nmrl-databank library - Databank API for the NMRlipids upload portal
//!
//! Serves the molecule and mapping-file lists built from local Databank
//! checkouts and validates info files before the gateway commits them.

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod gateway;
pub mod refresh;
pub mod validation;

use config::DatabankConfig;
use gateway::GatewayClient;
use refresh::Refresher;
use validation::InfoValidator;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub refresher: Arc<Refresher>,
    pub validator: Arc<InfoValidator>,
    /// Admin checks for the refresh endpoint
    pub gateway: GatewayClient,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(refresher: Arc<Refresher>, validator: InfoValidator, gateway: GatewayClient) -> Self {
        Self {
            refresher,
            validator: Arc::new(validator),
            gateway,
            startup_time: nmrl_common::time::now(),
        }
    }

    /// Build state from resolved configuration
    pub fn from_config(config: &DatabankConfig) -> nmrl_common::Result<Self> {
        let validator = InfoValidator::load(config.schema_path.as_deref())
            .map_err(|e| nmrl_common::Error::Config(e.to_string()))?;
        let gateway = GatewayClient::new(config.gateway_url.as_str(), config.timeout)
            .map_err(|e| nmrl_common::Error::Config(e.to_string()))?;
        Ok(Self::new(Arc::new(Refresher::from_config(config)), validator, gateway))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/molecules", get(api::list_molecules))
        .route("/mapping-files", get(api::list_mappings))
        .route("/refresh-databank-files", post(api::refresh_databank_files))
        .route("/info-valid-check", post(api::info_valid_check))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
