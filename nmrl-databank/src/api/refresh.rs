use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use nmrl_common::api::{bearer_token, ApiError, ApiResult};
use serde::Serialize;
use tracing::{error, info};

use crate::gateway::AdminCheckError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub status: String,
}

/// POST /refresh-databank-files
///
/// Admin only. Pulls the checkouts and rebuilds both cache files.
pub async fn refresh_databank_files(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<RefreshResponse>> {
    if bearer_token(&headers).is_none() {
        return Err(ApiError::Unauthorized("Missing token".to_string()));
    }
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    state.gateway.check_admin(authorization).await.map_err(|e| {
        error!("Admin check failed with error: {}", e);
        match e {
            AdminCheckError::Rejected { status, message } => ApiError::Upstream { status, message },
            AdminCheckError::Unreachable(_) => {
                ApiError::BadGateway("Could not reach admin-check service".to_string())
            }
            AdminCheckError::NotAuthorized => {
                ApiError::Forbidden("Insufficient privileges".to_string())
            }
        }
    })?;

    let report = state.refresher.refresh().await.map_err(|e| {
        error!("{}", e);
        ApiError::Internal(e.public_message().to_string())
    })?;

    info!(
        "Databank refreshed: {} molecules, {} with mapping files",
        report.molecules, report.mapped_molecules
    );
    Ok(Json(RefreshResponse {
        status: "success".to_string(),
    }))
}
