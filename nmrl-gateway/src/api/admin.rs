use axum::{extract::State, http::HeaderMap, Json};
use nmrl_common::api::{bearer_token, ApiError, ApiResult};
use serde::Serialize;
use tracing::error;

use crate::auth::check_push_access;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AdminCheckResponse {
    pub authorized: bool,
}

/// POST /user-admin-check
///
/// Admin panel gate, also called by the Databank API before a refresh.
pub async fn user_admin_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<AdminCheckResponse>> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing token".to_string()))?;

    let allowed = check_push_access(&state.github, &state.tokens, &state.config.target_repo, token)
        .await
        .map_err(|e| {
            error!("Admin check error: {}", e);
            ApiError::Internal("Authorization service error".to_string())
        })?;

    if !allowed {
        return Err(ApiError::Forbidden("Insufficient privileges".to_string()));
    }
    Ok(Json(AdminCheckResponse { authorized: true }))
}
