use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use nmrl_common::api::{ApiError, ApiResult};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ValidResponse {
    pub valid: bool,
}

/// POST /info-valid-check
pub async fn info_valid_check(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<ValidResponse>> {
    let record = match body {
        Ok(Json(record)) if record.as_object().is_some_and(|m| !m.is_empty()) => record,
        _ => return Err(ApiError::BadRequest("Invalid or missing JSON payload".to_string())),
    };

    let catalog = state.refresher.catalog().await.ok_or_else(|| {
        error!("Validation requested before the molecule catalog was built");
        ApiError::Internal("Molecule catalog not available".to_string())
    })?;

    state.validator.validate(&record, &catalog).map_err(|e| {
        error!("Validation failed: {}", e);
        ApiError::BadRequest(e.to_string())
    })?;

    Ok(Json(ValidResponse { valid: true }))
}
