//! Cached molecule and mapping-file lists

use axum::{extract::State, Json};
use nmrl_common::api::{ApiError, ApiResult};
use nmrl_common::cache::{read_mapping_file, read_molecule_file, MappingIndex, MoleculeSets};
use std::path::PathBuf;
use tracing::error;

use crate::AppState;

/// GET /molecules
pub async fn list_molecules(State(state): State<AppState>) -> ApiResult<Json<MoleculeSets>> {
    let static_dir = state.refresher.static_dir().to_path_buf();
    read_cached(static_dir, read_molecule_file, "Molecule file not available").await
}

/// GET /mapping-files
pub async fn list_mappings(State(state): State<AppState>) -> ApiResult<Json<MappingIndex>> {
    let static_dir = state.refresher.static_dir().to_path_buf();
    read_cached(static_dir, read_mapping_file, "Mapping file not available").await
}

async fn read_cached<T, F>(static_dir: PathBuf, read: F, missing: &str) -> ApiResult<Json<T>>
where
    T: Send + 'static,
    F: FnOnce(&std::path::Path) -> nmrl_common::Result<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || read(&static_dir))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    match result {
        Ok(value) => Ok(Json(value)),
        Err(e) if e.is_not_found() => {
            error!("{}: {}", missing, e);
            Err(ApiError::NotFound(missing.to_string()))
        }
        Err(e) => {
            error!("Failed to read cache file: {}", e);
            Err(ApiError::from(e))
        }
    }
}
