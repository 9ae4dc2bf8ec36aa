//! Info-file upload endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use nmrl_common::api::{bearer_token, ApiError, ApiResult};
use nmrl_common::time;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::auth::resolve_login;
use crate::github::GitHubError;
use crate::upload::{Submission, UploadWorkflow};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub pull_url: String,
}

/// POST /upload
///
/// Body is the info record plus the portal's `userName` and `branch`
/// fields; those two are stripped before validation and commit.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let token = bearer_token(&headers).ok_or_else(|| {
        ApiError::BadRequest("Missing or malformed Authorization header".to_string())
    })?;

    authorize_token(&state, token).await?;

    let mut record = parse_record(body)?;

    let github_login = match resolve_login(&state.github, token).await {
        Ok(Some(login)) => login,
        Ok(None) | Err(_) => {
            error!("Failed to fetch GitHub username from token");
            return Err(ApiError::BadGateway("Failed to verify GitHub user".to_string()));
        }
    };

    let user_name = take_string(&mut record, "userName");
    let requested_branch = take_string(&mut record, "branch");
    let (Some(user_name), Some(requested_branch)) = (user_name, requested_branch) else {
        return Err(ApiError::BadRequest("Missing userName or branch in JSON".to_string()));
    };

    let verdict = state.databank.validate_record(&record).await.map_err(|e| {
        error!("{}", e);
        ApiError::BadGateway("Validation service unavailable".to_string())
    })?;
    if let Some(reason) = verdict {
        return Err(ApiError::BadRequest(reason));
    }

    let submission = Submission {
        user_name,
        github_login,
        requested_branch,
        record,
    };
    let outcome = UploadWorkflow::new(&state.github, &state.tokens, &state.upload_target)
        .run(&submission, time::now())
        .await
        .map_err(|e| {
            match e.leftover_branch() {
                Some(branch) => error!("{} (branch {} left in place)", e, branch),
                None => error!("{}", e),
            }
            ApiError::Internal("Failed to write to repository".to_string())
        })?;

    info!(
        "Upload from {} committed {} and opened {}",
        submission.github_login, outcome.file_url, outcome.pull_url
    );
    Ok(Json(UploadResponse {
        message: "Uploaded!".to_string(),
        pull_url: outcome.pull_url,
    }))
}

/// Check the user token against the OAuth app
async fn authorize_token(state: &AppState, token: &str) -> ApiResult<()> {
    let oauth = &state.config.oauth;
    state
        .github
        .check_oauth_token(&oauth.client_id, oauth.client_secret.expose(), token)
        .await
        .map_err(|e| match e {
            GitHubError::Api { status: 404, .. } => {
                ApiError::NotFound("Token not found or invalid".to_string())
            }
            GitHubError::Api { status: 401, .. } => ApiError::Unauthorized(
                "Bad credentials (check client_id and client_secret)".to_string(),
            ),
            GitHubError::Api { status, message } => ApiError::Upstream {
                status,
                message: format!("Unexpected error: {}", message),
            },
            other => ApiError::Internal(other.to_string()),
        })
}

fn parse_record(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Map<String, Value>> {
    match body {
        Ok(Json(Value::Object(record))) => Ok(record),
        Ok(Json(_)) => Err(ApiError::BadRequest("Malformed or empty JSON body".to_string())),
        Err(JsonRejection::MissingJsonContentType(_)) => Err(ApiError::BadRequest(
            "Content-Type must be application/json".to_string(),
        )),
        Err(_) => Err(ApiError::BadRequest("Malformed or empty JSON body".to_string())),
    }
}

/// Remove `key` from the record, keeping it only if it is a non-empty string
fn take_string(record: &mut Map<String, Value>, key: &str) -> Option<String> {
    match record.remove(key)? {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}
