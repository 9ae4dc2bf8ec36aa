//! Portal login: wake-up check and OAuth code exchange

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Html,
    Json,
};
use nmrl_common::api::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::auth::login_has_push_access;
use crate::github::GitHubError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub authenticated: bool,
    pub token: String,
    pub username: String,
    pub admin_status: bool,
}

/// GET /awake
///
/// The portal front end pings this to spin the service up before login.
pub async fn awake() -> Html<&'static str> {
    Html("<h1> Server is awake!<h1>")
}

/// POST /verifyCode
///
/// Exchanges the OAuth code for a user token and reports whether the user
/// can push to the pull request target repository.
pub async fn verify_code(
    State(state): State<AppState>,
    body: Result<Json<VerifyCodeRequest>, JsonRejection>,
) -> ApiResult<Json<VerifyCodeResponse>> {
    let Json(request) = body.map_err(|e| {
        error!("Error parsing JSON: {}", e);
        ApiError::BadRequest("Error parsing JSON".to_string())
    })?;

    let code = request
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing code parameter".to_string()))?;

    let oauth = &state.config.oauth;
    let token = state
        .github
        .exchange_oauth_code(&oauth.client_id, oauth.client_secret.expose(), &code)
        .await
        .map_err(|e| match e {
            GitHubError::OAuthRejected(reason) => {
                info!("OAuth code rejected: {}", reason);
                ApiError::Unauthorized("Invalid or expired OAuth code".to_string())
            }
            other => {
                error!("OAuth exchange failed: {}", other);
                ApiError::BadGateway("GitHub OAuth exchange failed".to_string())
            }
        })?;

    let username = state
        .github
        .authenticated_user(&token)
        .await
        .map_err(|e| {
            error!("OAuth exchange or user fetch failed: {}", e);
            ApiError::BadGateway("GitHub OAuth exchange failed".to_string())
        })?
        .login;

    let admin_status = login_has_push_access(
        &state.github,
        &state.tokens,
        &state.config.target_repo,
        &username,
    )
    .await
    .map_err(|e| {
        error!("Error checking push access: {}", e);
        ApiError::Internal("Authorization service error".to_string())
    })?;

    info!("User {} logged in (admin: {})", username, admin_status);
    Ok(Json(VerifyCodeResponse {
        authenticated: true,
        token,
        username,
        admin_status,
    }))
}
