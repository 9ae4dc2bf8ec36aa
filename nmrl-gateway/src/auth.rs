//! Push-access authorization
//!
//! A user is a portal admin when they hold write (or better) permission
//! on the pull request target repository. The user's own OAuth token only
//! identifies them; the permission lookup runs with the App's installation
//! token for the target repository.

use tracing::info;

use crate::github::{GitHubClient, GitHubError, RepoName, TokenCache};

/// GitHub login behind a user token
///
/// `Ok(None)` when GitHub refuses the token (401): an expired or revoked
/// token identifies nobody. Other failures are errors.
pub async fn resolve_login(
    github: &GitHubClient,
    user_token: &str,
) -> Result<Option<String>, GitHubError> {
    match github.authenticated_user(user_token).await {
        Ok(user) => Ok(Some(user.login)),
        Err(GitHubError::Api { status: 401, .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Whether `login` may push to `target`
pub async fn login_has_push_access(
    github: &GitHubClient,
    tokens: &TokenCache,
    target: &RepoName,
    login: &str,
) -> Result<bool, GitHubError> {
    let permission = tokens
        .with_token(target, move |token| async move {
            github.collaborator_permission(&token, target, login).await
        })
        .await?;
    info!("User {} has permission {:?} on {}", login, permission, target);
    Ok(permission.can_push())
}

/// Whether the owner of `user_token` may push to `target`
pub async fn check_push_access(
    github: &GitHubClient,
    tokens: &TokenCache,
    target: &RepoName,
    user_token: &str,
) -> Result<bool, GitHubError> {
    match resolve_login(github, user_token).await? {
        Some(login) => login_has_push_access(github, tokens, target, &login).await,
        None => {
            info!("User token rejected by GitHub; treating as unauthorized");
            Ok(false)
        }
    }
}
