//! GitHub REST API client
//!
//! One method per endpoint. Authentication is passed per call because the
//! gateway talks to GitHub as three different principals: the OAuth app
//! (basic auth), the signed-in user (OAuth token) and the GitHub App
//! (JWT or installation token).

use base64::Engine;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::types::{
    AccessTokenResponse, Branch, CollaboratorPermission, CreatedFile, FileCommitResponse,
    GitHubErrorBody, GitHubUser, Installation, NewFile, NewPullRequest, NewRef,
    OAuthTokenResponse, Permission, PullRequest, RepoName,
};

pub const GITHUB_API_URL: &str = "https://api.github.com";
pub const GITHUB_WEB_URL: &str = "https://github.com";
const USER_AGENT: &str = concat!("nmrl-gateway/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// GitHub client errors
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("GitHub API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    /// The OAuth code exchange was refused (bad or expired code)
    #[error("OAuth exchange rejected: {0}")]
    OAuthRejected(String),

    #[error("GitHub App authentication error: {0}")]
    AppAuth(String),
}

impl GitHubError {
    /// HTTP status GitHub answered with, if it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// GitHub REST client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    web_base: String,
}

impl GitHubClient {
    /// Client against the public GitHub endpoints
    pub fn new() -> Result<Self, GitHubError> {
        Self::with_base_urls(GITHUB_API_URL, GITHUB_WEB_URL, DEFAULT_TIMEOUT)
    }

    /// Client against custom endpoints (GitHub Enterprise, tests)
    pub fn with_base_urls(
        api_base: impl Into<String>,
        web_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GitHubError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            web_base: web_base.into().trim_end_matches('/').to_string(),
        })
    }

    // ------------------------------------------------------------------
    // OAuth app
    // ------------------------------------------------------------------

    /// Exchange an OAuth authorization code for a user access token
    pub async fn exchange_oauth_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<String, GitHubError> {
        let url = format!("{}/login/oauth/access_token", self.web_base);
        let response: OAuthTokenResponse = self
            .send_json(
                self.http
                    .post(&url)
                    .header("Accept", "application/json")
                    .form(&[
                        ("client_id", client_id),
                        ("client_secret", client_secret),
                        ("code", code),
                    ]),
            )
            .await?;

        if let Some(token) = response.access_token.filter(|t| !t.is_empty()) {
            return Ok(token);
        }

        Err(GitHubError::OAuthRejected(
            response
                .error_description
                .or(response.error)
                .unwrap_or_else(|| "no access token in response".to_string()),
        ))
    }

    /// Check that `access_token` was issued by this OAuth app and is still live
    ///
    /// GitHub answers 200 for a valid token and 404 for an unknown one.
    pub async fn check_oauth_token(
        &self,
        client_id: &str,
        client_secret: &str,
        access_token: &str,
    ) -> Result<(), GitHubError> {
        let url = format!("{}/applications/{}/token", self.api_base, client_id);
        self.send(
            self.api(self.http.post(&url))
                .basic_auth(client_id, Some(client_secret))
                .json(&json!({ "access_token": access_token })),
        )
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users and permissions
    // ------------------------------------------------------------------

    /// The user the token belongs to
    pub async fn authenticated_user(&self, token: &str) -> Result<GitHubUser, GitHubError> {
        let url = format!("{}/user", self.api_base);
        self.send_json(self.api(self.http.get(&url)).bearer_auth(token))
            .await
    }

    /// Permission level of `username` on `repo`
    ///
    /// A user who isn't a collaborator at all (404) has [`Permission::None`].
    pub async fn collaborator_permission(
        &self,
        token: &str,
        repo: &RepoName,
        username: &str,
    ) -> Result<Permission, GitHubError> {
        let url = format!(
            "{}/repos/{}/collaborators/{}/permission",
            self.api_base, repo, username
        );
        match self
            .send_json::<CollaboratorPermission>(self.api(self.http.get(&url)).bearer_auth(token))
            .await
        {
            Ok(body) => Ok(body.permission),
            Err(GitHubError::Api { status: 404, .. }) => Ok(Permission::None),
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // Branches, refs, contents, pull requests
    // ------------------------------------------------------------------

    /// Fast-forward a fork's branch to its upstream
    pub async fn merge_upstream(
        &self,
        token: &str,
        repo: &RepoName,
        branch: &str,
    ) -> Result<(), GitHubError> {
        let url = format!("{}/repos/{}/merge-upstream", self.api_base, repo);
        self.send(
            self.api(self.http.post(&url))
                .bearer_auth(token)
                .json(&json!({ "branch": branch })),
        )
        .await?;
        Ok(())
    }

    /// Commit SHA at the tip of `branch`
    pub async fn branch_head_sha(
        &self,
        token: &str,
        repo: &RepoName,
        branch: &str,
    ) -> Result<String, GitHubError> {
        let url = format!("{}/repos/{}/branches/{}", self.api_base, repo, branch);
        let branch: Branch = self
            .send_json(self.api(self.http.get(&url)).bearer_auth(token))
            .await?;
        Ok(branch.commit.sha)
    }

    /// Create `refs/heads/<branch>` pointing at `sha`
    pub async fn create_ref(
        &self,
        token: &str,
        repo: &RepoName,
        branch: &str,
        sha: &str,
    ) -> Result<(), GitHubError> {
        let url = format!("{}/repos/{}/git/refs", self.api_base, repo);
        let body = NewRef {
            git_ref: format!("refs/heads/{}", branch),
            sha,
        };
        self.send(self.api(self.http.post(&url)).bearer_auth(token).json(&body))
            .await?;
        Ok(())
    }

    /// Delete `refs/heads/<branch>`
    pub async fn delete_ref(
        &self,
        token: &str,
        repo: &RepoName,
        branch: &str,
    ) -> Result<(), GitHubError> {
        let url = format!("{}/repos/{}/git/refs/heads/{}", self.api_base, repo, branch);
        self.send(self.api(self.http.delete(&url)).bearer_auth(token))
            .await?;
        Ok(())
    }

    /// Create a new file on `branch`
    pub async fn create_file(
        &self,
        token: &str,
        repo: &RepoName,
        path: &str,
        message: &str,
        content: &[u8],
        branch: &str,
    ) -> Result<CreatedFile, GitHubError> {
        let url = format!("{}/repos/{}/contents/{}", self.api_base, repo, path);
        let body = NewFile {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content),
            branch,
        };
        let response: FileCommitResponse = self
            .send_json(self.api(self.http.put(&url)).bearer_auth(token).json(&body))
            .await?;
        debug!(path = %response.content.path, "File committed");
        Ok(CreatedFile {
            html_url: response.content.html_url,
            commit_sha: response.commit.sha,
        })
    }

    /// Open a pull request on `repo`
    pub async fn create_pull_request(
        &self,
        token: &str,
        repo: &RepoName,
        pull: &NewPullRequest,
    ) -> Result<PullRequest, GitHubError> {
        let url = format!("{}/repos/{}/pulls", self.api_base, repo);
        self.send_json(self.api(self.http.post(&url)).bearer_auth(token).json(pull))
            .await
    }

    // ------------------------------------------------------------------
    // GitHub App
    // ------------------------------------------------------------------

    /// The App installation covering `repo` (authenticated with the App JWT)
    pub async fn repo_installation(
        &self,
        app_jwt: &str,
        repo: &RepoName,
    ) -> Result<Installation, GitHubError> {
        let url = format!("{}/repos/{}/installation", self.api_base, repo);
        self.send_json(self.api(self.http.get(&url)).bearer_auth(app_jwt))
            .await
    }

    /// Mint an installation access token (authenticated with the App JWT)
    pub async fn create_installation_token(
        &self,
        app_jwt: &str,
        installation_id: u64,
    ) -> Result<AccessTokenResponse, GitHubError> {
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base, installation_id
        );
        self.send_json(self.api(self.http.post(&url)).bearer_auth(app_jwt))
            .await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn api(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GitHubError> {
        let response = request
            .send()
            .await
            .map_err(|e| GitHubError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(GitHubError::Api {
            status: status.as_u16(),
            message: error_message(status, &text),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GitHubError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| GitHubError::Parse(e.to_string()))
    }
}

/// GitHub's `message` field if the body has one, else the raw body
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<GitHubErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}
