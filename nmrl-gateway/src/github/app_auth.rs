//! GitHub App authentication and installation token cache
//!
//! Installation tokens live for one hour. Each repository the gateway acts
//! on gets its own cache slot; a token is reused until it is within
//! [`EXPIRY_BUFFER_SECS`] of expiring, then a new one is minted with a
//! fresh App JWT.
//!
//! Each slot sits behind its own async mutex that is held across minting,
//! so concurrent requests for the same repository wait for one mint
//! instead of each minting their own.
//!
//! [`TokenCache::with_token`] drops a token GitHub answers 401 to and
//! retries once with a new one, so a reinstalled App or a revoked token
//! does not keep failing until the cached expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::client::{GitHubClient, GitHubError};
use super::types::RepoName;

/// Refresh installation tokens this long before GitHub expires them
pub const EXPIRY_BUFFER_SECS: i64 = 5 * 60;

/// App JWT lifetime (GitHub caps it at 10 minutes)
const APP_JWT_LIFETIME_SECS: i64 = 9 * 60;

/// Backdate `iat` to absorb clock drift between us and GitHub
const APP_JWT_BACKDATE_SECS: i64 = 60;

#[derive(Debug, Serialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

/// GitHub App identity: numeric id plus RSA private key
#[derive(Clone)]
pub struct AppCredentials {
    app_id: u64,
    key: EncodingKey,
}

impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

impl AppCredentials {
    /// Parse the App's PEM private key (PKCS#1 or PKCS#8)
    pub fn from_pem(app_id: u64, pem: &str) -> Result<Self, GitHubError> {
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| GitHubError::AppAuth(format!("invalid private key: {}", e)))?;
        Ok(Self { app_id, key })
    }

    /// Sign an App JWT valid from `now`
    pub fn jwt(&self, now: DateTime<Utc>) -> Result<String, GitHubError> {
        let claims = AppClaims {
            iat: now.timestamp() - APP_JWT_BACKDATE_SECS,
            exp: now.timestamp() + APP_JWT_LIFETIME_SECS,
            iss: self.app_id.to_string(),
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| GitHubError::AppAuth(format!("failed to sign JWT: {}", e)))
    }
}

/// An installation access token and its expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl InstallationToken {
    /// Still usable at `now` with the expiry buffer applied
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_BUFFER_SECS) < self.expires_at
    }

    /// Time left before GitHub expires the token
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }
}

type Slot = Arc<Mutex<Option<InstallationToken>>>;

/// Per-repository installation token cache
pub struct TokenCache {
    github: GitHubClient,
    credentials: AppCredentials,
    slots: Mutex<HashMap<RepoName, Slot>>,
}

impl TokenCache {
    pub fn new(github: GitHubClient, credentials: AppCredentials) -> Self {
        Self {
            github,
            credentials,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Installation token for `repo`, minting one if absent or near expiry
    pub async fn token_for(&self, repo: &RepoName) -> Result<String, GitHubError> {
        let slot = self.slot(repo).await;
        let mut cached = slot.lock().await;
        let now = nmrl_common::time::now();

        if let Some(token) = cached.as_ref() {
            if token.is_fresh(now) {
                info!(
                    "Reusing cached token for {}. Remaining lifetime: {}s",
                    repo,
                    token.remaining(now).num_seconds()
                );
                return Ok(token.token.clone());
            }
        }

        let minted = self.mint(repo, now).await?;
        info!("Refreshed token for {}", repo);
        let token = minted.token.clone();
        *cached = Some(minted);
        Ok(token)
    }

    /// Run `op` with the installation token for `repo`
    ///
    /// On a 401 the token is dropped from the cache and `op` runs once more
    /// with a newly minted one; a second 401 is returned as is.
    pub async fn with_token<T, F, Fut>(&self, repo: &RepoName, op: F) -> Result<T, GitHubError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, GitHubError>>,
    {
        let token = self.token_for(repo).await?;
        match op(token.clone()).await {
            Err(GitHubError::Api { status: 401, .. }) => {
                warn!("Installation token for {} rejected by GitHub; minting a new one", repo);
                self.discard(repo, &token).await;
                let token = self.token_for(repo).await?;
                op(token).await
            }
            other => other,
        }
    }

    /// Drop `rejected` from the cache unless another request already replaced it
    async fn discard(&self, repo: &RepoName, rejected: &str) {
        let slot = self.slot(repo).await;
        let mut cached = slot.lock().await;
        if cached.as_ref().is_some_and(|t| t.token == rejected) {
            *cached = None;
        }
    }

    async fn slot(&self, repo: &RepoName) -> Slot {
        let mut slots = self.slots.lock().await;
        slots.entry(repo.clone()).or_default().clone()
    }

    async fn mint(&self, repo: &RepoName, now: DateTime<Utc>) -> Result<InstallationToken, GitHubError> {
        let jwt = self.credentials.jwt(now)?;
        let installation = self.github.repo_installation(&jwt, repo).await?;
        let response = self
            .github
            .create_installation_token(&jwt, installation.id)
            .await?;
        Ok(InstallationToken {
            token: response.token,
            expires_at: response.expires_at,
        })
    }
}
