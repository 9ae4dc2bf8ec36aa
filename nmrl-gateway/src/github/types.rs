//! GitHub payload types (subset of fields we care about)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `owner/name` repository identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl RepoName {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl FromStr for RepoName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("expected owner/name, got {:?}", s))?;
        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !valid(owner) || !valid(name) {
            return Err(format!("expected owner/name, got {:?}", s));
        }
        Ok(Self::new(owner, name))
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Response from `https://github.com/login/oauth/access_token`
///
/// GitHub answers 200 even for a bad code; the failure is in `error`.
#[derive(Debug, Deserialize)]
pub struct OAuthTokenResponse {
    pub access_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// `GET /user`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

/// Collaborator permission level on a repository
///
/// GitHub's `permission` field reports `admin`, `write`, `read` or `none`;
/// custom roles may surface `maintain`/`triage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Admin,
    Maintain,
    Write,
    Triage,
    Read,
    #[serde(other)]
    None,
}

impl Permission {
    /// Write access or better
    pub fn can_push(self) -> bool {
        matches!(self, Permission::Admin | Permission::Maintain | Permission::Write)
    }
}

/// `GET /repos/{repo}/collaborators/{user}/permission`
#[derive(Debug, Deserialize)]
pub struct CollaboratorPermission {
    pub permission: Permission,
}

/// `GET /repos/{repo}/branches/{branch}`
#[derive(Debug, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: CommitRef,
}

#[derive(Debug, Deserialize)]
pub struct CommitRef {
    pub sha: String,
}

/// `POST /repos/{repo}/git/refs`
#[derive(Debug, Serialize)]
pub struct NewRef<'a> {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: &'a str,
}

/// `PUT /repos/{repo}/contents/{path}`
#[derive(Debug, Serialize)]
pub struct NewFile<'a> {
    pub message: &'a str,
    /// Base64 encoded file body
    pub content: String,
    pub branch: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct FileCommitResponse {
    pub content: ContentFile,
    pub commit: CommitRef,
}

#[derive(Debug, Deserialize)]
pub struct ContentFile {
    pub path: String,
    pub html_url: String,
}

/// Outcome of committing a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedFile {
    pub html_url: String,
    pub commit_sha: String,
}

/// `POST /repos/{repo}/pulls`
#[derive(Debug, Clone, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    /// `owner:branch` for cross-repository pull requests
    pub head: String,
    pub base: String,
    pub maintainer_can_modify: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}

/// `GET /repos/{repo}/installation`
#[derive(Debug, Deserialize)]
pub struct Installation {
    pub id: u64,
}

/// `POST /app/installations/{id}/access_tokens`
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// GitHub's error body
#[derive(Debug, Deserialize)]
pub struct GitHubErrorBody {
    pub message: String,
}
