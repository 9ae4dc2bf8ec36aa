//! Info-file upload workflow
//!
//! sync fork -> branch out -> commit `UserData/info.yml` -> cross-repo PR
//!
//! Work repository calls use the work repository's installation token,
//! the pull request uses the target repository's. Each step's failure is
//! reported with the [`UploadStage`] it happened in. A branch created for
//! a commit that then failed is deleted again (best effort); a branch
//! whose commit succeeded is kept even if the pull request fails, since it
//! holds the user's data.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::github::types::NewPullRequest;
use crate::github::{GitHubClient, GitHubError, RepoName, TokenCache};
use nmrl_common::time::compact_stamp;

/// Path of the committed record inside the work repository
pub const INFO_FILE_PATH: &str = "UserData/info.yml";

/// Prefix of branches created by the gateway
pub const BOT_BRANCH_PREFIX: &str = "bot/info_yaml_";

/// Where uploads go
#[derive(Debug, Clone)]
pub struct UploadTarget {
    pub work_repo: RepoName,
    pub target_repo: RepoName,
    pub base_branch: String,
}

/// A validated record plus who sent it
#[derive(Debug, Clone)]
pub struct Submission {
    /// Free-text name typed into the portal form
    pub user_name: String,
    /// GitHub login resolved from the user's token
    pub github_login: String,
    /// Branch the user picked in the portal
    pub requested_branch: String,
    pub record: Map<String, Value>,
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub branch: String,
    pub file_url: String,
    pub pull_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Render,
    Sync,
    Branch,
    Commit,
    PullRequest,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStage::Render => "render",
            UploadStage::Sync => "upstream sync",
            UploadStage::Branch => "branch creation",
            UploadStage::Commit => "file commit",
            UploadStage::PullRequest => "pull request creation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload failed during {stage}: {source}")]
    GitHub {
        stage: UploadStage,
        /// Branch left behind in the work repository, if any
        branch: Option<String>,
        #[source]
        source: GitHubError,
    },

    #[error("Upload failed during render: {0}")]
    Render(#[from] serde_yaml::Error),
}

impl UploadError {
    pub fn stage(&self) -> UploadStage {
        match self {
            UploadError::GitHub { stage, .. } => *stage,
            UploadError::Render(_) => UploadStage::Render,
        }
    }

    /// Branch that still exists in the work repository after the failure
    pub fn leftover_branch(&self) -> Option<&str> {
        match self {
            UploadError::GitHub { branch, .. } => branch.as_deref(),
            UploadError::Render(_) => None,
        }
    }
}

fn at(stage: UploadStage, branch: Option<&str>) -> impl FnOnce(GitHubError) -> UploadError + '_ {
    move |source| UploadError::GitHub {
        stage,
        branch: branch.map(str::to_string),
        source,
    }
}

/// `bot/info_yaml_<YYYYmmddHHMMSS>`
pub fn bot_branch_name(now: DateTime<Utc>) -> String {
    format!("{}{}", BOT_BRANCH_PREFIX, compact_stamp(now))
}

/// Render the record as YAML, keys in submission order
pub fn render_info_yaml(record: &Map<String, Value>) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(record)
}

pub fn commit_message(user_name: &str) -> String {
    format!("Add info.yml from {}", user_name)
}

pub fn pull_request_title(user_name: &str) -> String {
    format!("Upload Portal: Simulation files from {}", user_name)
}

pub fn pull_request_body(submission: &Submission) -> String {
    format!(
        "This PR contains simulation files uploaded by @{} through the NMRlipids upload portal.\n\
         \n\
         Submitted as: {} (selected branch: {})\n\
         \n\
         Processing of simulation data will happen after approval.\n",
        submission.github_login, submission.user_name, submission.requested_branch
    )
}

/// Runs one upload against GitHub
pub struct UploadWorkflow<'a> {
    github: &'a GitHubClient,
    tokens: &'a TokenCache,
    target: &'a UploadTarget,
}

impl<'a> UploadWorkflow<'a> {
    pub fn new(github: &'a GitHubClient, tokens: &'a TokenCache, target: &'a UploadTarget) -> Self {
        Self {
            github,
            tokens,
            target,
        }
    }

    pub async fn run(
        &self,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<UploadOutcome, UploadError> {
        let work = &self.target.work_repo;
        let base = &self.target.base_branch;
        info!("Pushing to repository with data from {}", submission.user_name);

        let yaml = render_info_yaml(&submission.record)?;

        let github = self.github;
        let work_token = self
            .tokens
            .with_token(work, move |token| async move {
                github.merge_upstream(&token, work, base).await.map(|_| token)
            })
            .await
            .map_err(|e| {
                error!("Failed to sync upstream for {}: {}", work, e);
                at(UploadStage::Sync, None)(e)
            })?;

        let branch = bot_branch_name(now);
        let sha = self
            .github
            .branch_head_sha(&work_token, work, base)
            .await
            .map_err(at(UploadStage::Branch, None))?;
        self.github
            .create_ref(&work_token, work, &branch, &sha)
            .await
            .map_err(at(UploadStage::Branch, None))?;
        info!("Synced {} and created branch {}", base, branch);

        let created = match self
            .github
            .create_file(
                &work_token,
                work,
                INFO_FILE_PATH,
                &commit_message(&submission.user_name),
                yaml.as_bytes(),
                &branch,
            )
            .await
        {
            Ok(created) => created,
            Err(e) => {
                let leftover = self.discard_branch(&work_token, &branch).await;
                return Err(at(UploadStage::Commit, leftover.as_deref())(e));
            }
        };

        let pull = NewPullRequest {
            title: pull_request_title(&submission.user_name),
            body: pull_request_body(submission),
            head: format!("{}:{}", work.owner, branch),
            base: base.clone(),
            maintainer_can_modify: false,
        };

        let target_repo = &self.target.target_repo;
        let pull = &pull;
        let pr = self
            .tokens
            .with_token(target_repo, move |token| async move {
                github.create_pull_request(&token, target_repo, pull).await
            })
            .await
            .map_err(|e| {
                error!("Pull request from {} failed; branch kept: {}", branch, e);
                at(UploadStage::PullRequest, Some(branch.as_str()))(e)
            })?;

        info!("Opened pull request #{} from {}", pr.number, branch);
        Ok(UploadOutcome {
            branch,
            file_url: created.html_url,
            pull_url: pr.html_url,
        })
    }

    /// Delete a branch whose commit failed; returns the branch if it survived
    async fn discard_branch(&self, token: &str, branch: &str) -> Option<String> {
        match self
            .github
            .delete_ref(token, &self.target.work_repo, branch)
            .await
        {
            Ok(()) => {
                info!("Deleted orphaned branch {}", branch);
                None
            }
            Err(e) => {
                warn!("Could not delete orphaned branch {}: {}", branch, e);
                Some(branch.to_string())
            }
        }
    }
}
