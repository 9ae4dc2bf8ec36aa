//! nmrl-gateway configuration
//!
//! [`GatewaySettings`] is both the `clap` argument group (flags with env
//! fallbacks) and the `[gateway]` section of the TOML config file. The two
//! are layered by [`GatewayConfig::resolve`].

use clap::Args;
use nmrl_common::config::{read_secret, require, resolve, Secret};
use nmrl_common::{Error, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::github::client::{GITHUB_API_URL, GITHUB_WEB_URL};
use crate::github::RepoName;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_BASE_BRANCH: &str = "main";
pub const DEFAULT_DATABANK_URL: &str = "http://databank_api:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Unresolved gateway settings
#[derive(Args, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewaySettings {
    /// Address to bind
    #[arg(long, env = "NMRL_GATEWAY_HOST")]
    pub host: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long, env = "NMRL_GATEWAY_PORT")]
    pub port: Option<u16>,

    /// OAuth app client id
    #[arg(long, env = "OAUTH_ID")]
    pub oauth_client_id: Option<String>,

    /// OAuth app client secret
    #[arg(long, env = "OAUTH_SECRET", hide_env_values = true)]
    pub oauth_client_secret: Option<String>,

    /// File holding the OAuth app client secret
    #[arg(long, env = "OAUTH_SECRET_FILE")]
    pub oauth_client_secret_file: Option<PathBuf>,

    /// GitHub App id
    #[arg(long, env = "GITHUB_APP_ID")]
    pub app_id: Option<u64>,

    /// GitHub App private key (PEM)
    #[arg(long, env = "GITHUB_APP_PRIVATE_KEY_PEM", hide_env_values = true)]
    pub app_private_key: Option<String>,

    /// File holding the GitHub App private key
    #[arg(long, env = "GITHUB_APP_PRIVATE_KEY_FILE")]
    pub app_private_key_file: Option<PathBuf>,

    /// Repository uploads are committed to (owner/name)
    #[arg(long, env = "WORK_REPO_NAME")]
    pub work_repo: Option<String>,

    /// Repository pull requests are opened against (owner/name)
    #[arg(long, env = "PULL_REQUEST_TARGET_REPO")]
    pub target_repo: Option<String>,

    /// Branch uploads are based on and pull requests target
    #[arg(long, env = "WORK_BASE_BRANCH")]
    pub base_branch: Option<String>,

    /// Databank API base URL (record validation)
    #[arg(long, env = "DATABANK_API_URL")]
    pub databank_url: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL")]
    pub github_api_url: Option<String>,

    /// GitHub web base URL (OAuth code exchange)
    #[arg(long, env = "GITHUB_WEB_URL")]
    pub github_web_url: Option<String>,

    /// Outbound request timeout in seconds
    #[arg(long, env = "NMRL_GATEWAY_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

/// OAuth app credentials
#[derive(Debug, Clone)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: Secret,
}

/// Fully resolved gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: SocketAddr,
    pub oauth: OAuthApp,
    pub app_id: u64,
    pub app_private_key: Secret,
    pub work_repo: RepoName,
    pub target_repo: RepoName,
    pub base_branch: String,
    pub databank_url: String,
    pub github_api_url: String,
    pub github_web_url: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Layer CLI/env settings over the config file section
    pub fn resolve(cli: GatewaySettings, file: GatewaySettings) -> Result<Self> {
        let host = resolve(cli.host, file.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port = resolve(cli.port, file.port, DEFAULT_PORT);

        let client_id = require(cli.oauth_client_id, file.oauth_client_id, "OAuth client id")?;
        let client_secret = read_secret(
            cli.oauth_client_secret.or(file.oauth_client_secret),
            cli.oauth_client_secret_file
                .or(file.oauth_client_secret_file)
                .as_deref(),
            "OAuth client secret",
        )?;

        let app_id = require(cli.app_id, file.app_id, "GitHub App id")?;
        let app_private_key = read_secret(
            cli.app_private_key.or(file.app_private_key),
            cli.app_private_key_file
                .or(file.app_private_key_file)
                .as_deref(),
            "GitHub App private key",
        )?;

        let work_repo = parse_repo(require(cli.work_repo, file.work_repo, "Work repository")?)?;
        let target_repo = parse_repo(require(
            cli.target_repo,
            file.target_repo,
            "Pull request target repository",
        )?)?;

        Ok(Self {
            bind: SocketAddr::new(host, port),
            oauth: OAuthApp {
                client_id,
                client_secret: Secret::new(client_secret),
            },
            app_id,
            app_private_key: Secret::new(app_private_key),
            work_repo,
            target_repo,
            base_branch: resolve(cli.base_branch, file.base_branch, DEFAULT_BASE_BRANCH.to_string()),
            databank_url: resolve(cli.databank_url, file.databank_url, DEFAULT_DATABANK_URL.to_string()),
            github_api_url: resolve(cli.github_api_url, file.github_api_url, GITHUB_API_URL.to_string()),
            github_web_url: resolve(cli.github_web_url, file.github_web_url, GITHUB_WEB_URL.to_string()),
            timeout: Duration::from_secs(resolve(cli.timeout_secs, file.timeout_secs, DEFAULT_TIMEOUT_SECS)),
        })
    }
}

fn parse_repo(value: String) -> Result<RepoName> {
    value
        .parse()
        .map_err(|e| Error::Config(format!("Invalid repository {:?}: {}", value, e)))
}
