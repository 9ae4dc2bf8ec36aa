//! Git checkout synchronisation
//!
//! Shells out to the `git` binary; the checkouts are plain clones managed
//! outside the services.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info};

/// A local clone the services read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCheckout {
    /// Display name for logs ("Databank", "BilayerData")
    pub name: String,
    /// Working tree root
    pub path: PathBuf,
    /// Also run `git submodule update --remote --recursive` after pulling
    pub update_submodules: bool,
}

impl RepoCheckout {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            update_submodules: false,
        }
    }

    pub fn with_submodules(mut self) -> Self {
        self.update_submodules = true;
        self
    }
}

/// Pull the latest changes for one checkout
pub async fn pull(checkout: &RepoCheckout) -> Result<()> {
    if !checkout.path.is_dir() {
        return Err(Error::NotFound(format!(
            "{} checkout missing at {}",
            checkout.name,
            checkout.path.display()
        )));
    }

    info!("Pulling latest {} repo at {}", checkout.name, checkout.path.display());
    run_git(&checkout.path, &["pull"]).await?;

    if checkout.update_submodules {
        info!("Updating {} submodules", checkout.name);
        run_git(&checkout.path, &["submodule", "update", "--remote", "--recursive"]).await?;
    }

    Ok(())
}

/// Pull each checkout in order, stopping at the first failure
pub async fn pull_all(checkouts: &[RepoCheckout]) -> Result<()> {
    for checkout in checkouts {
        if let Err(e) = pull(checkout).await {
            error!("Failed to update {} repository: {}", checkout.name, e);
            return Err(e);
        }
    }
    Ok(())
}

/// Run `git <args>` in `dir`, returning stdout
async fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::Git {
            command: args.join(" "),
            dir: dir.to_path_buf(),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
