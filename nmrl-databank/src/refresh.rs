//! Checkout refresh and static cache rebuild
//!
//! One [`Refresher`] per service. Startup, the admin endpoint and the
//! periodic task all go through it; its lock makes refreshes run one at a
//! time, so a request that arrives mid-refresh waits for the running one
//! and then does its own.

use nmrl_common::cache::{
    build_mapping_index, scan_molecules, write_mapping_file, write_molecule_file,
};
use nmrl_common::git::{pull_all, RepoCheckout};
use nmrl_common::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::DatabankConfig;
use crate::validation::Catalog;

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Repository pull failed: {0}")]
    Pull(#[source] Error),

    #[error("Molecule list rebuild failed: {0}")]
    Molecules(#[source] Error),

    #[error("Mapping index rebuild failed: {0}")]
    Mappings(#[source] Error),

    #[error("Refresh task failed: {0}")]
    Task(String),
}

impl RefreshError {
    /// Message shown to API callers
    pub fn public_message(&self) -> &'static str {
        match self {
            RefreshError::Pull(Error::Git { .. }) => "Failed to pull Databank repository",
            RefreshError::Pull(_) => "Error updating Databank repository",
            RefreshError::Molecules(e) if e.is_not_found() => "Molecule file path invalid",
            RefreshError::Molecules(_) => "Failed to refresh molecules list",
            RefreshError::Mappings(e) if e.is_not_found() => "Mapping source directory not found",
            RefreshError::Mappings(Error::Json(_)) => "Failed to write mapping-files.json",
            RefreshError::Mappings(_) => "Failed to rebuild mapping dictionary",
            RefreshError::Task(_) => "Failed to refresh molecules list",
        }
    }
}

/// Counts from a successful rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
    pub molecules: usize,
    pub mapped_molecules: usize,
}

pub struct Refresher {
    checkouts: Vec<RepoCheckout>,
    molecule_root: PathBuf,
    static_dir: PathBuf,
    lock: Mutex<()>,
    catalog: RwLock<Option<Arc<Catalog>>>,
}

impl Refresher {
    pub fn new(
        checkouts: Vec<RepoCheckout>,
        molecule_root: impl Into<PathBuf>,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            checkouts,
            molecule_root: molecule_root.into(),
            static_dir: static_dir.into(),
            lock: Mutex::new(()),
            catalog: RwLock::new(None),
        }
    }

    /// BilayerData, then the Databank with its submodules
    pub fn from_config(config: &DatabankConfig) -> Self {
        let checkouts = vec![
            RepoCheckout::new("BilayerData", &config.bilayerdata_path),
            RepoCheckout::new("Databank", &config.databank_path).with_submodules(),
        ];
        Self::new(checkouts, &config.molecule_root, &config.static_dir)
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// Catalog from the last successful rebuild
    pub async fn catalog(&self) -> Option<Arc<Catalog>> {
        self.catalog.read().await.clone()
    }

    /// Pull every checkout, then rebuild both cache files
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let _guard = self.lock.lock().await;
        pull_all(&self.checkouts).await.map_err(RefreshError::Pull)?;
        self.rebuild_locked().await
    }

    /// Rebuild the cache files from what is on disk, without pulling
    pub async fn rebuild(&self) -> Result<RefreshReport, RefreshError> {
        let _guard = self.lock.lock().await;
        self.rebuild_locked().await
    }

    /// Startup sequence; failures are logged and the service keeps going
    pub async fn startup(&self) -> nmrl_common::Result<()> {
        tokio::fs::create_dir_all(&self.static_dir).await?;

        let _guard = self.lock.lock().await;
        if let Err(e) = pull_all(&self.checkouts).await {
            warn!("Startup pull failed, serving the checkout on disk: {}", e);
        }
        if let Err(e) = self.rebuild_locked().await {
            error!("Startup cache build failed: {}", e);
        }
        Ok(())
    }

    /// Refresh every `period` until the handle is aborted
    pub fn spawn_periodic(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let refresher = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick fires immediately; startup already refreshed
            ticker.tick().await;
            loop {
                ticker.tick().await;
                info!("Periodic databank refresh");
                if let Err(e) = refresher.refresh().await {
                    error!("Periodic refresh failed: {}", e);
                }
            }
        })
    }

    async fn rebuild_locked(&self) -> Result<RefreshReport, RefreshError> {
        let root = self.molecule_root.clone();
        let static_dir = self.static_dir.clone();
        let (catalog, report) = tokio::task::spawn_blocking(move || build_caches(&root, &static_dir))
            .await
            .map_err(|e| RefreshError::Task(e.to_string()))??;

        *self.catalog.write().await = Some(Arc::new(catalog));
        Ok(report)
    }
}

fn build_caches(root: &Path, static_dir: &Path) -> Result<(Catalog, RefreshReport), RefreshError> {
    info!("Refreshing molecule file");
    let molecules = scan_molecules(root).map_err(RefreshError::Molecules)?;
    let molecule_count =
        write_molecule_file(static_dir, &molecules).map_err(RefreshError::Molecules)?;

    let mappings = build_mapping_index(root).map_err(RefreshError::Mappings)?;
    let mapped = write_mapping_file(static_dir, &mappings).map_err(RefreshError::Mappings)?;

    Ok((
        Catalog {
            molecules,
            mappings,
        },
        RefreshReport {
            molecules: molecule_count,
            mapped_molecules: mapped,
        },
    ))
}
