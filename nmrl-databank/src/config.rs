//! nmrl-databank configuration
//!
//! Same layering as the gateway: flags with env fallbacks, then the
//! `[databank]` TOML section, then defaults.

use clap::Args;
use nmrl_common::config::resolve;
use nmrl_common::Result;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_BILAYERDATA_PATH: &str = "/app/BilayerData";
pub const DEFAULT_DATABANK_PATH: &str = "/app/Databank";
pub const DEFAULT_STATIC_DIR: &str = "/app/static";
pub const DEFAULT_GATEWAY_URL: &str = "http://github_gateway:5001";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Molecule definitions inside the BilayerData checkout
const MOLECULE_SUBDIR: &str = "Molecules";

/// Unresolved databank settings
#[derive(Args, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabankSettings {
    /// Address to bind
    #[arg(long, env = "NMRL_DATABANK_HOST")]
    pub host: Option<IpAddr>,

    /// Port to listen on
    #[arg(short, long, env = "NMRL_DATABANK_PORT")]
    pub port: Option<u16>,

    /// BilayerData checkout
    #[arg(long, env = "BILAYERDATA_PATH")]
    pub bilayerdata_path: Option<PathBuf>,

    /// Databank checkout (pulled with submodules)
    #[arg(long, env = "DATABANK_PATH")]
    pub databank_path: Option<PathBuf>,

    /// Directory holding `membrane/` and `solution/` molecule folders
    #[arg(long, env = "NMRL_MOLECULE_ROOT")]
    pub molecule_root: Option<PathBuf>,

    /// Where molecules.json and mapping-files.json are written
    #[arg(long, env = "LOCAL_STATIC")]
    pub static_dir: Option<PathBuf>,

    /// Gateway base URL (admin checks)
    #[arg(long, env = "GITHUB_GATEWAY_URL")]
    pub gateway_url: Option<String>,

    /// Info-file JSON schema; the bundled schema is used when unset
    #[arg(long, env = "NMRL_INFO_SCHEMA")]
    pub schema_path: Option<PathBuf>,

    /// Seconds between background refreshes (0 disables)
    #[arg(long, env = "NMRL_REFRESH_INTERVAL_SECS")]
    pub refresh_interval_secs: Option<u64>,

    /// Outbound request timeout in seconds
    #[arg(long, env = "NMRL_DATABANK_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

/// Fully resolved databank configuration
#[derive(Debug, Clone)]
pub struct DatabankConfig {
    pub bind: SocketAddr,
    pub bilayerdata_path: PathBuf,
    pub databank_path: PathBuf,
    pub molecule_root: PathBuf,
    pub static_dir: PathBuf,
    pub gateway_url: String,
    pub schema_path: Option<PathBuf>,
    /// `None` when periodic refresh is disabled
    pub refresh_interval: Option<Duration>,
    pub timeout: Duration,
}

impl DatabankConfig {
    pub fn resolve(cli: DatabankSettings, file: DatabankSettings) -> Result<Self> {
        let host = resolve(cli.host, file.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port = resolve(cli.port, file.port, DEFAULT_PORT);

        let bilayerdata_path = resolve(
            cli.bilayerdata_path,
            file.bilayerdata_path,
            PathBuf::from(DEFAULT_BILAYERDATA_PATH),
        );
        let molecule_root = cli
            .molecule_root
            .or(file.molecule_root)
            .unwrap_or_else(|| bilayerdata_path.join(MOLECULE_SUBDIR));

        let interval = resolve(
            cli.refresh_interval_secs,
            file.refresh_interval_secs,
            DEFAULT_REFRESH_INTERVAL_SECS,
        );

        Ok(Self {
            bind: SocketAddr::new(host, port),
            databank_path: resolve(
                cli.databank_path,
                file.databank_path,
                PathBuf::from(DEFAULT_DATABANK_PATH),
            ),
            molecule_root,
            bilayerdata_path,
            static_dir: resolve(cli.static_dir, file.static_dir, PathBuf::from(DEFAULT_STATIC_DIR)),
            gateway_url: resolve(cli.gateway_url, file.gateway_url, DEFAULT_GATEWAY_URL.to_string()),
            schema_path: cli.schema_path.or(file.schema_path),
            refresh_interval: (interval > 0).then(|| Duration::from_secs(interval)),
            timeout: Duration::from_secs(resolve(cli.timeout_secs, file.timeout_secs, DEFAULT_TIMEOUT_SECS)),
        })
    }
}
