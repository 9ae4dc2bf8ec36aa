//! Configuration file discovery and setting resolution
//!
//! Settings resolve in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Each binary's `clap` arguments cover tiers 1 and 2 (`#[arg(env = ...)]`),
//! this module covers tier 3 and glues them together.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "NMRL_CONFIG";

/// Locate the TOML config file
///
/// Priority: explicit path, `NMRL_CONFIG`, `<config dir>/nmrl/config.toml`,
/// `/etc/nmrl/config.toml`. Returns `None` when nothing exists; an explicit
/// path that doesn't exist is an error.
pub fn locate_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        return if path.exists() {
            Ok(Some(path.to_path_buf()))
        } else {
            Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )))
        };
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        return if path.exists() {
            Ok(Some(path))
        } else {
            Err(Error::Config(format!(
                "{} points at a missing file: {}",
                CONFIG_ENV_VAR,
                path.display()
            )))
        };
    }

    let user_config = dirs::config_dir().map(|d| d.join("nmrl").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(Some(path));
        }
    }

    let system_config = PathBuf::from("/etc/nmrl/config.toml");
    if system_config.exists() {
        return Ok(Some(system_config));
    }

    Ok(None)
}

/// Load one `[section]` of the config file
///
/// A missing file or missing section yields `T::default()`, so services run
/// with no config file at all.
pub fn load_section<T>(path: Option<&Path>, section: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        debug!("No config file, using defaults for [{}]", section);
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let document: toml::Table = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    match document.get(section) {
        Some(value) => {
            info!("Loaded [{}] from {}", section, path.display());
            value
                .clone()
                .try_into()
                .map_err(|e| Error::Config(format!("Invalid [{}] section: {}", section, e)))
        }
        None => Ok(T::default()),
    }
}

/// A credential that must never reach the logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Pick the first available value: CLI/env, then TOML, then the default
pub fn resolve<T>(cli_or_env: Option<T>, toml: Option<T>, default: T) -> T {
    cli_or_env.or(toml).unwrap_or(default)
}

/// Like [`resolve`] but with no default; `name` is used in the error
pub fn require<T>(cli_or_env: Option<T>, toml: Option<T>, name: &str) -> Result<T> {
    cli_or_env
        .or(toml)
        .ok_or_else(|| Error::Config(format!("{} is not configured", name)))
}

/// Resolve a secret given inline or as a path to a file holding it
///
/// Inline wins. File contents are trimmed of surrounding whitespace except
/// for PEM blocks, which keep their trailing newline.
pub fn read_secret(inline: Option<String>, file: Option<&Path>, name: &str) -> Result<String> {
    if let Some(value) = inline.filter(|v| !v.trim().is_empty()) {
        return Ok(value);
    }

    let Some(path) = file else {
        return Err(Error::Config(format!("{} is not configured", name)));
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} from {} failed: {}", name, path.display(), e)))?;

    if content.contains("-----BEGIN") {
        Ok(content)
    } else {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(Error::Config(format!("{} file {} is empty", name, path.display())));
        }
        Ok(trimmed.to_string())
    }
}
