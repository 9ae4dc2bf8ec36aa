//! Molecule and mapping-file static cache
//!
//! Scans the molecule tree of a Databank checkout and persists two JSON
//! files into a static directory:
//!
//! - `molecules.json`: `{"lipids": [...], "solution": [...]}`
//! - `mapping-files.json`: `{"<molecule>": ["<mapping file>", ...]}`
//!
//! Both are written to `<file>.tmp` and renamed into place so readers never
//! see a half-written file.

use crate::{Error, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const MOLECULE_FILE: &str = "molecules.json";
pub const MAPPING_FILE: &str = "mapping-files.json";

/// Subdirectory holding lipid molecules
pub const LIPID_DIR: &str = "membrane";
/// Subdirectory holding solution molecules
pub const SOLUTION_DIR: &str = "solution";

/// Known molecule identifiers, split by group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoleculeSets {
    pub lipids: Vec<String>,
    pub solution: Vec<String>,
}

impl MoleculeSets {
    /// Total number of identifiers across both groups
    pub fn len(&self) -> usize {
        self.lipids.len() + self.solution.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `name` is a lipid or a solution molecule
    pub fn contains(&self, name: &str) -> bool {
        self.lipids.iter().any(|n| n == name) || self.solution.iter().any(|n| n == name)
    }
}

/// Mapping files per molecule, keys and values sorted
pub type MappingIndex = BTreeMap<String, Vec<String>>;

/// Collect lipid and solution molecule names under `root`
pub fn scan_molecules(root: &Path) -> Result<MoleculeSets> {
    Ok(MoleculeSets {
        lipids: molecule_dirs(&root.join(LIPID_DIR))?
            .into_iter()
            .map(|(name, _)| name)
            .collect(),
        solution: molecule_dirs(&root.join(SOLUTION_DIR))?
            .into_iter()
            .map(|(name, _)| name)
            .collect(),
    })
}

/// Collect mapping files for every molecule under `root`
///
/// A file counts as a mapping file when its name contains `mapping`.
/// Molecules with no mapping file are left out.
pub fn build_mapping_index(root: &Path) -> Result<MappingIndex> {
    info!("Building mapping dict from {}", root.display());
    let mut index = MappingIndex::new();

    for group in [LIPID_DIR, SOLUTION_DIR] {
        for (molecule, dir) in molecule_dirs(&root.join(group))? {
            let mut files = Vec::new();
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.contains("mapping") && entry.file_type()?.is_file() {
                    files.push(name);
                }
            }
            if files.is_empty() {
                continue;
            }
            let slot = index.entry(molecule).or_default();
            slot.extend(files);
            slot.sort();
            slot.dedup();
        }
    }

    Ok(index)
}

/// Write `molecules.json`, returning the number of identifiers
pub fn write_molecule_file(static_dir: &Path, sets: &MoleculeSets) -> Result<usize> {
    let path = static_dir.join(MOLECULE_FILE);
    write_json_atomic(&path, sets)?;
    info!("Wrote {} molecules to {}", sets.len(), path.display());
    Ok(sets.len())
}

/// Write `mapping-files.json`, returning the number of molecules
pub fn write_mapping_file(static_dir: &Path, index: &MappingIndex) -> Result<usize> {
    let path = static_dir.join(MAPPING_FILE);
    write_json_atomic(&path, index)?;
    info!("Wrote {} mappings to {}", index.len(), path.display());
    Ok(index.len())
}

pub fn read_molecule_file(static_dir: &Path) -> Result<MoleculeSets> {
    read_json(&static_dir.join(MOLECULE_FILE))
}

pub fn read_mapping_file(static_dir: &Path) -> Result<MappingIndex> {
    read_json(&static_dir.join(MAPPING_FILE))
}

/// Serialize `value` as pretty JSON to `<path>.tmp`, then rename over `path`
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let tmp = tmp_path(path);
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, json)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Sorted (name, path) pairs for the subdirectories of `group_dir`
fn molecule_dirs(group_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !group_dir.is_dir() {
        return Err(Error::SourceMissing(group_dir.to_path_buf()));
    }

    let mut dirs = BTreeSet::new();
    for entry in fs::read_dir(group_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            let name = entry.file_name().to_string_lossy().into_owned();
            dirs.insert((name, entry.path()));
        }
    }
    Ok(dirs.into_iter().collect())
}
