//! Info-file validation
//!
//! Domain checks against the molecule catalog run first, then the JSON
//! schema. The first failing stage decides the error.

use nmrl_common::cache::{MappingIndex, MoleculeSets};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

/// Schema used when no schema path is configured
const BUNDLED_SCHEMA: &str = include_str!("../schema/info_schema.json");

/// Top-level keys every info file must have
pub const REQUIRED_KEYS: [&str; 6] = ["DOI", "SOFTWARE", "TRJ", "TPR", "SYSTEM", "COMPOSITION"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    Domain(String),

    #[error("Schema validation failed: {}", .0.join("; "))]
    Schema(Vec<String>),
}

#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("Failed to read schema file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema as JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to compile JSON schema: {0}")]
    Compile(String),
}

/// What the domain checks validate against
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub molecules: MoleculeSets,
    pub mappings: MappingIndex,
}

/// Compiled info-file schema
pub struct InfoValidator {
    schema: jsonschema::Validator,
}

impl InfoValidator {
    pub fn bundled() -> Result<Self, SchemaLoadError> {
        Self::compile(BUNDLED_SCHEMA)
    }

    pub fn from_path(path: &Path) -> Result<Self, SchemaLoadError> {
        let text = fs::read_to_string(path).map_err(|source| SchemaLoadError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::compile(&text)
    }

    /// Configured schema if given, bundled schema otherwise
    pub fn load(path: Option<&Path>) -> Result<Self, SchemaLoadError> {
        match path {
            Some(path) => {
                info!("Loading info schema from {}", path.display());
                Self::from_path(path)
            }
            None => Self::bundled(),
        }
    }

    fn compile(text: &str) -> Result<Self, SchemaLoadError> {
        let schema: Value = serde_json::from_str(text)?;
        let schema = jsonschema::validator_for(&schema)
            .map_err(|e| SchemaLoadError::Compile(e.to_string()))?;
        Ok(Self { schema })
    }

    /// Every schema violation as `<instance path>: <message>`
    pub fn validate_schema(&self, record: &Value) -> Vec<String> {
        self.schema
            .iter_errors(record)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect()
    }

    pub fn validate(&self, record: &Value, catalog: &Catalog) -> Result<(), ValidationError> {
        check_domain(record, catalog)?;

        info!("Validating info file by schema");
        let errors = self.validate_schema(record);
        if errors.is_empty() {
            info!("No errors found in info file by schema");
            return Ok(());
        }
        for e in &errors {
            error!("{}", e);
        }
        Err(ValidationError::Schema(errors))
    }
}

/// Domain checks that need the molecule catalog
pub fn check_domain(record: &Value, catalog: &Catalog) -> Result<(), ValidationError> {
    let record = match record {
        Value::Object(map) if !map.is_empty() => map,
        _ => {
            return Err(ValidationError::Domain(
                "Info file must be a non-empty JSON object".to_string(),
            ))
        }
    };

    if let Some(composition) = record.get("COMPOSITION") {
        check_composition(composition, catalog)?;
    }

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !record.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::Domain(format!(
            "Missing required keys: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

fn check_composition(composition: &Value, catalog: &Catalog) -> Result<(), ValidationError> {
    let Some(entries) = composition.as_object() else {
        return Err(ValidationError::Domain("COMPOSITION must be an object".to_string()));
    };

    for (molecule, entry) in entries {
        if !catalog.molecules.contains(molecule) {
            return Err(ValidationError::Domain(format!(
                "Molecule {} in COMPOSITION is not in the databank",
                molecule
            )));
        }
        let mapping = entry
            .as_object()
            .and_then(|e: &Map<String, Value>| e.get("MAPPING"))
            .and_then(Value::as_str);
        if let Some(mapping) = mapping {
            let known = catalog
                .mappings
                .get(molecule)
                .is_some_and(|files| files.iter().any(|f| f == mapping));
            if !known {
                return Err(ValidationError::Domain(format!(
                    "Mapping file {} is not available for {}",
                    mapping, molecule
                )));
            }
        }
    }
    Ok(())
}
