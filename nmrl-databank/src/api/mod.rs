//! HTTP API handlers for nmrl-databank

pub mod catalog;
pub mod health;
pub mod refresh;
pub mod validation;

pub use catalog::{list_mappings, list_molecules};
pub use health::health_routes;
pub use refresh::refresh_databank_files;
pub use validation::info_valid_check;
