//! # NMRL Common Library
//!
//! Shared code for the NMRL upload portal services including:
//! - Error types
//! - The standard JSON response envelope and bearer-token parsing
//! - Configuration file discovery and setting resolution
//! - Git checkout synchronisation
//! - The molecule / mapping-file static cache builder

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod git;
pub mod time;

pub use error::{Error, Result};
