//! Error types for the planner.
//!
//! Data-quality problems (unknown units, missing stock, unmatched names) are
//! never errors: they surface as candidate diagnostics. These variants cover
//! boundary validation and the I/O done by loaders and collaborators.

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, PlannerError>;

#[derive(Error, Debug)]
pub enum PlannerError {
    /// Programmer-error class input rejected before planning starts
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// An external plan generator failed or returned unusable output
    #[error("Plan generator error: {0}")]
    Generator(String),
}
