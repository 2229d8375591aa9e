//! Core error types for Refrain
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for Refrain
#[derive(Error, Debug)]
pub enum CoreError {
    /// Catalog document could not be parsed
    #[error("Malformed catalog document: {0}")]
    MalformedCatalog(#[from] serde_json::Error),
}

