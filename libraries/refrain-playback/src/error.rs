//! Error types for playback management

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors returned by device operations
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Device refused to start playback (gesture policy, permissions)
    #[error("Playback rejected: {0}")]
    Rejected(String),

    /// No source is loaded on the device
    #[error("No source loaded")]
    NoSource,

    /// Device cannot seek to the requested position yet
    #[error("Invalid seek position: {0}")]
    InvalidSeekPosition(f64),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Failures folded into `status.last_error`
///
/// These are values the UI renders, never propagated as `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackErrorKind {
    /// Device could not open or decode the source
    Load,

    /// Device refused to start playback
    PlaybackRejected,

    /// Catalog document unreachable or malformed
    CatalogFetch,

    /// Persisted track no longer resolves against the catalog
    RehydrationMismatch,
}

impl fmt::Display for PlaybackErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Load => "could not load track",
            Self::PlaybackRejected => "playback was blocked",
            Self::CatalogFetch => "catalog unavailable",
            Self::RehydrationMismatch => "saved track no longer available",
        };
        f.write_str(text)
    }
}
