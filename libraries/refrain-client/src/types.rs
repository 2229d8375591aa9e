//! Types for Refrain API requests and responses.

use refrain_core::AlbumId;
use serde::{Deserialize, Serialize};

/// Default path of the static catalog document
pub const DEFAULT_CATALOG_PATH: &str = "/all_albums_metadata.json";

/// Configuration for connecting to a Refrain server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server (e.g., "https://music.example.com")
    pub url: String,
    /// Access token for the likes API (if signed in)
    pub access_token: Option<String>,
    /// Path of the catalog document, relative to `url`
    pub catalog_path: String,
}

impl ClientConfig {
    /// Create a new config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
        }
    }

    /// Create a config with an existing token.
    pub fn with_token(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Self::new(url)
        }
    }

    #[must_use]
    pub fn catalog_path(mut self, path: impl Into<String>) -> Self {
        self.catalog_path = path.into();
        self
    }
}

// =============================================================================
// Likes
// =============================================================================

/// A liked track, identified by album and track number.
///
/// Also the request body for `POST /api/likes` and `DELETE /api/likes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LikeKey {
    pub album_id: AlbumId,
    pub track_number: u32,
}

impl LikeKey {
    pub fn new(album_id: AlbumId, track_number: u32) -> Self {
        Self {
            album_id,
            track_number,
        }
    }
}

/// Body returned by the like endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct LikeResponse {
    #[serde(default)]
    pub message: String,
    pub like: Option<LikeKey>,
}

/// Outcome of `POST /api/likes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    /// 201: a new like was recorded
    Created(LikeKey),
    /// 200: the track was already liked
    AlreadyLiked,
}

/// Outcome of `DELETE /api/likes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlikeOutcome {
    /// 200: the like was removed
    Removed,
    /// 404: there was nothing to remove
    NotFound,
}
