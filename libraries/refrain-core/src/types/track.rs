//! Track types

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single playable track as published in the catalog document
///
/// Immutable once loaded. Identity is the pair (`album_ref`, `file_ref`), see [`TrackKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Position within the album (1-based in the published catalog)
    #[serde(rename = "track")]
    pub index: u32,

    pub title: String,

    /// File name under the album's `tracks/` folder
    #[serde(rename = "file")]
    pub file_ref: String,

    #[serde(rename = "disc", default, skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<u32>,

    /// Slug of the owning album; stamped by [`crate::Catalog`] on load
    #[serde(rename = "album", default, skip_serializing_if = "Option::is_none")]
    pub album_ref: Option<String>,
}

/// Identity of a track: owning album plus file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackKey {
    pub album_ref: Option<String>,
    pub file_ref: String,
}

impl Track {
    /// Create a track that is not yet attached to an album
    pub fn new(index: u32, title: impl Into<String>, file_ref: impl Into<String>) -> Self {
        Self {
            index,
            title: title.into(),
            file_ref: file_ref.into(),
            disc_number: None,
            album_ref: None,
        }
    }

    /// Attach the track to an album
    #[must_use]
    pub fn in_album(mut self, album_ref: impl Into<String>) -> Self {
        self.album_ref = Some(album_ref.into());
        self
    }

    pub fn key(&self) -> TrackKey {
        TrackKey {
            album_ref: self.album_ref.clone(),
            file_ref: self.file_ref.clone(),
        }
    }

    /// Whether both tracks denote the same playable item
    pub fn is_same(&self, other: &Track) -> bool {
        self.file_ref == other.file_ref && self.album_ref == other.album_ref
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.album_ref {
            Some(album) => write!(f, "{}/{}", album, self.file_ref),
            None => f.write_str(&self.file_ref),
        }
    }
}
