//! Album types

use super::Track;
use serde::{Deserialize, Serialize};

pub type AlbumId = i64;

/// An album and its tracks in play order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub year: i32,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    pub track_count: u32,
    pub tracks: Vec<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Album {
    /// Folder name the album's media lives under (`{year}-{slug}`)
    pub fn folder(&self) -> String {
        format!("{}-{}", self.year, self.slug)
    }

    /// Whether `track` belongs to this album
    ///
    /// Tracks without an album reference match on file alone.
    pub fn contains(&self, track: &Track) -> bool {
        self.position_of(track).is_some()
    }

    /// Index of `track` in play order
    pub fn position_of(&self, track: &Track) -> Option<usize> {
        if let Some(album_ref) = &track.album_ref {
            if *album_ref != self.slug {
                return None;
            }
        }
        self.tracks.iter().position(|t| t.file_ref == track.file_ref)
    }

    pub fn first_track(&self) -> Option<&Track> {
        self.tracks.first()
    }

    pub fn last_track(&self) -> Option<&Track> {
        self.tracks.last()
    }
}
