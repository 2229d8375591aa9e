//! Catalog of albums, loaded once per session

use super::{Album, AlbumId, Track};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Wire shape of the published catalog document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    pub artist: String,
    #[serde(default)]
    pub total_albums: u32,
    pub albums: Vec<Album>,
}

/// Read-only album catalog
///
/// Built from a [`CatalogDocument`]; every track gets its owning album's slug as
/// `album_ref` so tracks can be identified without a back-pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    artist: String,
    albums: Vec<Album>,
}

impl Catalog {
    /// Build a catalog, stamping track ownership
    ///
    /// An album repeating an earlier album's id or slug is dropped; the first
    /// one wins.
    pub fn from_document(document: CatalogDocument) -> Self {
        let mut ids = HashSet::new();
        let mut slugs = HashSet::new();

        let mut albums = Vec::with_capacity(document.albums.len());
        for mut album in document.albums {
            if ids.contains(&album.id) || slugs.contains(&album.slug) {
                warn!(id = album.id, slug = %album.slug, "Skipping duplicate album");
                continue;
            }
            ids.insert(album.id);
            slugs.insert(album.slug.clone());
            for track in &mut album.tracks {
                track.album_ref = Some(album.slug.clone());
            }
            albums.push(album);
        }

        Self {
            artist: document.artist,
            albums,
        }
    }

    /// Parse and build a catalog from the JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(document))
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn is_empty(&self) -> bool {
        self.albums.is_empty()
    }

    pub fn album(&self, id: AlbumId) -> Option<&Album> {
        self.albums.iter().find(|a| a.id == id)
    }

    /// Album owning `track`
    ///
    /// Linear scan over albums and their tracks; catalogs are small.
    pub fn owning_album(&self, track: &Track) -> Option<&Album> {
        self.albums.iter().find(|a| a.contains(track))
    }

    /// Owning album and the track's index in it
    pub fn locate(&self, track: &Track) -> Option<(&Album, usize)> {
        self.albums
            .iter()
            .find_map(|a| a.position_of(track).map(|idx| (a, idx)))
    }

    /// Track `offset` positions away from `track` within its own album
    ///
    /// Never crosses album boundaries.
    pub fn neighbour(&self, track: &Track, offset: isize) -> Option<&Track> {
        let (album, idx) = self.locate(track)?;
        let target = idx.checked_add_signed(offset)?;
        album.tracks.get(target)
    }

    /// First track of the first album that has any
    pub fn first_track(&self) -> Option<&Track> {
        self.albums.iter().find_map(Album::first_track)
    }
}
