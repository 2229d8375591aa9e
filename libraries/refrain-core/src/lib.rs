//! Refrain Core
//!
//! Platform-agnostic catalog types and conventions shared by every Refrain crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Catalog model**: `Track`, `Album`, `Catalog` and the wire-level `CatalogDocument`
//! - **Track identity**: `TrackKey` (owning album + file)
//! - **Media locations**: `MediaLocator`, which derives the canonical audio URL for a track
//! - **Persistence shape**: `PersistedSnapshot`, the subset of player state that outlives a session
//! - **Error handling**: `CoreError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use refrain_core::{Catalog, MediaLocator};
//!
//! let json = r#"{
//!     "artist": "Grup Yorum",
//!     "totalAlbums": 1,
//!     "albums": [{
//!         "id": 1, "title": "Siyrilip Gelen", "year": 1985, "slug": "siyrilip-gelen",
//!         "trackCount": 1,
//!         "tracks": [{ "track": 1, "title": "Hasretinden", "file": "01.mp3" }]
//!     }]
//! }"#;
//!
//! let catalog = Catalog::from_json(json).unwrap();
//! let track = catalog.first_track().unwrap();
//!
//! let locator = MediaLocator::new("https://cdn.example.com/music");
//! assert_eq!(
//!     locator.source_for(&catalog, track).as_deref(),
//!     Some("https://cdn.example.com/music/albums/1985-siyrilip-gelen/tracks/01.mp3")
//! );
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod source;
pub mod types;

pub use error::{CoreError, Result};
pub use source::{decode_source, MediaLocator};
pub use types::{
    Album, AlbumId, Catalog, CatalogDocument, PersistedSnapshot, Track, TrackKey,
    DEFAULT_VOLUME,
};
