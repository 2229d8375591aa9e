//! Core catalog and persistence types

mod album;
mod catalog;
mod snapshot;
mod track;

pub use album::{Album, AlbumId};
pub use catalog::{Catalog, CatalogDocument};
pub use snapshot::{PersistedSnapshot, DEFAULT_VOLUME};
pub use track::{Track, TrackKey};
