//! Media source URL convention
//!
//! Audio for a track lives at `{public_base}/albums/{year}-{slug}/tracks/{file}`.
//! Devices usually hand back a percent-encoded form of whatever they were given,
//! so comparisons always go through [`decode_source`].

use crate::types::{Album, Catalog, Track};
use std::borrow::Cow;

/// Derives canonical audio URLs from the public media base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLocator {
    public_base: String,
}

impl MediaLocator {
    pub fn new(public_base: impl Into<String>) -> Self {
        let base: String = public_base.into();
        Self {
            public_base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn public_base(&self) -> &str {
        &self.public_base
    }

    /// URL for a track whose album is already known
    pub fn source_url(&self, album: &Album, track: &Track) -> String {
        format!(
            "{}/albums/{}/tracks/{}",
            self.public_base,
            album.folder(),
            track.file_ref
        )
    }

    /// URL for `track`, resolving its album through the catalog
    pub fn source_for(&self, catalog: &Catalog, track: &Track) -> Option<String> {
        catalog
            .owning_album(track)
            .map(|album| self.source_url(album, track))
    }

    /// Whether a device-reported source denotes `expected`
    ///
    /// Both sides are decoded; file names may themselves contain `%XX`.
    pub fn is_same_source(device_source: &str, expected: &str) -> bool {
        decode_source(device_source) == decode_source(expected)
    }
}

/// Percent-decode a device source for comparison
///
/// Invalid UTF-8 after decoding leaves the input untouched.
pub fn decode_source(source: &str) -> Cow<'_, str> {
    urlencoding::decode(source).unwrap_or(Cow::Borrowed(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album() -> Album {
        Album {
            id: 1,
            title: "Hiç Durmadan".to_string(),
            year: 1987,
            slug: "hic-durmadan".to_string(),
            cover: None,
            track_count: 1,
            tracks: vec![Track::new(1, "Gündoğdu", "01 Gündoğdu.mp3").in_album("hic-durmadan")],
            description: None,
        }
    }

    #[test]
    fn url_convention() {
        let locator = MediaLocator::new("https://media.example.com/");
        let album = album();
        assert_eq!(
            locator.source_url(&album, &album.tracks[0]),
            "https://media.example.com/albums/1987-hic-durmadan/tracks/01 Gündoğdu.mp3"
        );
    }

    #[test]
    fn encoded_device_source_matches() {
        let locator = MediaLocator::new("https://media.example.com");
        let album = album();
        let expected = locator.source_url(&album, &album.tracks[0]);
        let reported =
            "https://media.example.com/albums/1987-hic-durmadan/tracks/01%20G%C3%BCndo%C4%9Fdu.mp3";

        assert!(MediaLocator::is_same_source(reported, &expected));
        assert!(MediaLocator::is_same_source(&expected, &expected));
        assert!(!MediaLocator::is_same_source(
            "https://media.example.com/albums/1987-hic-durmadan/tracks/02.mp3",
            &expected
        ));
    }

    #[test]
    fn file_name_with_percent_matches_itself() {
        let locator = MediaLocator::new("https://media.example.com");
        let mut album = album();
        album.tracks[0] = Track::new(1, "Ağıt", "Ağıt %100.mp3").in_album("hic-durmadan");
        let expected = locator.source_url(&album, &album.tracks[0]);
        let reported =
            "https://media.example.com/albums/1987-hic-durmadan/tracks/A%C4%9F%C4%B1t%20%100.mp3";

        assert!(MediaLocator::is_same_source(&expected, &expected));
        assert!(MediaLocator::is_same_source(reported, &expected));
    }

    #[test]
    fn undecodable_source_is_kept() {
        assert_eq!(decode_source("a%FFb"), "a%FFb");
    }
}
