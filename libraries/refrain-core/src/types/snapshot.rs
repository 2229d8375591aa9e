//! Persisted subset of player state

use super::Track;
use serde::{Deserialize, Serialize};

/// Volume used when nothing has been persisted yet (0-100)
pub const DEFAULT_VOLUME: u8 = 75;

/// State that survives a full reload
///
/// Written on every mutation of these fields, read once at startup. Transient
/// status (loading/playing flags, errors) is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub current_track: Option<Track>,

    /// Seconds into `current_track`
    #[serde(default)]
    pub current_time: f64,

    /// Linear volume (0-100) as shown on the slider
    #[serde(default = "default_volume")]
    pub volume: u8,
}

fn default_volume() -> u8 {
    DEFAULT_VOLUME
}

impl Default for PersistedSnapshot {
    fn default() -> Self {
        Self {
            current_track: None,
            current_time: 0.0,
            volume: DEFAULT_VOLUME,
        }
    }
}
