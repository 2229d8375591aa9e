//! Commands and actions accepted by the playback machine

use crate::events::DeviceEvent;
use refrain_core::{AlbumId, Catalog, PersistedSnapshot, Track};
use std::collections::HashMap;
use std::sync::Arc;

/// User-facing commands
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Make `track` current
    ///
    /// When `track` is already current this does not reload: if `auto_play`
    /// differs from the current play intent it toggles play/pause, otherwise it
    /// is a no-op. Clicking the playing track with `auto_play = false`
    /// therefore pauses it.
    SelectTrack { track: Track, auto_play: bool },

    /// Browse an album without touching playback
    SelectAlbum(AlbumId),

    /// Flip the play intent; ignored without a current track
    TogglePlayPause,

    /// Move the playhead (seconds); the UI reflects it immediately
    Seek(f64),

    /// End of a seek drag; persist the settled position
    CommitSeek,

    /// Slider level (0-100)
    SetVolume(u8),

    Mute,
    Unmute,
    ToggleMute,

    /// Next track in the current album; stops at the last one
    NextTrack,

    /// Previous track in the current album; no-op at the first one
    PrevTrack,
}

/// Everything that can drive a transition
#[derive(Debug, Clone)]
pub enum Action {
    Command(Command),
    Device(DeviceEvent),

    /// Catalog document fetched and parsed
    CatalogLoaded(Arc<Catalog>),

    /// Catalog fetch failed; the catalog stays absent
    CatalogFailed(String),

    /// Startup read of persisted state finished (`None`: nothing stored)
    PreferencesRestored(Option<PersistedSnapshot>),

    /// Cached track durations keyed by `TrackKey` display form
    DurationsRestored(HashMap<String, f64>),

    /// The reconciler handed seek request `id` to the device
    SeekApplied { id: u64 },
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        Self::Command(command)
    }
}

impl From<DeviceEvent> for Action {
    fn from(event: DeviceEvent) -> Self {
        Self::Device(event)
    }
}
