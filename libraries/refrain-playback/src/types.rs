//! Core types for playback management

use crate::error::PlaybackErrorKind;
use crate::volume::VolumeCurve;
use refrain_core::{AlbumId, Track, DEFAULT_VOLUME};
use serde::{Deserialize, Serialize};

/// A request to move the playhead, applied at most once by the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekRequest {
    /// Target position in seconds
    pub position: f64,

    /// Monotonic request id
    pub id: u64,
}

/// Desired playback configuration, written by commands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackIntent {
    pub current_track: Option<Track>,
    pub want_playing: bool,

    /// Linear volume in `[0, 1]`
    pub want_volume: f32,

    pub want_seek_to: Option<SeekRequest>,
}

/// Observed playback state, written by device events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub is_playing: bool,
    pub is_loading: bool,

    /// Seconds, never above `duration` once `duration > 0`
    pub current_time: f64,

    /// Seconds, 0 while unknown
    pub duration: f64,

    pub last_error: Option<PlaybackErrorKind>,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self {
            is_playing: false,
            // Nothing is trustworthy until preferences and catalog are in
            is_loading: true,
            current_time: 0.0,
            duration: 0.0,
            last_error: None,
        }
    }
}

/// Whether a restored track/position pair has been re-applied to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RehydrationFlag {
    /// No restore happened this session
    Idle,

    /// Restored track is current, resume position not yet confirmed by the device
    Pending,

    /// Resume applied, skipped or superseded
    Resolved,
}

/// Lifecycle of the current track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackPhase {
    /// No track
    Idle,

    /// Track chosen, device not yet reporting on it
    Selecting,

    /// Device has (or is fetching) metadata
    Loading,

    /// Device can play
    Ready,

    Playing,
    Paused,

    /// Device reached the end of the track
    Ended,

    /// Load or playback failed; recoverable by retrying
    Error,
}

/// How urgently a transition's persisted fields should be written
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Persist {
    /// Nothing persisted changed
    Skip,

    /// Changed, but part of a burst (seek drag, time updates); write on settle
    Deferred,

    /// Write now
    Now,
}

/// Configuration for the playback machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume (0-100) before preferences are restored
    pub volume: u8,

    /// Perceptual curve between slider level and device gain
    pub volume_curve: VolumeCurve,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            volume_curve: VolumeCurve::Squared,
        }
    }
}

/// Canonical state handed to the UI after every transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub intent: PlaybackIntent,
    pub status: PlaybackStatus,
    pub phase: TrackPhase,
    pub rehydration: RehydrationFlag,

    /// Slider level (0-100)
    pub volume: u8,
    pub muted: bool,

    /// Album being browsed
    pub selected_album: Option<AlbumId>,

    /// Album owning the current track
    pub playing_album: Option<AlbumId>,

    pub is_first_track: bool,
    pub is_last_track: bool,
    pub catalog_loaded: bool,
}

impl PlaybackSnapshot {
    /// Transport controls are disabled while a restore is settling
    pub fn controls_enabled(&self) -> bool {
        self.rehydration != RehydrationFlag::Pending
    }
}
