//! Playback Events
//!
//! Two directions:
//! - [`DeviceEvent`]: what the media device reports, fed into the machine
//! - [`PlayerEvent`]: what the machine reports outward for rendering and logging

use crate::error::PlaybackErrorKind;
use crate::types::TrackPhase;
use refrain_core::TrackKey;
use serde::{Deserialize, Serialize};

/// How much of the source the device has buffered
///
/// Ordered: a seek is only accepted from `HaveMetadata` upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

/// Why a device failed to load a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaErrorKind {
    Aborted,
    Network,
    Decode,
    SourceNotSupported,
}

/// Events emitted by a media device
///
/// Every event names the source it is about so events for an abandoned source
/// can be told apart from events for the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceEvent {
    /// Duration and dimensions known; seeks are now accepted
    MetadataLoaded { source: String, duration: f64 },

    /// Enough data to start playing
    CanPlay { source: String },

    /// Audio is actually coming out
    Playing { source: String },

    Paused { source: String },

    /// Playback stopped to buffer
    Waiting { source: String },

    /// Network fetch stalled
    Stalled { source: String },

    /// Playhead moved during normal playback
    TimeUpdate { source: String, position: f64 },

    /// Reached the end of the source
    Ended { source: String },

    /// Source could not be loaded or decoded
    Error {
        source: String,
        kind: MediaErrorKind,
        message: String,
    },

    /// A `play()` attempt was refused
    PlayRejected { source: String, reason: String },
}

impl DeviceEvent {
    /// Source the event is about, as reported by the device
    pub fn source(&self) -> &str {
        match self {
            Self::MetadataLoaded { source, .. }
            | Self::CanPlay { source }
            | Self::Playing { source }
            | Self::Paused { source }
            | Self::Waiting { source }
            | Self::Stalled { source }
            | Self::TimeUpdate { source, .. }
            | Self::Ended { source }
            | Self::Error { source, .. }
            | Self::PlayRejected { source, .. } => source,
        }
    }

    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::MetadataLoaded { .. } => "metadata_loaded",
            Self::CanPlay { .. } => "can_play",
            Self::Playing { .. } => "playing",
            Self::Paused { .. } => "paused",
            Self::Waiting { .. } => "waiting",
            Self::Stalled { .. } => "stalled",
            Self::TimeUpdate { .. } => "time_update",
            Self::Ended { .. } => "ended",
            Self::Error { .. } => "error",
            Self::PlayRejected { .. } => "play_rejected",
        }
    }
}

/// Events emitted by the playback machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Current track changed
    TrackChanged {
        track: Option<TrackKey>,
        previous: Option<TrackKey>,
    },

    /// Track lifecycle phase changed
    StateChanged { phase: TrackPhase },

    /// Playhead moved by a seek
    PositionChanged { position: f64, duration: f64 },

    VolumeChanged { level: u8, muted: bool },

    /// Device reported a duration worth caching
    DurationLearned { track: TrackKey, duration: f64 },

    /// Startup restore settled
    RehydrationResolved { resumed: bool },

    /// Error folded into status
    Error {
        kind: PlaybackErrorKind,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state_ordering() {
        assert!(ReadyState::HaveNothing < ReadyState::HaveMetadata);
        assert!(ReadyState::HaveEnoughData > ReadyState::HaveMetadata);
    }

    #[test]
    fn every_event_exposes_its_source() {
        let src = "https://media/a.mp3".to_string();
        let events = [
            DeviceEvent::MetadataLoaded { source: src.clone(), duration: 1.0 },
            DeviceEvent::CanPlay { source: src.clone() },
            DeviceEvent::Playing { source: src.clone() },
            DeviceEvent::Paused { source: src.clone() },
            DeviceEvent::Waiting { source: src.clone() },
            DeviceEvent::Stalled { source: src.clone() },
            DeviceEvent::TimeUpdate { source: src.clone(), position: 0.5 },
            DeviceEvent::Ended { source: src.clone() },
            DeviceEvent::Error {
                source: src.clone(),
                kind: MediaErrorKind::Network,
                message: "offline".to_string(),
            },
            DeviceEvent::PlayRejected { source: src.clone(), reason: "gesture".to_string() },
        ];

        for event in &events {
            assert_eq!(event.source(), src, "{}", event.name());
        }
    }
}
