//! Refrain - Playback State
//!
//! Platform-agnostic playback state for Refrain.
//!
//! This crate provides:
//! - A playback state machine (single reducer over commands and device events)
//! - A device reconciler applying the machine's intent to a media device
//! - Startup restore of a saved track and position
//! - Volume control (perceptual curve, 0-100%, mute/unmute)
//! - In-album next/previous navigation
//!
//! # Architecture
//!
//! `refrain-playback` is platform-agnostic:
//! - No dependency on storage (the caller persists [`PersistedSnapshot`]s)
//! - No dependency on HTTP (the caller fetches the catalog)
//! - The media device is provided via the [`MediaDevice`] trait
//!
//! # Example
//!
//! ```rust
//! use refrain_playback::{Action, Command, PlaybackConfig, PlaybackMachine, Persist};
//! use refrain_core::MediaLocator;
//!
//! let mut machine = PlaybackMachine::new(
//!     PlaybackConfig::default(),
//!     MediaLocator::new("https://cdn.example.com/music"),
//! );
//! machine.dispatch(Action::PreferencesRestored(None));
//!
//! assert_eq!(machine.dispatch(Command::SetVolume(40).into()), Persist::Now);
//! assert_eq!(machine.persisted_snapshot().volume, 40);
//! ```

mod command;
mod device;
mod error;
mod events;
mod machine;
mod player;
mod reconciler;
pub mod types;
mod volume;

// Public exports
pub use command::{Action, Command};
pub use device::{DeviceEventSink, DeviceSubscription, MediaDevice};
pub use error::{PlaybackError, PlaybackErrorKind, Result};
pub use events::{DeviceEvent, MediaErrorKind, PlayerEvent, ReadyState};
pub use machine::PlaybackMachine;
pub use player::Player;
pub use reconciler::DeviceReconciler;
pub use types::{
    Persist, PlaybackConfig, PlaybackIntent, PlaybackSnapshot, PlaybackStatus, RehydrationFlag,
    SeekRequest, TrackPhase,
};
pub use volume::{Volume, VolumeCurve};

pub use refrain_core::PersistedSnapshot;
