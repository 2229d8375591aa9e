//! Playback state machine
//!
//! A single reducer over [`Action`]. Commands write the intent, device events
//! write the observed status, and every transition reports how urgently the
//! persisted subset needs writing.
//!
//! The machine never talks to a device. [`crate::DeviceReconciler`] reads the
//! intent after each transition and drives the device towards it.

use crate::command::{Action, Command};
use crate::error::PlaybackErrorKind;
use crate::events::{DeviceEvent, PlayerEvent};
use crate::types::{
    Persist, PlaybackConfig, PlaybackIntent, PlaybackSnapshot, PlaybackStatus, RehydrationFlag,
    SeekRequest, TrackPhase,
};
use crate::volume::Volume;
use refrain_core::{Album, AlbumId, Catalog, MediaLocator, PersistedSnapshot, Track};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Authoritative playback state for one session
pub struct PlaybackMachine {
    locator: MediaLocator,
    catalog: Option<Arc<Catalog>>,

    intent: PlaybackIntent,
    status: PlaybackStatus,
    phase: TrackPhase,
    rehydration: RehydrationFlag,

    /// Saved position not yet handed to the device
    resume_at: Option<f64>,

    /// Track end advances to the next track
    auto_continue: bool,

    /// Device reported `CanPlay` for the current source
    ready: bool,

    preferences_restored: bool,
    volume: Volume,
    selected_album: Option<AlbumId>,

    /// Known durations keyed by `TrackKey` display form
    durations: HashMap<String, f64>,

    next_seek_id: u64,

    /// Derived URL of the current track, once the catalog can resolve it
    current_source: Option<String>,

    events: VecDeque<PlayerEvent>,
}

impl PlaybackMachine {
    pub fn new(config: PlaybackConfig, locator: MediaLocator) -> Self {
        let volume = Volume::new(config.volume, config.volume_curve);

        Self {
            locator,
            catalog: None,
            intent: PlaybackIntent {
                current_track: None,
                want_playing: false,
                want_volume: volume.linear(),
                want_seek_to: None,
            },
            status: PlaybackStatus::default(),
            phase: TrackPhase::Idle,
            rehydration: RehydrationFlag::Idle,
            resume_at: None,
            auto_continue: false,
            ready: false,
            preferences_restored: false,
            volume,
            selected_album: None,
            durations: HashMap::new(),
            next_seek_id: 1,
            current_source: None,
            events: VecDeque::new(),
        }
    }

    /// Apply one action
    ///
    /// Nothing is reported as persistable until the saved preferences have
    /// been restored, so the startup read is never clobbered.
    pub fn dispatch(&mut self, action: Action) -> Persist {
        let persist = match action {
            Action::Command(command) => self.on_command(command),
            Action::Device(event) => {
                if !self.is_current_source(event.source()) {
                    debug!(
                        event = event.name(),
                        source = event.source(),
                        "Ignoring event for a source that is no longer current"
                    );
                    return Persist::Skip;
                }
                self.on_device_event(event)
            }
            Action::CatalogLoaded(catalog) => self.on_catalog_loaded(catalog),
            Action::CatalogFailed(reason) => self.on_catalog_failed(&reason),
            Action::PreferencesRestored(snapshot) => self.on_preferences_restored(snapshot),
            Action::DurationsRestored(durations) => self.on_durations_restored(durations),
            Action::SeekApplied { id } => {
                if matches!(self.intent.want_seek_to, Some(request) if request.id == id) {
                    self.intent.want_seek_to = None;
                }
                Persist::Skip
            }
        };

        if self.preferences_restored {
            persist
        } else {
            Persist::Skip
        }
    }

    // ===== Commands =====

    fn on_command(&mut self, command: Command) -> Persist {
        let transport = matches!(
            command,
            Command::TogglePlayPause
                | Command::Seek(_)
                | Command::CommitSeek
                | Command::NextTrack
                | Command::PrevTrack
        );
        if transport && self.rehydration == RehydrationFlag::Pending {
            debug!(?command, "Transport locked while restoring saved track");
            return Persist::Skip;
        }

        match command {
            Command::SelectTrack { track, auto_play } => self.select_track(track, auto_play),
            Command::SelectAlbum(id) => self.select_album(id),
            Command::TogglePlayPause => self.toggle_play_pause(),
            Command::Seek(position) => self.seek(position),
            Command::CommitSeek => {
                if self.intent.current_track.is_some() {
                    Persist::Now
                } else {
                    Persist::Skip
                }
            }
            Command::SetVolume(level) => {
                self.volume.set_level(level);
                self.intent.want_volume = self.volume.linear();
                self.emit_volume();
                Persist::Now
            }
            Command::Mute => {
                self.volume.mute();
                self.emit_volume();
                Persist::Skip
            }
            Command::Unmute => {
                self.volume.unmute();
                self.emit_volume();
                Persist::Skip
            }
            Command::ToggleMute => {
                self.volume.toggle_mute();
                self.emit_volume();
                Persist::Skip
            }
            Command::NextTrack => self.advance(1),
            Command::PrevTrack => self.advance(-1),
        }
    }

    fn select_track(&mut self, track: Track, auto_play: bool) -> Persist {
        if let Some(current) = &self.intent.current_track {
            if current.is_same(&track) {
                if auto_play == self.intent.want_playing {
                    debug!(track = %track.key(), "Track already current");
                    return Persist::Skip;
                }
                if self.rehydration == RehydrationFlag::Pending {
                    debug!("Transport locked while restoring saved track");
                    return Persist::Skip;
                }
                return self.toggle_play_pause();
            }
        }

        if self.catalog_unavailable() {
            warn!(track = %track.key(), "Catalog unavailable, cannot select track");
            return Persist::Skip;
        }

        if let Some(catalog) = &self.catalog {
            if catalog.locate(&track).is_none() {
                warn!(track = %track.key(), "Selected track is not in the catalog");
                return Persist::Skip;
            }
        }

        let key = track.key();
        let previous = self.intent.current_track.replace(track);

        self.intent.want_playing = auto_play;
        self.intent.want_seek_to = None;
        self.auto_continue = auto_play;
        self.ready = false;

        self.status.is_playing = false;
        self.status.is_loading = true;
        self.status.last_error = None;
        self.status.current_time = 0.0;
        self.status.duration = self.durations.get(&key.to_string()).copied().unwrap_or(0.0);

        // A user choice supersedes any restore still in flight
        self.resolve_rehydration(false);
        self.resume_at = None;

        self.refresh_source();
        if let Some(album) = self.playing_album() {
            self.selected_album = Some(album.id);
        }

        info!(track = %key, auto_play, source = ?self.current_source, "Track selected");
        self.events.push_back(PlayerEvent::TrackChanged {
            track: Some(key),
            previous: previous.map(|t| t.key()),
        });
        self.set_phase(TrackPhase::Selecting);

        Persist::Now
    }

    fn select_album(&mut self, id: AlbumId) -> Persist {
        match &self.catalog {
            Some(catalog) if catalog.album(id).is_some() => {
                self.selected_album = Some(id);
            }
            Some(_) => warn!(album_id = id, "Unknown album"),
            None => debug!(album_id = id, "Catalog not loaded yet"),
        }
        Persist::Skip
    }

    fn toggle_play_pause(&mut self) -> Persist {
        if self.intent.current_track.is_none() {
            return Persist::Skip;
        }

        if !self.intent.want_playing && self.catalog_unavailable() {
            debug!("Catalog unavailable, nothing can be loaded");
            return Persist::Skip;
        }

        self.intent.want_playing = !self.intent.want_playing;
        if self.intent.want_playing {
            self.auto_continue = true;
            self.status.last_error = None;
            self.status.is_loading = !(self.ready || self.status.is_playing);
        } else {
            self.status.is_loading = false;
        }

        debug!(want_playing = self.intent.want_playing, "Play intent toggled");
        Persist::Skip
    }

    /// The catalog fetch failed, so no source can ever resolve
    fn catalog_unavailable(&self) -> bool {
        self.catalog.is_none() && self.status.last_error == Some(PlaybackErrorKind::CatalogFetch)
    }

    fn seek(&mut self, position: f64) -> Persist {
        if self.intent.current_track.is_none() || !position.is_finite() {
            return Persist::Skip;
        }

        let target = self.clamp_position(position);
        self.request_seek(target);
        self.events.push_back(PlayerEvent::PositionChanged {
            position: target,
            duration: self.status.duration,
        });

        Persist::Deferred
    }

    fn advance(&mut self, offset: isize) -> Persist {
        let Some(current) = self.intent.current_track.clone() else {
            return Persist::Skip;
        };
        let Some(catalog) = self.catalog.clone() else {
            debug!("Catalog not loaded yet");
            return Persist::Skip;
        };
        if catalog.locate(&current).is_none() {
            warn!(track = %current.key(), "Current track is not in the catalog");
            return Persist::Skip;
        }

        match catalog.neighbour(&current, offset) {
            Some(next) => self.select_track(next.clone(), true),
            None if offset > 0 => {
                info!(track = %current.key(), "End of album reached");
                self.intent.want_playing = false;
                self.auto_continue = false;
                Persist::Skip
            }
            None => Persist::Skip,
        }
    }

    // ===== Device events =====

    fn on_device_event(&mut self, event: DeviceEvent) -> Persist {
        match event {
            DeviceEvent::MetadataLoaded { duration, .. } => {
                if duration.is_finite() && duration > 0.0 {
                    self.status.duration = duration;
                    self.status.current_time = self.status.current_time.min(duration);
                    self.learn_duration(duration);
                }
                self.set_phase(TrackPhase::Loading);

                if self.rehydration == RehydrationFlag::Pending {
                    if let Some(saved) = self.resume_at.take() {
                        let target = self.clamp_position(saved);
                        if target > 0.0 {
                            info!(position = target, "Resuming saved position");
                            self.request_seek(target);
                        }
                    }
                } else {
                    self.status.is_loading = false;
                }
                Persist::Skip
            }
            DeviceEvent::CanPlay { .. } => {
                self.ready = true;
                if self.rehydration == RehydrationFlag::Pending {
                    if self.resume_at.is_some() {
                        return Persist::Skip;
                    }
                    self.resolve_rehydration(true);
                }
                self.status.is_loading = false;
                if !self.status.is_playing {
                    self.set_phase(TrackPhase::Ready);
                }
                Persist::Skip
            }
            DeviceEvent::Playing { .. } => {
                self.ready = true;
                self.status.is_playing = true;
                self.status.is_loading = false;
                self.status.last_error = None;
                if !self.intent.want_playing {
                    debug!("Device started playback on its own");
                    self.intent.want_playing = true;
                    self.auto_continue = true;
                }
                self.resolve_rehydration(true);
                self.set_phase(TrackPhase::Playing);
                Persist::Skip
            }
            DeviceEvent::Paused { .. } => {
                self.status.is_playing = false;
                if self.intent.want_playing {
                    debug!("Device paused playback");
                    self.intent.want_playing = false;
                }
                self.set_phase(TrackPhase::Paused);
                Persist::Skip
            }
            DeviceEvent::Waiting { .. } | DeviceEvent::Stalled { .. } => {
                self.status.is_loading = true;
                Persist::Skip
            }
            DeviceEvent::TimeUpdate { position, .. } => {
                if self.intent.want_seek_to.is_some()
                    || self.rehydration == RehydrationFlag::Pending
                    || !position.is_finite()
                {
                    return Persist::Skip;
                }
                self.status.current_time = self.clamp_position(position);
                Persist::Deferred
            }
            DeviceEvent::Ended { .. } => {
                self.status.is_playing = false;
                if self.status.duration > 0.0 {
                    self.status.current_time = self.status.duration;
                }
                self.set_phase(TrackPhase::Ended);

                let persist = if self.auto_continue {
                    self.advance(1)
                } else {
                    Persist::Skip
                };

                if self.phase == TrackPhase::Ended {
                    self.intent.want_playing = false;
                    self.auto_continue = false;
                    self.set_phase(TrackPhase::Idle);
                }
                persist
            }
            DeviceEvent::Error { kind, message, .. } => {
                warn!(
                    ?kind,
                    %message,
                    source = ?self.current_source,
                    "Device failed to load source"
                );
                self.status.last_error = Some(PlaybackErrorKind::Load);
                self.status.is_loading = false;
                self.status.is_playing = false;
                self.intent.want_playing = false;
                self.ready = false;
                self.resolve_rehydration(false);
                self.events.push_back(PlayerEvent::Error {
                    kind: PlaybackErrorKind::Load,
                    message,
                });
                self.set_phase(TrackPhase::Error);
                Persist::Skip
            }
            DeviceEvent::PlayRejected { reason, .. } => {
                warn!(%reason, "Device refused to play");
                self.status.last_error = Some(PlaybackErrorKind::PlaybackRejected);
                self.status.is_loading = false;
                self.status.is_playing = false;
                self.intent.want_playing = false;
                self.events.push_back(PlayerEvent::Error {
                    kind: PlaybackErrorKind::PlaybackRejected,
                    message: reason,
                });
                self.set_phase(TrackPhase::Error);
                Persist::Skip
            }
        }
    }

    // ===== Startup =====

    fn on_catalog_loaded(&mut self, catalog: Arc<Catalog>) -> Persist {
        info!(
            artist = catalog.artist(),
            albums = catalog.albums().len(),
            "Catalog loaded"
        );
        self.catalog = Some(catalog);

        let persist = self.align_with_catalog().max(self.select_default_track());
        self.settle_empty_loading();
        self.refresh_source();
        persist
    }

    fn on_catalog_failed(&mut self, reason: &str) -> Persist {
        error!(%reason, "Failed to load catalog");
        self.status.last_error = Some(PlaybackErrorKind::CatalogFetch);
        self.status.is_loading = false;
        self.resolve_rehydration(false);
        self.events.push_back(PlayerEvent::Error {
            kind: PlaybackErrorKind::CatalogFetch,
            message: reason.to_string(),
        });
        Persist::Skip
    }

    fn on_preferences_restored(&mut self, snapshot: Option<PersistedSnapshot>) -> Persist {
        if self.preferences_restored {
            warn!("Preferences already restored, ignoring second restore");
            return Persist::Skip;
        }
        self.preferences_restored = true;

        match snapshot {
            Some(snapshot) => {
                self.volume.set_level(snapshot.volume);
                self.intent.want_volume = self.volume.linear();
                self.emit_volume();

                if let Some(track) = snapshot.current_track {
                    if self.intent.current_track.is_none() {
                        self.begin_rehydration(track, snapshot.current_time);
                    }
                }
            }
            None => debug!("No saved preferences"),
        }

        let persist = self.align_with_catalog().max(self.select_default_track());
        self.settle_empty_loading();
        persist
    }

    fn on_durations_restored(&mut self, durations: HashMap<String, f64>) -> Persist {
        for (key, duration) in durations {
            if duration.is_finite() && duration > 0.0 {
                self.durations.entry(key).or_insert(duration);
            }
        }

        if self.status.duration == 0.0 {
            if let Some(track) = &self.intent.current_track {
                if let Some(&duration) = self.durations.get(&track.key().to_string()) {
                    self.status.duration = duration;
                    self.status.current_time = self.status.current_time.min(duration);
                }
            }
        }
        Persist::Skip
    }

    fn begin_rehydration(&mut self, track: Track, saved_time: f64) {
        let key = track.key();
        let position = if saved_time.is_finite() {
            saved_time.max(0.0)
        } else {
            0.0
        };
        info!(track = %key, position, "Restoring saved track");

        self.intent.current_track = Some(track);
        self.intent.want_playing = false;
        self.auto_continue = false;

        self.status.is_playing = false;
        self.status.is_loading = true;
        self.status.duration = self.durations.get(&key.to_string()).copied().unwrap_or(0.0);
        self.status.current_time = self.clamp_position(position);

        self.resume_at = Some(position);
        self.rehydration = RehydrationFlag::Pending;

        self.refresh_source();
        self.events.push_back(PlayerEvent::TrackChanged {
            track: Some(key),
            previous: None,
        });
        self.set_phase(TrackPhase::Loading);
    }

    /// Swap the current track for its catalog instance, or drop it if the
    /// catalog no longer has it
    fn align_with_catalog(&mut self) -> Persist {
        let (Some(catalog), Some(current)) =
            (self.catalog.clone(), self.intent.current_track.clone())
        else {
            return Persist::Skip;
        };

        match catalog.locate(&current) {
            Some((album, index)) => {
                self.intent.current_track = Some(album.tracks[index].clone());
                if self.selected_album.is_none() {
                    self.selected_album = Some(album.id);
                }
                self.refresh_source();
                Persist::Skip
            }
            None => {
                warn!(track = %current.key(), "Saved track is no longer in the catalog");
                self.events.push_back(PlayerEvent::Error {
                    kind: PlaybackErrorKind::RehydrationMismatch,
                    message: current.key().to_string(),
                });
                self.resolve_rehydration(false);
                self.clear_track();
                Persist::Now
            }
        }
    }

    /// Make the first catalog track current (paused) when nothing else is
    fn select_default_track(&mut self) -> Persist {
        if !self.preferences_restored || self.intent.current_track.is_some() {
            return Persist::Skip;
        }
        let Some(first) = self.catalog.as_ref().and_then(|c| c.first_track()).cloned() else {
            return Persist::Skip;
        };

        debug!(track = %first.key(), "Selecting default track");
        self.select_track(first, false)
    }

    /// Nothing can load without a track; stop showing a spinner once startup
    /// has nothing left to wait for
    fn settle_empty_loading(&mut self) {
        if self.preferences_restored
            && self.intent.current_track.is_none()
            && self.catalog.is_some()
        {
            self.status.is_loading = false;
        }
    }

    fn clear_track(&mut self) {
        let previous = self.intent.current_track.take();

        self.intent.want_playing = false;
        self.intent.want_seek_to = None;
        self.auto_continue = false;
        self.ready = false;
        self.resume_at = None;

        self.status.is_playing = false;
        self.status.is_loading = false;
        self.status.current_time = 0.0;
        self.status.duration = 0.0;

        self.refresh_source();
        self.events.push_back(PlayerEvent::TrackChanged {
            track: None,
            previous: previous.map(|t| t.key()),
        });
        self.set_phase(TrackPhase::Idle);
    }

    // ===== Helpers =====

    fn request_seek(&mut self, position: f64) {
        let id = self.next_seek_id;
        self.next_seek_id += 1;
        self.intent.want_seek_to = Some(SeekRequest { position, id });
        self.status.current_time = position;
    }

    fn clamp_position(&self, position: f64) -> f64 {
        let position = position.max(0.0);
        if self.status.duration > 0.0 {
            position.min(self.status.duration)
        } else {
            position
        }
    }

    fn resolve_rehydration(&mut self, resumed: bool) {
        if self.rehydration != RehydrationFlag::Pending {
            return;
        }
        self.rehydration = RehydrationFlag::Resolved;
        self.resume_at = None;
        info!(resumed, "Saved track restore settled");
        self.events
            .push_back(PlayerEvent::RehydrationResolved { resumed });
    }

    fn learn_duration(&mut self, duration: f64) {
        let Some(track) = &self.intent.current_track else {
            return;
        };
        let key = track.key();
        let cached = self.durations.insert(key.to_string(), duration);
        if !matches!(cached, Some(known) if (known - duration).abs() < 1e-6) {
            self.events.push_back(PlayerEvent::DurationLearned {
                track: key,
                duration,
            });
        }
    }

    fn refresh_source(&mut self) {
        self.current_source = match (&self.catalog, &self.intent.current_track) {
            (Some(catalog), Some(track)) => self.locator.source_for(catalog, track),
            _ => None,
        };
    }

    fn is_current_source(&self, source: &str) -> bool {
        self.current_source
            .as_deref()
            .is_some_and(|expected| MediaLocator::is_same_source(source, expected))
    }

    fn set_phase(&mut self, phase: TrackPhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, "Track phase changed");
            self.phase = phase;
            self.events.push_back(PlayerEvent::StateChanged { phase });
        }
    }

    fn emit_volume(&mut self) {
        self.events.push_back(PlayerEvent::VolumeChanged {
            level: self.volume.level(),
            muted: self.volume.is_muted(),
        });
    }

    // ===== Queries =====

    pub fn intent(&self) -> &PlaybackIntent {
        &self.intent
    }

    pub fn status(&self) -> &PlaybackStatus {
        &self.status
    }

    pub fn phase(&self) -> TrackPhase {
        self.phase
    }

    pub fn rehydration(&self) -> RehydrationFlag {
        self.rehydration
    }

    pub fn catalog(&self) -> Option<&Arc<Catalog>> {
        self.catalog.as_ref()
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// Gain the device should currently output
    pub fn device_gain(&self) -> f32 {
        self.volume.gain()
    }

    /// Derived URL of the current track
    pub fn current_source(&self) -> Option<&str> {
        self.current_source.as_deref()
    }

    pub fn durations(&self) -> &HashMap<String, f64> {
        &self.durations
    }

    pub fn preferences_restored(&self) -> bool {
        self.preferences_restored
    }

    /// Album owning the current track
    pub fn playing_album(&self) -> Option<&Album> {
        let track = self.intent.current_track.as_ref()?;
        self.catalog.as_ref()?.owning_album(track)
    }

    pub fn is_first_track(&self) -> bool {
        self.position_in_album()
            .is_some_and(|(index, _)| index == 0)
    }

    pub fn is_last_track(&self) -> bool {
        self.position_in_album()
            .is_some_and(|(index, len)| index + 1 == len)
    }

    fn position_in_album(&self) -> Option<(usize, usize)> {
        let track = self.intent.current_track.as_ref()?;
        let (album, index) = self.catalog.as_ref()?.locate(track)?;
        Some((index, album.tracks.len()))
    }

    /// Canonical state for rendering
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            intent: self.intent.clone(),
            status: self.status.clone(),
            phase: self.phase,
            rehydration: self.rehydration,
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            selected_album: self.selected_album,
            playing_album: self.playing_album().map(|album| album.id),
            is_first_track: self.is_first_track(),
            is_last_track: self.is_last_track(),
            catalog_loaded: self.catalog.is_some(),
        }
    }

    /// Subset that outlives the session
    pub fn persisted_snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            current_track: self.intent.current_track.clone(),
            current_time: self.status.current_time,
            volume: self.volume.level(),
        }
    }

    /// Take every queued outbound event
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        self.events.drain(..).collect()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }
}
