//! Player session
//!
//! One task owns the player. Console commands, device events, finished
//! background work and timers all arrive on channels and are applied in
//! order, so the playback machine never sees two actions at once.

use crate::config::PlayerConfig;
use crate::device::SimulatedDevice;
use crate::error::{AppError, Result};
use refrain_client::{LikeKey, LikedSet, RefrainClient};
use refrain_core::{AlbumId, Catalog, MediaLocator, PersistedSnapshot};
use refrain_playback::{
    Action, Command, DeviceSubscription, Persist, PlaybackSnapshot, Player, PlayerEvent,
};
use refrain_storage::{snapshot, PreferenceStore, SnapshotWriter};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Requests from the console
#[derive(Debug)]
pub enum UiCommand {
    /// Forwarded to the playback machine as is
    Playback(Command),

    /// Select a track by 1-based album and track position in the catalog
    Select {
        album: usize,
        track: usize,
        play: bool,
    },

    /// Browse an album by 1-based catalog position
    Browse(usize),

    /// Like or unlike the current track
    ToggleLike,

    /// Reload likes from the server
    RefreshLikes,

    Status(oneshot::Sender<SessionView>),

    Quit,
}

/// What the console renders
#[derive(Debug, Clone)]
pub struct SessionView {
    pub snapshot: PlaybackSnapshot,
    pub catalog: Option<Arc<Catalog>>,

    /// Whether the current track is in the liked set
    pub liked: bool,
    pub liked_count: usize,
}

/// Background work that finished
#[derive(Debug)]
enum Completion {
    Restored {
        snapshot: Option<PersistedSnapshot>,
        durations: HashMap<String, f64>,
    },
    Catalog(std::result::Result<Catalog, String>),
    Likes(Vec<LikeKey>),
    LikeSettled {
        key: LikeKey,
        liked: bool,
        succeeded: bool,
    },
}

pub struct Session {
    config: PlayerConfig,
    player: Player<SimulatedDevice>,
    device_events: DeviceSubscription,
    store: Arc<dyn PreferenceStore>,
    client: RefrainClient,
    writer: SnapshotWriter,
    liked: LikedSet,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl Session {
    pub fn new(config: PlayerConfig, store: Arc<dyn PreferenceStore>, client: RefrainClient) -> Self {
        let device = SimulatedDevice::new(config.device.default_track_secs);
        let (player, device_events) = Player::new(
            config.playback_config(),
            MediaLocator::new(config.media.public_base.clone()),
            device,
        );
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let writer = SnapshotWriter::new(config.playback.position_save_threshold_secs);

        Self {
            config,
            player,
            device_events,
            store,
            client,
            writer,
            liked: LikedSet::new(),
            completions_tx,
            completions_rx,
        }
    }

    /// Run until `Quit` or the command channel closes
    ///
    /// Returns the snapshot written on the way out.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<UiCommand>,
    ) -> Result<PersistedSnapshot> {
        self.start_background_work().await;

        let tick_interval = self.config.tick_interval();
        let mut device_clock = interval(tick_interval);
        device_clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut snapshot_clock = interval(self.config.snapshot_interval());
        snapshot_clock.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Session started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(UiCommand::Quit) => break,
                    Some(command) => self.on_ui_command(command).await,
                },
                Some(event) = self.device_events.recv() => {
                    self.apply(event).await;
                }
                Some(completion) = self.completions_rx.recv() => {
                    self.on_completion(completion).await;
                }
                _ = device_clock.tick() => {
                    self.player.tick(tick_interval);
                }
                _ = snapshot_clock.tick() => {
                    if let Some(snapshot) = self.writer.tick() {
                        self.save(&snapshot).await;
                    }
                }
            }
        }

        self.shutdown().await
    }

    async fn start_background_work(&self) {
        let store = Arc::clone(&self.store);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let snapshot = snapshot::load_snapshot(store.as_ref())
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Could not read saved player state");
                    None
                });
            let durations = snapshot::load_durations(store.as_ref())
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Could not read duration cache");
                    HashMap::new()
                });
            let _ = tx.send(Completion::Restored {
                snapshot,
                durations,
            });
        });

        let client = self.client.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_catalog().await.map_err(|e| e.to_string());
            let _ = tx.send(Completion::Catalog(result));
        });

        if self.client.is_authenticated().await {
            self.spawn_likes_refresh();
        }
    }

    fn spawn_likes_refresh(&self) {
        let client = self.client.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            match client.likes().await {
                Ok(keys) => {
                    let _ = tx.send(Completion::Likes(keys));
                }
                Err(e) => warn!(error = %e, "Could not load likes"),
            }
        });
    }

    async fn on_ui_command(&mut self, command: UiCommand) {
        match command {
            UiCommand::Playback(command) => self.apply(command).await,
            UiCommand::Select { album, track, play } => {
                let Some(selected) = self.track_at(album, track) else {
                    warn!(album, track, "No such track");
                    return;
                };
                self.apply(Command::SelectTrack {
                    track: selected,
                    auto_play: play,
                })
                .await;
            }
            UiCommand::Browse(album) => match self.album_id_at(album) {
                Some(id) => self.apply(Command::SelectAlbum(id)).await,
                None => warn!(album, "No such album"),
            },
            UiCommand::ToggleLike => self.toggle_like().await,
            UiCommand::RefreshLikes => {
                if self.client.is_authenticated().await {
                    self.spawn_likes_refresh();
                } else {
                    warn!("Sign in to load likes");
                }
            }
            UiCommand::Status(reply) => {
                let _ = reply.send(self.view());
            }
            UiCommand::Quit => {}
        }
    }

    async fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Restored {
                snapshot,
                durations,
            } => {
                debug!(restored = snapshot.is_some(), cached_durations = durations.len(), "Preferences read");
                self.writer = SnapshotWriter::new(self.config.playback.position_save_threshold_secs)
                    .with_baseline(snapshot.clone());
                self.apply(Action::DurationsRestored(durations)).await;
                self.apply(Action::PreferencesRestored(snapshot)).await;
            }
            Completion::Catalog(Ok(catalog)) => {
                self.apply(Action::CatalogLoaded(Arc::new(catalog))).await;
            }
            Completion::Catalog(Err(reason)) => {
                error!(reason = %reason, "Catalog unavailable");
                self.apply(Action::CatalogFailed(reason)).await;
            }
            Completion::Likes(keys) => {
                self.liked.replace(keys);
                info!(count = self.liked.len(), "Likes loaded");
            }
            Completion::LikeSettled {
                key,
                liked,
                succeeded,
            } => self.liked.settle(key, liked, succeeded),
        }
    }

    /// Hand an action to the player, then persist and report what changed
    async fn apply(&mut self, action: impl Into<Action>) {
        let persist = self.player.handle(action);

        match persist {
            Persist::Skip => {}
            Persist::Deferred => self.writer.stage(self.player.persisted_snapshot()),
            Persist::Now => {
                self.writer.stage(self.player.persisted_snapshot());
                if let Some(snapshot) = self.writer.commit() {
                    self.save(&snapshot).await;
                }
            }
        }

        for event in self.player.drain_events() {
            self.on_player_event(event).await;
        }
    }

    async fn on_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::TrackChanged { track, .. } => match track {
                Some(track) => info!(track = %track, "Now selected"),
                None => info!("No track selected"),
            },
            PlayerEvent::StateChanged { phase } => debug!(?phase, "Phase changed"),
            PlayerEvent::PositionChanged { position, duration } => {
                debug!(position, duration, "Position changed");
            }
            PlayerEvent::VolumeChanged { level, muted } => info!(level, muted, "Volume changed"),
            PlayerEvent::DurationLearned { track, duration } => {
                debug!(track = %track, duration, "Caching duration");
                let durations = self.player.machine().durations().clone();
                if let Err(e) = snapshot::save_durations(self.store.as_ref(), &durations).await {
                    warn!(error = %e, "Could not save duration cache");
                }
            }
            PlayerEvent::RehydrationResolved { resumed } => {
                info!(resumed, "Saved track restored");
            }
            PlayerEvent::Error { kind, message } => warn!(?kind, message = %message, "{}", kind),
        }
    }

    async fn toggle_like(&mut self) {
        let Some(key) = self.current_like_key() else {
            warn!("No track to like");
            return;
        };
        if !self.client.is_authenticated().await {
            warn!("Sign in to like tracks");
            return;
        }

        let liked = self.liked.toggle(key);
        let client = self.client.clone();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let succeeded = match client.set_liked(key, liked).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Like request failed");
                    false
                }
            };
            let _ = tx.send(Completion::LikeSettled {
                key,
                liked,
                succeeded,
            });
        });
    }

    async fn save(&self, snapshot: &PersistedSnapshot) {
        debug!(
            time = snapshot.current_time,
            volume = snapshot.volume,
            "Saving player state"
        );
        if let Err(e) = snapshot::save_snapshot(self.store.as_ref(), snapshot).await {
            warn!(error = %e, "Could not save player state");
        }
    }

    async fn shutdown(mut self) -> Result<PersistedSnapshot> {
        let last = self.player.persisted_snapshot();
        if self.player.machine().preferences_restored() {
            self.writer.stage(last.clone());
            if let Some(snapshot) = self.writer.flush() {
                snapshot::save_snapshot(self.store.as_ref(), &snapshot)
                    .await
                    .map_err(AppError::from)?;
            }
        }
        info!("Session ended");
        Ok(last)
    }

    fn view(&self) -> SessionView {
        SessionView {
            snapshot: self.player.snapshot(),
            catalog: self.player.machine().catalog().cloned(),
            liked: self
                .current_like_key()
                .is_some_and(|key| self.liked.contains(&key)),
            liked_count: self.liked.len(),
        }
    }

    fn current_like_key(&self) -> Option<LikeKey> {
        let machine = self.player.machine();
        let track = machine.intent().current_track.as_ref()?;
        let album = machine.playing_album()?;
        Some(LikeKey::new(album.id, track.index))
    }

    fn track_at(&self, album: usize, track: usize) -> Option<refrain_core::Track> {
        let catalog = self.player.machine().catalog()?;
        let album = catalog.albums().get(album.checked_sub(1)?)?;
        album.tracks.get(track.checked_sub(1)?).cloned()
    }

    fn album_id_at(&self, album: usize) -> Option<AlbumId> {
        let catalog = self.player.machine().catalog()?;
        catalog.albums().get(album.checked_sub(1)?).map(|a| a.id)
    }
}
