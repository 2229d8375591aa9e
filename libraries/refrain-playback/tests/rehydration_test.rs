//! Startup restore of a saved track and position
//!
//! Catalog fetch, preference restore and device readiness complete
//! independently; these tests drive them in different orders.

mod common;

use common::*;
use refrain_core::{PersistedSnapshot, Track};
use refrain_playback::{
    Action, Command, DeviceEvent, MediaDevice, MediaErrorKind, Persist, PlayerEvent,
    RehydrationFlag, TrackPhase,
};

fn saved(track: Track, current_time: f64) -> PersistedSnapshot {
    PersistedSnapshot {
        current_track: Some(track),
        current_time,
        volume: 60,
    }
}

#[test]
fn resumes_saved_position_after_metadata() {
    let track_x = track(0, 1);
    let (mut player, handle, _sub) = fresh_player();

    player.handle(Action::PreferencesRestored(Some(saved(
        track_x.clone(),
        42.0,
    ))));

    // Track shown immediately, nothing loaded yet
    let snapshot = player.snapshot();
    assert!(snapshot
        .intent
        .current_track
        .as_ref()
        .unwrap()
        .is_same(&track_x));
    assert!(!snapshot.intent.want_playing);
    assert!(snapshot.status.is_loading);
    assert!(!snapshot.status.is_playing);
    assert_eq!(snapshot.rehydration, RehydrationFlag::Pending);
    assert!(!snapshot.controls_enabled());
    assert_eq!(snapshot.volume, 60);
    assert!(handle.calls().is_empty());

    player.handle(Action::CatalogLoaded(catalog()));
    assert_eq!(handle.calls(), vec![DeviceCall::Load(url_of(&track_x))]);
    assert!(player.machine().status().is_loading);
    assert!(!player.machine().status().is_playing);

    metadata(&mut player, &handle, 180.0);
    assert_eq!(handle.seeks(), vec![42.0]);
    assert!(player.machine().status().is_loading);
    assert!(!player.machine().status().is_playing);
    assert_eq!(player.machine().rehydration(), RehydrationFlag::Pending);

    can_play(&mut player, &handle);
    let snapshot = player.snapshot();
    assert!(!snapshot.status.is_loading);
    assert!(!snapshot.status.is_playing);
    assert_eq!(snapshot.status.current_time, 42.0);
    assert_eq!(snapshot.rehydration, RehydrationFlag::Resolved);
    assert!(snapshot.controls_enabled());
    assert!(!handle.calls().contains(&DeviceCall::Play));

    let events = player.drain_events();
    assert!(events.contains(&PlayerEvent::RehydrationResolved { resumed: true }));
}

#[test]
fn catalog_before_preferences_also_resumes() {
    let track_x = track(1, 1);
    let (mut player, handle, _sub) = fresh_player();

    player.handle(Action::CatalogLoaded(catalog()));
    assert!(player.machine().intent().current_track.is_none());
    assert!(player.machine().status().is_loading);

    player.handle(Action::PreferencesRestored(Some(saved(
        track_x.clone(),
        30.0,
    ))));
    assert_eq!(handle.calls(), vec![DeviceCall::Load(url_of(&track_x))]);

    metadata(&mut player, &handle, 120.0);
    can_play(&mut player, &handle);

    assert_eq!(handle.seeks(), vec![30.0]);
    assert_eq!(player.machine().rehydration(), RehydrationFlag::Resolved);
}

#[test]
fn saved_track_without_album_is_aligned_to_catalog() {
    let mut track_x = track(0, 0);
    track_x.album_ref = None;
    let (mut player, handle, _sub) = fresh_player();

    player.handle(Action::PreferencesRestored(Some(saved(track_x, 12.0))));
    player.handle(Action::CatalogLoaded(catalog()));

    let current = player.machine().intent().current_track.clone().unwrap();
    assert_eq!(current.album_ref.as_deref(), Some("hic-durmadan"));
    assert_eq!(handle.loads(), 1);
}

#[test]
fn transport_is_locked_while_restoring() {
    let (mut player, handle, _sub) = fresh_player();
    player.handle(Action::PreferencesRestored(Some(saved(track(0, 1), 42.0))));
    player.handle(Action::CatalogLoaded(catalog()));

    assert_eq!(player.handle(Command::TogglePlayPause), Persist::Skip);
    player.handle(Command::NextTrack);
    player.handle(Command::Seek(10.0));

    let snapshot = player.snapshot();
    assert!(!snapshot.intent.want_playing);
    assert!(snapshot.intent.current_track.unwrap().is_same(&track(0, 1)));
    assert_eq!(snapshot.status.current_time, 42.0);
    assert_eq!(handle.loads(), 1);
}

#[test]
fn missing_saved_track_skips_resume() {
    let gone = Track::new(9, "Removed", "gone.mp3").in_album("hic-durmadan");
    let (mut player, handle, _sub) = fresh_player();

    player.handle(Action::PreferencesRestored(Some(saved(gone, 42.0))));
    let persist = player.handle(Action::CatalogLoaded(catalog()));

    assert_eq!(persist, Persist::Now);
    assert_eq!(player.machine().rehydration(), RehydrationFlag::Resolved);
    assert!(player.machine().status().last_error.is_none());

    // Falls back to the first catalog track, paused
    let snapshot = player.snapshot();
    assert!(snapshot.intent.current_track.unwrap().is_same(&track(0, 0)));
    assert!(!snapshot.intent.want_playing);
    assert_eq!(snapshot.status.current_time, 0.0);

    metadata(&mut player, &handle, 180.0);
    assert!(handle.seeks().is_empty());
    assert!(!player.machine().status().is_loading);

    let events = player.drain_events();
    assert!(events.contains(&PlayerEvent::RehydrationResolved { resumed: false }));
}

#[test]
fn saved_position_beyond_duration_is_clamped() {
    let (mut player, handle, _sub) = fresh_player();
    player.handle(Action::PreferencesRestored(Some(saved(track(0, 2), 500.0))));
    player.handle(Action::CatalogLoaded(catalog()));

    metadata(&mut player, &handle, 180.0);
    assert_eq!(handle.seeks(), vec![180.0]);
    assert_eq!(player.machine().status().current_time, 180.0);
}

#[test]
fn saved_position_zero_resolves_without_seek() {
    let (mut player, handle, _sub) = fresh_player();
    player.handle(Action::PreferencesRestored(Some(saved(track(1, 0), 0.0))));
    player.handle(Action::CatalogLoaded(catalog()));

    metadata(&mut player, &handle, 180.0);
    can_play(&mut player, &handle);

    assert!(handle.seeks().is_empty());
    assert_eq!(player.machine().rehydration(), RehydrationFlag::Resolved);
    assert!(!player.machine().status().is_loading);
}

#[test]
fn load_error_while_restoring_resolves() {
    let (mut player, _handle, _sub) = fresh_player();
    player.handle(Action::PreferencesRestored(Some(saved(track(1, 0), 20.0))));
    player.handle(Action::CatalogLoaded(catalog()));

    let source = player.device().source().unwrap().to_string();
    player.handle(DeviceEvent::Error {
        source,
        kind: MediaErrorKind::SourceNotSupported,
        message: "unsupported".to_string(),
    });

    let snapshot = player.snapshot();
    assert_eq!(snapshot.rehydration, RehydrationFlag::Resolved);
    assert!(!snapshot.status.is_loading);
    assert_eq!(snapshot.phase, TrackPhase::Error);
}

#[test]
fn selecting_another_track_supersedes_restore() {
    let (mut player, handle, _sub) = fresh_player();
    player.handle(Action::PreferencesRestored(Some(saved(track(0, 1), 42.0))));
    player.handle(Action::CatalogLoaded(catalog()));

    player.handle(Command::SelectTrack {
        track: track(1, 1),
        auto_play: true,
    });
    assert_eq!(player.machine().rehydration(), RehydrationFlag::Resolved);

    metadata(&mut player, &handle, 180.0);
    assert!(handle.seeks().is_empty());
    assert_eq!(player.machine().status().current_time, 0.0);
}

#[test]
fn stale_metadata_does_not_trigger_resume() {
    let (mut player, handle, _sub) = fresh_player();
    player.handle(Action::PreferencesRestored(Some(saved(track(0, 1), 42.0))));
    player.handle(Action::CatalogLoaded(catalog()));

    handle.set_ready_state(refrain_playback::ReadyState::HaveMetadata);
    player.handle(DeviceEvent::MetadataLoaded {
        source: browser_encode(&url_of(&track(0, 0))),
        duration: 200.0,
    });

    assert!(handle.seeks().is_empty());
    assert_eq!(player.machine().rehydration(), RehydrationFlag::Pending);
    assert_eq!(player.machine().status().duration, 0.0);
}

#[test]
fn restore_happens_once() {
    let (mut player, _handle, _sub) = fresh_player();
    player.handle(Action::PreferencesRestored(None));
    player.handle(Action::PreferencesRestored(Some(saved(track(0, 1), 42.0))));
    player.handle(Action::CatalogLoaded(catalog()));

    let current = player.machine().intent().current_track.clone().unwrap();
    assert!(current.is_same(&track(0, 0)));
    assert_eq!(player.machine().rehydration(), RehydrationFlag::Idle);
}

#[test]
fn catalog_failure_keeps_restored_track_idle() {
    let (mut player, handle, _sub) = fresh_player();
    player.handle(Action::PreferencesRestored(Some(saved(track(0, 1), 42.0))));
    player.handle(Action::CatalogFailed("offline".to_string()));

    player.handle(Command::TogglePlayPause);
    player.handle(Command::SelectTrack {
        track: track(1, 0),
        auto_play: true,
    });

    let snapshot = player.snapshot();
    assert!(!snapshot.intent.want_playing);
    assert!(!snapshot.status.is_loading);
    assert!(!snapshot.status.is_playing);
    assert_eq!(
        snapshot.status.last_error,
        Some(refrain_playback::PlaybackErrorKind::CatalogFetch)
    );
    assert!(snapshot.intent.current_track.unwrap().is_same(&track(0, 1)));
    assert!(handle.calls().is_empty());
}
