//! End-to-end session tests against a mock server and in-memory preferences.

use refrain_client::{ClientConfig, RefrainClient};
use refrain_core::{PersistedSnapshot, Track};
use refrain_player::{PlayerConfig, Session, SessionView, UiCommand};
use refrain_playback::{Command, PlaybackErrorKind, RehydrationFlag, TrackPhase};
use refrain_storage::{snapshot, MemoryPreferences, PreferenceStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATALOG: &str = r#"{
    "artist": "Grup Yorum",
    "totalAlbums": 2,
    "albums": [
        {
            "id": 1, "title": "Hiç Durmadan", "year": 1987, "slug": "hic-durmadan",
            "trackCount": 2,
            "tracks": [
                { "track": 1, "title": "Gündoğdu", "file": "01 Gundogdu.mp3" },
                { "track": 2, "title": "Bize Ölüm Yok", "file": "02 Bize Ölüm Yok.mp3" }
            ]
        },
        {
            "id": 2, "title": "Cemo", "year": 1989, "slug": "cemo",
            "trackCount": 2,
            "tracks": [
                { "track": 1, "title": "Cemo", "file": "01.mp3" },
                { "track": 2, "title": "Gel Ki", "file": "02.mp3" }
            ]
        }
    ]
}"#;

struct Running {
    tx: mpsc::UnboundedSender<UiCommand>,
    handle: JoinHandle<refrain_player::Result<PersistedSnapshot>>,
}

impl Running {
    fn send(&self, command: UiCommand) {
        self.tx.send(command).unwrap();
    }

    async fn view(&self) -> SessionView {
        let (reply, response) = oneshot::channel();
        self.send(UiCommand::Status(reply));
        response.await.unwrap()
    }

    async fn wait_for(&self, what: &str, ready: impl Fn(&SessionView) -> bool) -> SessionView {
        for _ in 0..250 {
            let view = self.view().await;
            if ready(&view) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("timed out waiting for {}: {:?}", what, self.view().await.snapshot);
    }

    async fn quit(self) -> PersistedSnapshot {
        self.send(UiCommand::Quit);
        self.handle.await.unwrap().unwrap()
    }
}

async fn catalog_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/all_albums_metadata.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CATALOG))
        .mount(&server)
        .await;
    server
}

fn config_for(server: &MockServer) -> PlayerConfig {
    let mut config = PlayerConfig::default();
    config.server.url = server.uri();
    config.media.public_base = "https://media.test/music".to_string();
    config.device.tick_millis = 10;
    config.device.default_track_secs = 180.0;
    config.playback.snapshot_interval_secs = 1;
    config
}

fn start(config: PlayerConfig, store: Arc<MemoryPreferences>, token: Option<&str>) -> Running {
    let mut client_config = ClientConfig::new(config.server.url.clone());
    client_config.access_token = token.map(str::to_string);
    let client = RefrainClient::new(client_config).unwrap();

    let session = Session::new(config, store, client);
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(session.run(rx));
    Running { tx, handle }
}

fn file_of(track: &Option<Track>) -> Option<&str> {
    track.as_ref().map(|t| t.file_ref.as_str())
}

#[tokio::test]
async fn test_fresh_start_cues_first_track() {
    let server = catalog_server().await;
    let store = Arc::new(MemoryPreferences::new());
    let running = start(config_for(&server), Arc::clone(&store), None);

    let view = running
        .wait_for("default track", |v| v.snapshot.status.duration > 0.0)
        .await;

    assert_eq!(file_of(&view.snapshot.intent.current_track), Some("01 Gundogdu.mp3"));
    assert!(!view.snapshot.intent.want_playing);
    assert_eq!(view.snapshot.volume, 75);

    let last = running.quit().await;
    assert_eq!(file_of(&last.current_track), Some("01 Gundogdu.mp3"));

    let stored = snapshot::load_snapshot(store.as_ref()).await.unwrap().unwrap();
    assert_eq!(stored.current_track, last.current_track);
}

#[tokio::test]
async fn test_restores_saved_track_and_position() {
    let server = catalog_server().await;
    let store = Arc::new(MemoryPreferences::new());
    snapshot::save_snapshot(
        store.as_ref(),
        &PersistedSnapshot {
            current_track: Some(Track::new(2, "Gel Ki", "02.mp3").in_album("cemo")),
            current_time: 42.0,
            volume: 30,
        },
    )
    .await
    .unwrap();

    let running = start(config_for(&server), Arc::clone(&store), None);

    let view = running
        .wait_for("restore", |v| v.snapshot.rehydration == RehydrationFlag::Resolved)
        .await;

    assert_eq!(file_of(&view.snapshot.intent.current_track), Some("02.mp3"));
    assert_eq!(view.snapshot.status.current_time, 42.0);
    assert_eq!(view.snapshot.volume, 30);
    assert_eq!(view.snapshot.selected_album, Some(2));
    assert!(view.snapshot.is_last_track);
    assert!(view.snapshot.controls_enabled());

    let last = running.quit().await;
    assert_eq!(last.volume, 30);
    assert_eq!(last.current_time, 42.0);
}

#[tokio::test]
async fn test_play_and_volume_are_persisted() {
    let server = catalog_server().await;
    let store = Arc::new(MemoryPreferences::new());
    let running = start(config_for(&server), Arc::clone(&store), None);

    running
        .wait_for("default track", |v| v.snapshot.intent.current_track.is_some())
        .await;

    running.send(UiCommand::Select {
        album: 1,
        track: 2,
        play: true,
    });
    running.send(UiCommand::Playback(Command::SetVolume(40)));

    let view = running
        .wait_for("playback", |v| v.snapshot.phase == TrackPhase::Playing)
        .await;
    assert_eq!(file_of(&view.snapshot.intent.current_track), Some("02 Bize Ölüm Yok.mp3"));

    // Volume is written as soon as it changes.
    let stored = snapshot::load_snapshot(store.as_ref()).await.unwrap().unwrap();
    assert_eq!(stored.volume, 40);

    running.send(UiCommand::Playback(Command::TogglePlayPause));
    running
        .wait_for("pause", |v| v.snapshot.phase == TrackPhase::Paused)
        .await;

    running.quit().await;

    let durations = snapshot::load_durations(store.as_ref()).await.unwrap();
    assert_eq!(durations.get("hic-durmadan/02 Bize Ölüm Yok.mp3"), Some(&180.0));
}

#[tokio::test]
async fn test_catalog_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/all_albums_metadata.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryPreferences::new());
    let running = start(config_for(&server), store, None);

    let view = running
        .wait_for("catalog error", |v| v.snapshot.status.last_error.is_some())
        .await;

    assert_eq!(view.snapshot.status.last_error, Some(PlaybackErrorKind::CatalogFetch));
    assert!(!view.snapshot.status.is_loading);
    assert!(view.catalog.is_none());

    running.quit().await;
}

#[tokio::test]
async fn test_like_current_track() {
    let server = catalog_server().await;
    Mock::given(method("GET"))
        .and(path("/api/likes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "album_id": 2, "track_number": 1 }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/likes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "message": "Track liked successfully",
            "like": { "album_id": 1, "track_number": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryPreferences::new());
    let running = start(config_for(&server), store, Some("secret"));

    running
        .wait_for("likes and track", |v| {
            v.liked_count == 1 && v.snapshot.intent.current_track.is_some()
        })
        .await;

    running.send(UiCommand::ToggleLike);
    let view = running
        .wait_for("like", |v| v.liked && v.liked_count == 2)
        .await;
    assert!(view.liked);

    running.quit().await;
}

#[tokio::test]
async fn test_failed_like_is_reverted() {
    let server = catalog_server().await;
    Mock::given(method("GET"))
        .and(path("/api/likes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "album_id": 2, "track_number": 1 }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/likes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryPreferences::new());
    let running = start(config_for(&server), store, Some("secret"));

    running
        .wait_for("likes and track", |v| {
            v.liked_count == 1 && v.snapshot.intent.current_track.is_some()
        })
        .await;

    running.send(UiCommand::ToggleLike);
    let view = running
        .wait_for("revert", |v| !v.liked)
        .await;
    assert_eq!(view.liked_count, 1);

    let posts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method == wiremock::http::Method::Post)
        .count();
    assert_eq!(posts, 1);

    running.quit().await;
}

#[tokio::test]
async fn test_stored_preferences_are_not_overwritten_before_restore() {
    let server = catalog_server().await;
    let store = Arc::new(MemoryPreferences::new());
    let saved = PersistedSnapshot {
        current_track: Some(Track::new(1, "Cemo", "01.mp3").in_album("cemo")),
        current_time: 12.0,
        volume: 55,
    };
    snapshot::save_snapshot(store.as_ref(), &saved).await.unwrap();

    let running = start(config_for(&server), Arc::clone(&store), None);
    running
        .wait_for("restore", |v| v.snapshot.rehydration == RehydrationFlag::Resolved)
        .await;

    // Restoring writes nothing new.
    let stored = store.get(refrain_storage::SNAPSHOT_KEY).await.unwrap().unwrap();
    assert_eq!(stored["volume"], 55);
    assert_eq!(stored["currentTime"], 12.0);

    running.quit().await;
}
