//! Shared test infrastructure: a scriptable media device and catalog fixtures

#![allow(dead_code)]

use refrain_core::{Catalog, MediaLocator, Track};
use refrain_playback::{
    Action, DeviceEvent, DeviceEventSink, DeviceSubscription, MediaDevice, Persist, PlaybackConfig,
    PlaybackError, Player, ReadyState, Result,
};
use std::sync::{Arc, Mutex};

pub const BASE: &str = "https://media.test/music";

/// Two albums: three tracks, then two
pub const CATALOG_JSON: &str = r#"{
    "artist": "Grup Yorum",
    "totalAlbums": 2,
    "albums": [
        {
            "id": 1, "title": "Hiç Durmadan", "year": 1987, "slug": "hic-durmadan",
            "trackCount": 3,
            "tracks": [
                { "track": 1, "title": "Gündoğdu", "file": "01 Gundogdu.mp3" },
                { "track": 2, "title": "Hasretinden", "file": "02 Hasretinden.mp3" },
                { "track": 3, "title": "Bize Ölüm Yok", "file": "03 Bize Ölüm Yok.mp3" }
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

/// Commands the reconciler issued
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Load(String),
    Unload,
    Play,
    Pause,
    Seek(f64),
}

#[derive(Debug)]
struct Shared {
    ready_state: ReadyState,
    reject_play: Option<String>,
    calls: Vec<DeviceCall>,
    gain: f32,
}

/// Test-side handle to a [`MockDevice`] owned by the player
#[derive(Clone)]
pub struct MockHandle(Arc<Mutex<Shared>>);

impl MockHandle {
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.0.lock().unwrap().calls.clear();
    }

    pub fn loads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, DeviceCall::Load(_)))
            .count()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.calls()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Seek(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn set_ready_state(&self, state: ReadyState) {
        self.0.lock().unwrap().ready_state = state;
    }

    pub fn reject_play(&self, reason: Option<&str>) {
        self.0.lock().unwrap().reject_play = reason.map(str::to_string);
    }

    pub fn gain(&self) -> f32 {
        self.0.lock().unwrap().gain
    }
}

/// Media device that records commands and reports sources percent-encoded
pub struct MockDevice {
    source: Option<String>,
    paused: bool,
    position: f64,
    shared: Arc<Mutex<Shared>>,
    sink: Option<DeviceEventSink>,
}

impl MockDevice {
    pub fn new() -> (Self, MockHandle) {
        let shared = Arc::new(Mutex::new(Shared {
            ready_state: ReadyState::HaveNothing,
            reject_play: None,
            calls: Vec::new(),
            gain: 1.0,
        }));
        let device = Self {
            source: None,
            paused: true,
            position: 0.0,
            shared: Arc::clone(&shared),
            sink: None,
        };
        (device, MockHandle(shared))
    }

    fn record(&self, call: DeviceCall) {
        self.shared.lock().unwrap().calls.push(call);
    }
}

/// Encode the way a browser reports `src`: spaces and non-ASCII bytes escaped
pub fn browser_encode(url: &str) -> String {
    let mut out = String::new();
    for byte in url.bytes() {
        if byte == b' ' || byte >= 0x80 {
            out.push_str(&format!("%{:02X}", byte));
        } else {
            out.push(byte as char);
        }
    }
    out
}

impl MediaDevice for MockDevice {
    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn load(&mut self, url: &str) {
        self.record(DeviceCall::Load(url.to_string()));
        self.source = Some(browser_encode(url));
        self.paused = true;
        self.position = 0.0;
        self.shared.lock().unwrap().ready_state = ReadyState::HaveNothing;
    }

    fn unload(&mut self) {
        self.record(DeviceCall::Unload);
        self.source = None;
        self.paused = true;
    }

    fn play(&mut self) -> Result<()> {
        if self.source.is_none() {
            return Err(PlaybackError::NoSource);
        }
        let rejection = self.shared.lock().unwrap().reject_play.clone();
        if let Some(reason) = rejection {
            return Err(PlaybackError::Rejected(reason));
        }
        self.record(DeviceCall::Play);
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.record(DeviceCall::Pause);
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn seek(&mut self, position: f64) -> Result<()> {
        if self.shared.lock().unwrap().ready_state < ReadyState::HaveMetadata {
            return Err(PlaybackError::InvalidSeekPosition(position));
        }
        self.record(DeviceCall::Seek(position));
        self.position = position;
        Ok(())
    }

    fn set_volume(&mut self, gain: f32) {
        self.shared.lock().unwrap().gain = gain;
    }

    fn ready_state(&self) -> ReadyState {
        self.shared.lock().unwrap().ready_state
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn subscribe(&mut self) -> DeviceSubscription {
        let (sink, subscription) = DeviceSubscription::channel();
        self.sink = Some(sink);
        subscription
    }
}

// ===== Fixtures =====

pub fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_json(CATALOG_JSON).unwrap())
}

pub fn track(album: usize, index: usize) -> Track {
    catalog().albums()[album].tracks[index].clone()
}

pub fn url_of(track: &Track) -> String {
    MediaLocator::new(BASE)
        .source_for(&catalog(), track)
        .unwrap()
}

/// Player before anything has been restored or fetched
pub fn fresh_player() -> (Player<MockDevice>, MockHandle, DeviceSubscription) {
    let (device, handle) = MockDevice::new();
    let (player, subscription) =
        Player::new(PlaybackConfig::default(), MediaLocator::new(BASE), device);
    (player, handle, subscription)
}

/// Player with empty preferences and the catalog loaded
pub fn ready_player() -> (Player<MockDevice>, MockHandle, DeviceSubscription) {
    let (mut player, handle, subscription) = fresh_player();
    player.handle(Action::PreferencesRestored(None));
    player.handle(Action::CatalogLoaded(catalog()));
    player.drain_events();
    (player, handle, subscription)
}

// ===== Device scripting =====

fn device_source(player: &Player<MockDevice>) -> String {
    player.device().source().unwrap_or_default().to_string()
}

pub fn metadata(player: &mut Player<MockDevice>, handle: &MockHandle, duration: f64) {
    handle.set_ready_state(ReadyState::HaveMetadata);
    let source = device_source(player);
    player.handle(DeviceEvent::MetadataLoaded { source, duration });
}

pub fn can_play(player: &mut Player<MockDevice>, handle: &MockHandle) {
    handle.set_ready_state(ReadyState::HaveEnoughData);
    let source = device_source(player);
    player.handle(DeviceEvent::CanPlay { source });
}

pub fn playing(player: &mut Player<MockDevice>) {
    let source = device_source(player);
    player.handle(DeviceEvent::Playing { source });
}

pub fn ended(player: &mut Player<MockDevice>) -> Persist {
    let source = device_source(player);
    player.handle(DeviceEvent::Ended { source })
}

/// Drive the device through a full load of the current source, ending up playing
pub fn load_and_play(player: &mut Player<MockDevice>, handle: &MockHandle, duration: f64) {
    metadata(player, handle, duration);
    can_play(player, handle);
    playing(player);
}
