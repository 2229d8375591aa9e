//! Headless media device
//!
//! Behaves like a browser audio element with a perfect network: metadata
//! arrives one tick after a load, playability one tick later, and the
//! playhead advances with simulated time. Sources are reported the way a
//! browser normalises them (percent-encoded).

use refrain_playback::{
    DeviceEvent, DeviceEventSink, DeviceSubscription, MediaDevice, PlaybackError, ReadyState,
    Result,
};
use std::time::Duration;
use tracing::{debug, trace};

pub struct SimulatedDevice {
    source: Option<String>,
    ready_state: ReadyState,
    paused: bool,
    position: f64,
    gain: f32,

    /// Length reported for every source
    track_secs: f64,

    sink: Option<DeviceEventSink>,
}

impl SimulatedDevice {
    pub fn new(track_secs: f64) -> Self {
        Self {
            source: None,
            ready_state: ReadyState::HaveNothing,
            paused: true,
            position: 0.0,
            gain: 1.0,
            track_secs,
            sink: None,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    fn emit(&mut self, event: DeviceEvent) {
        let Some(sink) = &self.sink else {
            return;
        };
        trace!(event = event.name(), "Device event");
        if !sink.emit(event) {
            debug!("Device listener gone");
            self.sink = None;
        }
    }

    fn current_source(&self) -> Result<String> {
        self.source.clone().ok_or(PlaybackError::NoSource)
    }
}

/// Percent-encode a URL the way a browser does when assigning `src`
fn normalise_source(url: &str) -> String {
    url::Url::parse(url).map_or_else(|_| url.to_string(), String::from)
}

impl MediaDevice for SimulatedDevice {
    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn load(&mut self, url: &str) {
        let source = normalise_source(url);
        debug!(source = %source, "Loading source");
        self.source = Some(source);
        self.ready_state = ReadyState::HaveNothing;
        self.paused = true;
        self.position = 0.0;
    }

    fn unload(&mut self) {
        debug!("Unloading source");
        self.source = None;
        self.ready_state = ReadyState::HaveNothing;
        self.paused = true;
        self.position = 0.0;
    }

    fn play(&mut self) -> Result<()> {
        let source = self.current_source()?;
        if !self.paused {
            return Ok(());
        }
        self.paused = false;
        if self.ready_state >= ReadyState::HaveFutureData {
            self.emit(DeviceEvent::Playing { source });
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        if let Some(source) = self.source.clone() {
            self.emit(DeviceEvent::Paused { source });
        }
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn seek(&mut self, position: f64) -> Result<()> {
        let source = self.current_source()?;
        if self.ready_state < ReadyState::HaveMetadata {
            return Err(PlaybackError::InvalidSeekPosition(position));
        }
        self.position = position.clamp(0.0, self.track_secs);
        self.emit(DeviceEvent::TimeUpdate {
            source,
            position: self.position,
        });
        Ok(())
    }

    fn set_volume(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn subscribe(&mut self) -> DeviceSubscription {
        let (sink, subscription) = DeviceSubscription::channel();
        self.sink = Some(sink);
        subscription
    }

    fn tick(&mut self, elapsed: Duration) {
        let Some(source) = self.source.clone() else {
            return;
        };

        match self.ready_state {
            ReadyState::HaveNothing => {
                self.ready_state = ReadyState::HaveMetadata;
                self.emit(DeviceEvent::MetadataLoaded {
                    source,
                    duration: self.track_secs,
                });
                return;
            }
            ReadyState::HaveMetadata | ReadyState::HaveCurrentData => {
                self.ready_state = ReadyState::HaveEnoughData;
                self.emit(DeviceEvent::CanPlay {
                    source: source.clone(),
                });
                if !self.paused {
                    self.emit(DeviceEvent::Playing { source });
                }
                return;
            }
            ReadyState::HaveFutureData | ReadyState::HaveEnoughData => {}
        }

        if self.paused {
            return;
        }

        self.position = (self.position + elapsed.as_secs_f64()).min(self.track_secs);
        self.emit(DeviceEvent::TimeUpdate {
            source: source.clone(),
            position: self.position,
        });

        if self.position >= self.track_secs {
            self.paused = true;
            self.emit(DeviceEvent::Ended { source });
        }
    }
}
