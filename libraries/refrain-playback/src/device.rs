//! Platform-agnostic media device trait
//!
//! Abstracts the audio element that actually fetches and plays a source. The
//! device is imperative (load, play, pause, seek) and reports asynchronously
//! through a [`DeviceSubscription`].

use crate::error::Result;
use crate::events::{DeviceEvent, ReadyState};
use std::time::Duration;
use tokio::sync::mpsc;

/// A single media element
///
/// Implementors report every state change as a [`DeviceEvent`] through the
/// sink handed out by [`MediaDevice::subscribe`]. Commands never report their
/// outcome synchronously except `play` and `seek`, which may fail up front.
pub trait MediaDevice: Send {
    /// Currently loaded source, as the device reports it (may be percent-encoded)
    fn source(&self) -> Option<&str>;

    /// Replace the source and start fetching it
    ///
    /// Resets position to 0 and ready state to `HaveNothing`.
    fn load(&mut self, url: &str);

    /// Drop the current source
    fn unload(&mut self);

    /// Start or resume playback
    ///
    /// # Returns
    /// * `Ok(())` - Request accepted; `Playing` follows once audio starts
    /// * `Err(_)` - Request refused (no source, gesture policy)
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// Move the playhead
    ///
    /// # Arguments
    /// * `position` - Target position in seconds
    fn seek(&mut self, position: f64) -> Result<()>;

    /// Set output gain in `[0, 1]`
    fn set_volume(&mut self, gain: f32);

    fn ready_state(&self) -> ReadyState;

    /// Current playhead in seconds
    fn position(&self) -> f64;

    /// Register the single event listener
    ///
    /// A second call replaces the previous listener, whose subscription then
    /// yields `None`.
    fn subscribe(&mut self) -> DeviceSubscription;

    /// Advance simulated time
    ///
    /// Real devices progress on their own and ignore this.
    fn tick(&mut self, _elapsed: Duration) {}
}

/// Sending half of a device event channel, held by the device
#[derive(Debug, Clone)]
pub struct DeviceEventSink {
    tx: mpsc::UnboundedSender<DeviceEvent>,
}

impl DeviceEventSink {
    /// Deliver an event
    ///
    /// Returns false once the subscription has been dropped.
    pub fn emit(&self, event: DeviceEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn is_subscribed(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Receiving half of a device event channel
///
/// Dropping the subscription detaches the listener; the device notices on its
/// next emit.
#[derive(Debug)]
pub struct DeviceSubscription {
    rx: mpsc::UnboundedReceiver<DeviceEvent>,
}

impl DeviceSubscription {
    /// Create a connected sink/subscription pair
    pub fn channel() -> (DeviceEventSink, DeviceSubscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        (DeviceEventSink { tx }, DeviceSubscription { rx })
    }

    /// Wait for the next event; `None` once the device dropped its sink
    pub async fn recv(&mut self) -> Option<DeviceEvent> {
        self.rx.recv().await
    }

    /// Next already-delivered event, if any
    pub fn try_recv(&mut self) -> Option<DeviceEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for DeviceSubscription {
    fn drop(&mut self) {
        self.rx.close();
        tracing::debug!("Device subscription released");
    }
}
