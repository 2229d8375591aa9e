//! Device reconciler
//!
//! Drives a [`MediaDevice`] towards the machine's intent. Runs after every
//! transition and only touches the device where intent and device differ, so
//! unrelated transitions never interrupt playback.

use crate::command::Action;
use crate::device::MediaDevice;
use crate::events::{DeviceEvent, ReadyState};
use crate::machine::PlaybackMachine;
use refrain_core::MediaLocator;
use tracing::{debug, info, trace, warn};

/// Exclusive owner of the media device
pub struct DeviceReconciler<D: MediaDevice> {
    device: D,

    /// Last seek request handed to the device
    applied_seek: Option<u64>,

    /// Source that last reported a load error, as the device reported it
    failed_source: Option<String>,
}

impl<D: MediaDevice> DeviceReconciler<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            applied_seek: None,
            failed_source: None,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub(crate) fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Note device facts the machine does not track
    pub fn observe(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::Error { source, .. } = event {
            self.failed_source = Some(source.clone());
        }
    }

    /// Bring the device in line with the machine
    ///
    /// Returns follow-up actions describing what the device did synchronously
    /// (seek accepted, play refused), to be dispatched back into the machine.
    pub fn reconcile(&mut self, machine: &PlaybackMachine) -> Vec<Action> {
        let mut follow_up = Vec::new();
        let intent = machine.intent();

        self.device.set_volume(machine.device_gain());
        self.sync_source(machine);

        if let Some(request) = intent.want_seek_to {
            if self.applied_seek != Some(request.id)
                && self.device.source().is_some()
                && self.device.ready_state() >= ReadyState::HaveMetadata
            {
                match self.device.seek(request.position) {
                    Ok(()) => {
                        debug!(position = request.position, id = request.id, "Seek applied");
                        self.applied_seek = Some(request.id);
                        follow_up.push(Action::SeekApplied { id: request.id });
                    }
                    Err(e) => warn!(position = request.position, error = %e, "Seek refused"),
                }
            }
        }

        if intent.want_playing {
            match self.device.source().map(str::to_string) {
                Some(source) if self.device.is_paused() => {
                    if let Err(e) = self.device.play() {
                        follow_up.push(Action::Device(DeviceEvent::PlayRejected {
                            source,
                            reason: e.to_string(),
                        }));
                    }
                }
                Some(_) => {}
                None => trace!("Play deferred until a source is loaded"),
            }
        } else if !self.device.is_paused() {
            self.device.pause();
        }

        follow_up
    }

    fn sync_source(&mut self, machine: &PlaybackMachine) {
        match machine.current_source() {
            Some(expected) => {
                let loaded = self
                    .device
                    .source()
                    .is_some_and(|current| MediaLocator::is_same_source(current, expected));
                let retry = machine.intent().want_playing
                    && self
                        .failed_source
                        .as_deref()
                        .is_some_and(|failed| MediaLocator::is_same_source(failed, expected));

                if !loaded || retry {
                    info!(source = expected, retry, "Loading source");
                    self.device.load(expected);
                    self.applied_seek = None;
                    self.failed_source = None;
                }
            }
            // Track known but the catalog cannot resolve it yet
            None if machine.intent().current_track.is_some() => {}
            None => {
                if self.device.source().is_some() {
                    debug!("Unloading source");
                    self.device.unload();
                    self.applied_seek = None;
                }
            }
        }
    }
}
