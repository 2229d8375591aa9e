//! Player: machine plus reconciler behind one entry point

use crate::command::Action;
use crate::device::{DeviceSubscription, MediaDevice};
use crate::events::PlayerEvent;
use crate::machine::PlaybackMachine;
use crate::reconciler::DeviceReconciler;
use crate::types::{Persist, PlaybackConfig, PlaybackSnapshot};
use refrain_core::{MediaLocator, PersistedSnapshot};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::warn;

/// Upper bound on reconcile/dispatch rounds per handled action
const MAX_FEEDBACK_ROUNDS: usize = 8;

/// One playback session bound to one device
///
/// Every action goes through [`Player::handle`], which runs the reducer and
/// then lets the reconciler act on the device. Anything the device answers
/// synchronously is fed back before `handle` returns.
pub struct Player<D: MediaDevice> {
    machine: PlaybackMachine,
    reconciler: DeviceReconciler<D>,
}

impl<D: MediaDevice> Player<D> {
    /// Create a player and acquire the device's event stream
    ///
    /// The subscription lives as long as the caller keeps it; dropping it
    /// detaches from the device.
    pub fn new(config: PlaybackConfig, locator: MediaLocator, mut device: D) -> (Self, DeviceSubscription) {
        let subscription = device.subscribe();
        let mut player = Self {
            machine: PlaybackMachine::new(config, locator),
            reconciler: DeviceReconciler::new(device),
        };
        player.reconciler.reconcile(&player.machine);
        (player, subscription)
    }

    /// Apply an action and reconcile the device
    ///
    /// Returns the most urgent persistence need raised along the way.
    pub fn handle(&mut self, action: impl Into<Action>) -> Persist {
        let mut pending = VecDeque::from([action.into()]);
        let mut persist = Persist::Skip;
        let mut rounds = 0;

        while let Some(action) = pending.pop_front() {
            if rounds == MAX_FEEDBACK_ROUNDS {
                warn!(dropped = pending.len() + 1, "Device feedback did not settle");
                break;
            }
            rounds += 1;

            if let Action::Device(event) = &action {
                self.reconciler.observe(event);
            }
            persist = persist.max(self.machine.dispatch(action));
            pending.extend(self.reconciler.reconcile(&self.machine));
        }

        persist
    }

    /// Advance device time (simulated devices only)
    pub fn tick(&mut self, elapsed: Duration) {
        self.reconciler.device_mut().tick(elapsed);
    }

    pub fn machine(&self) -> &PlaybackMachine {
        &self.machine
    }

    /// Read-only view of the device; transport goes through `handle`
    pub fn device(&self) -> &D {
        self.reconciler.device()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.machine.snapshot()
    }

    pub fn persisted_snapshot(&self) -> PersistedSnapshot {
        self.machine.persisted_snapshot()
    }

    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        self.machine.drain_events()
    }
}
