//! Persisted player snapshot and duration cache

use crate::error::Result;
use crate::preferences::PreferenceStore;
use refrain_core::PersistedSnapshot;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Key holding the [`PersistedSnapshot`]
pub const SNAPSHOT_KEY: &str = "player-state";

/// Key holding known track durations (seconds, keyed by track)
pub const DURATIONS_KEY: &str = "track_durations";

/// Read the saved snapshot
///
/// An unreadable value is treated as absent: it only costs a resume point.
pub async fn load_snapshot(store: &dyn PreferenceStore) -> Result<Option<PersistedSnapshot>> {
    let Some(value) = store.get(SNAPSHOT_KEY).await? else {
        return Ok(None);
    };

    match serde_json::from_value::<PersistedSnapshot>(value) {
        Ok(snapshot) => {
            debug!(
                track = ?snapshot.current_track.as_ref().map(|t| t.key().to_string()),
                position = snapshot.current_time,
                volume = snapshot.volume,
                "Loaded saved snapshot"
            );
            Ok(Some(snapshot))
        }
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable saved snapshot");
            Ok(None)
        }
    }
}

pub async fn save_snapshot(store: &dyn PreferenceStore, snapshot: &PersistedSnapshot) -> Result<()> {
    let value = serde_json::to_value(snapshot)?;
    store.set(SNAPSHOT_KEY, &value).await
}

/// Read cached track durations; unreadable entries are dropped
pub async fn load_durations(store: &dyn PreferenceStore) -> Result<HashMap<String, f64>> {
    let Some(value) = store.get(DURATIONS_KEY).await? else {
        return Ok(HashMap::new());
    };

    match serde_json::from_value::<HashMap<String, f64>>(value) {
        Ok(durations) => Ok(durations
            .into_iter()
            .filter(|(_, d)| d.is_finite() && *d > 0.0)
            .collect()),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable duration cache");
            Ok(HashMap::new())
        }
    }
}

pub async fn save_durations(
    store: &dyn PreferenceStore,
    durations: &HashMap<String, f64>,
) -> Result<()> {
    let value = serde_json::to_value(durations)?;
    store.set(DURATIONS_KEY, &value).await
}

/// Commit-on-settle policy for snapshot writes
///
/// Callers stage every change. A staged snapshot is written when:
/// - it is committed explicitly (track change, volume change, seek release)
/// - a periodic tick sees the track or volume changed, or the position moved
///   by at least the threshold
/// - it is flushed at shutdown
///
/// Identical snapshots are never written twice in a row.
#[derive(Debug)]
pub struct SnapshotWriter {
    staged: Option<PersistedSnapshot>,
    last_written: Option<PersistedSnapshot>,

    /// Seconds the playhead must move before a tick rewrites it
    position_threshold: f64,
}

impl SnapshotWriter {
    pub fn new(position_threshold: f64) -> Self {
        Self {
            staged: None,
            last_written: None,
            position_threshold: position_threshold.max(0.0),
        }
    }

    /// Start from what is already stored
    #[must_use]
    pub fn with_baseline(mut self, stored: Option<PersistedSnapshot>) -> Self {
        self.last_written = stored;
        self
    }

    /// Remember the latest state without writing it
    pub fn stage(&mut self, snapshot: PersistedSnapshot) {
        self.staged = Some(snapshot);
    }

    /// Staged snapshot to write now, if it differs from the last write
    pub fn commit(&mut self) -> Option<PersistedSnapshot> {
        let staged = self.staged.take()?;
        if self.last_written.as_ref() == Some(&staged) {
            return None;
        }
        self.last_written = Some(staged.clone());
        Some(staged)
    }

    /// Periodic check; writes only meaningful changes
    pub fn tick(&mut self) -> Option<PersistedSnapshot> {
        let staged = self.staged.as_ref()?;
        let worth_writing = match &self.last_written {
            None => true,
            Some(last) => {
                last.current_track != staged.current_track
                    || last.volume != staged.volume
                    || (last.current_time - staged.current_time).abs() >= self.position_threshold
            }
        };

        if worth_writing {
            self.commit()
        } else {
            None
        }
    }

    /// Final write at shutdown
    pub fn flush(&mut self) -> Option<PersistedSnapshot> {
        self.commit()
    }

    pub fn is_dirty(&self) -> bool {
        self.staged
            .as_ref()
            .is_some_and(|s| self.last_written.as_ref() != Some(s))
    }
}
