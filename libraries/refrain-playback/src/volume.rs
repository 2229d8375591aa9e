//! Volume control with a perceptual curve
//!
//! The stored and UI-facing level is linear (0-100, what the slider shows).
//! The device receives `curve.gain(level / 100)`, which approximates equal
//! loudness steps.

use serde::{Deserialize, Serialize};

/// Mapping from linear slider position to device gain
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VolumeCurve {
    /// `gain = level²`
    #[default]
    Squared,

    /// Map 0-100% onto `-range_db..0 dB`
    Decibel { range_db: f32 },
}

impl VolumeCurve {
    /// Device gain for a linear level in `[0, 1]`
    pub fn gain(self, linear: f32) -> f32 {
        let linear = linear.clamp(0.0, 1.0);
        if linear == 0.0 {
            return 0.0;
        }

        match self {
            Self::Squared => linear * linear,
            Self::Decibel { range_db } => {
                let db = (linear - 1.0) * range_db.abs();
                10.0_f32.powf(db / 20.0)
            }
        }
    }
}

/// Volume controller
#[derive(Debug, Clone)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state (preserves volume level)
    muted: bool,

    curve: VolumeCurve,
}

impl Volume {
    /// Create new volume controller
    ///
    /// # Arguments
    /// * `level` - Initial volume (0-100)
    /// * `curve` - Perceptual curve applied before the device
    pub fn new(level: u8, curve: VolumeCurve) -> Self {
        Self {
            level: level.min(100),
            muted: false,
            curve,
        }
    }

    /// Set volume level (0-100)
    ///
    /// Changing the level always unmutes.
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(100);
        self.muted = false;
    }

    /// Get current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Linear level in `[0, 1]`
    pub fn linear(&self) -> f32 {
        f32::from(self.level) / 100.0
    }

    /// Mute audio (preserves volume level)
    pub fn mute(&mut self) {
        self.muted = true;
    }

    /// Unmute audio (restores previous volume)
    pub fn unmute(&mut self) {
        self.muted = false;
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Gain handed to the device
    ///
    /// Returns 0.0 if muted, otherwise the curved level
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.curve.gain(self.linear())
        }
    }
}
