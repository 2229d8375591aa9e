/// Player configuration
use crate::error::{AppError, Result};
use refrain_core::DEFAULT_VOLUME;
use refrain_playback::{PlaybackConfig, VolumeCurve};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_media")]
    pub media: MediaSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_device")]
    pub device: DeviceSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,

    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaSettings {
    /// Base the audio URLs are derived from
    #[serde(default = "default_public_base")]
    pub public_base: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_preferences_path")]
    pub preferences_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_volume")]
    pub default_volume: u8,

    #[serde(default = "default_volume_curve")]
    pub volume_curve: CurveKind,

    /// Only used by the decibel curve
    #[serde(default = "default_volume_range_db")]
    pub volume_range_db: f32,

    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,

    #[serde(default = "default_position_save_threshold_secs")]
    pub position_save_threshold_secs: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceSettings {
    /// Length the simulated device reports for every track
    #[serde(default = "default_track_secs")]
    pub default_track_secs: f64,

    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    Squared,
    Decibel,
}

impl PlayerConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Without an explicit path, `refrain.toml` in the working directory is
    /// used if present. Environment variables use the `REFRAIN_` prefix and
    /// `__` between section and key, e.g. `REFRAIN_SERVER__ACCESS_TOKEN`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from("refrain.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("REFRAIN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("server.url", &self.server.url),
            ("media.public_base", &self.media.public_base),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::Config(format!("{} is not a valid URL: {}", name, e)))?;
        }

        if self.playback.default_volume > 100 {
            return Err(AppError::Config(format!(
                "playback.default_volume must be 0-100, got {}",
                self.playback.default_volume
            )));
        }

        if self.playback.volume_curve == CurveKind::Decibel && self.playback.volume_range_db <= 0.0
        {
            return Err(AppError::Config(
                "playback.volume_range_db must be positive".to_string(),
            ));
        }

        if self.playback.snapshot_interval_secs == 0 {
            return Err(AppError::Config(
                "playback.snapshot_interval_secs must be at least 1".to_string(),
            ));
        }

        let track_secs = self.device.default_track_secs;
        if !track_secs.is_finite() || track_secs <= 0.0 {
            return Err(AppError::Config(
                "device.default_track_secs must be positive".to_string(),
            ));
        }

        if self.device.tick_millis == 0 {
            return Err(AppError::Config(
                "device.tick_millis must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        let volume_curve = match self.playback.volume_curve {
            CurveKind::Squared => VolumeCurve::Squared,
            CurveKind::Decibel => VolumeCurve::Decibel {
                range_db: self.playback.volume_range_db,
            },
        };

        PlaybackConfig {
            volume: self.playback.default_volume,
            volume_curve,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.device.tick_millis)
    }

    pub fn snapshot_interval(&self) -> Duration {
        Duration::from_secs(self.playback.snapshot_interval_secs)
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        url: default_server_url(),
        access_token: None,
        catalog_path: default_catalog_path(),
    }
}

fn default_server_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_catalog_path() -> String {
    refrain_client::DEFAULT_CATALOG_PATH.to_string()
}

fn default_media() -> MediaSettings {
    MediaSettings {
        public_base: default_public_base(),
    }
}

fn default_public_base() -> String {
    "http://localhost:8000/storage".to_string()
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        preferences_path: default_preferences_path(),
    }
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("./data/refrain.db")
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        default_volume: default_volume(),
        volume_curve: default_volume_curve(),
        volume_range_db: default_volume_range_db(),
        snapshot_interval_secs: default_snapshot_interval_secs(),
        position_save_threshold_secs: default_position_save_threshold_secs(),
    }
}

fn default_volume() -> u8 {
    DEFAULT_VOLUME
}

fn default_volume_curve() -> CurveKind {
    CurveKind::Squared
}

fn default_volume_range_db() -> f32 {
    50.0
}

fn default_snapshot_interval_secs() -> u64 {
    5
}

fn default_position_save_threshold_secs() -> f64 {
    1.0
}

fn default_device() -> DeviceSettings {
    DeviceSettings {
        default_track_secs: default_track_secs(),
        tick_millis: default_tick_millis(),
    }
}

fn default_track_secs() -> f64 {
    180.0
}

fn default_tick_millis() -> u64 {
    250
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            media: default_media(),
            storage: default_storage(),
            playback: default_playback(),
            device: default_device(),
        }
    }
}
