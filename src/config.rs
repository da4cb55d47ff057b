use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Simulation configuration. Every section falls back to its defaults, so a
/// config file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for track, scenery and backdrop generation.
    pub seed: u64,
    /// Upper bound on a single integration step, in seconds.
    pub max_frame_dt: f32,
    pub track: TrackConfig,
    pub vehicle: VehicleConfig,
    pub camera: CameraConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub segment_length: f32,
    pub total_segments: usize,
    pub road_width: f32,
    /// Segments at the start of the track kept free of scenery.
    pub clear_segments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub max_speed: f32,
    pub cruise_speed: f32,
    pub acceleration: f32,
    pub brake: f32,
    pub friction: f32,
    pub steer_speed: f32,
    pub steer_return: f32,
    pub lean_speed: f32,
    pub lean_return: f32,
    pub lean_limit: f32,
    pub curve_drift: f32,
    pub lane_limit: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub field_of_view: f32,
    pub height: f32,
    /// Look-back distance, in segments.
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub draw_distance: usize,
    pub rumble_length: usize,
    /// Horizon line as a fraction of screen height.
    pub horizon: f32,
    /// Height of the internal framebuffer before upscaling to the window.
    pub internal_height: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_0f_70ad,
            max_frame_dt: 0.05,
            track: TrackConfig::default(),
            vehicle: VehicleConfig::default(),
            camera: CameraConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            segment_length: 80.0,
            total_segments: 1200,
            road_width: 36.0,
            clear_segments: 12,
        }
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            max_speed: 62.0,
            cruise_speed: 32.0,
            acceleration: 20.0,
            brake: 28.0,
            friction: 16.0,
            steer_speed: 1.9,
            steer_return: 2.8,
            lean_speed: 3.8,
            lean_return: 4.5,
            lean_limit: 0.25,
            curve_drift: 0.9,
            lane_limit: 1.8,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            field_of_view: 80.0,
            height: 950.0,
            distance: 1.6,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            draw_distance: 220,
            rumble_length: 3,
            horizon: 0.56,
            internal_height: 480,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive number, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must not be negative, got {value}"),
        })
    }
}

fn non_zero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: "must be at least 1".to_string(),
        })
    }
}

impl SimConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, falling back to defaults when the file is
    /// missing or unusable.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_frame_dt", self.max_frame_dt)?;

        positive("track.segment_length", self.track.segment_length)?;
        non_zero("track.total_segments", self.track.total_segments)?;
        positive("track.road_width", self.track.road_width)?;

        let v = &self.vehicle;
        positive("vehicle.max_speed", v.max_speed)?;
        positive("vehicle.acceleration", v.acceleration)?;
        positive("vehicle.brake", v.brake)?;
        positive("vehicle.lane_limit", v.lane_limit)?;
        positive("vehicle.lean_limit", v.lean_limit)?;
        non_negative("vehicle.friction", v.friction)?;
        non_negative("vehicle.steer_speed", v.steer_speed)?;
        non_negative("vehicle.steer_return", v.steer_return)?;
        non_negative("vehicle.lean_speed", v.lean_speed)?;
        non_negative("vehicle.lean_return", v.lean_return)?;
        non_negative("vehicle.curve_drift", v.curve_drift)?;
        if !(0.0..=v.max_speed).contains(&v.cruise_speed) {
            return Err(ConfigError::Invalid {
                field: "vehicle.cruise_speed",
                reason: format!("must lie within [0, {}]", v.max_speed),
            });
        }

        if !(self.camera.field_of_view > 0.0 && self.camera.field_of_view < 180.0) {
            return Err(ConfigError::Invalid {
                field: "camera.field_of_view",
                reason: "must lie strictly between 0 and 180 degrees".to_string(),
            });
        }
        positive("camera.height", self.camera.height)?;
        non_negative("camera.distance", self.camera.distance)?;

        non_zero("render.draw_distance", self.render.draw_distance)?;
        non_zero("render.rumble_length", self.render.rumble_length)?;
        non_zero("render.internal_height", self.render.internal_height)?;
        if !(0.0..=1.0).contains(&self.render.horizon) {
            return Err(ConfigError::Invalid {
                field: "render.horizon",
                reason: "must be a fraction of screen height".to_string(),
            });
        }
        Ok(())
    }
}
