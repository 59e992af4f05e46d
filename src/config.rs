use crate::{
    bridge::{PresentSettings, SimulatedDisplay},
    quilt::QuiltRequest,
};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt, fs, io, path::Path};

pub const CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub quilt: QuiltConfig,
    pub display: DisplayConfig,
    pub camera: CameraConfig,
    pub interaction: InteractionConfig,
    pub log_file: String,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuiltConfig {
    pub columns: u32,
    pub rows: u32,
    pub camera_offset_step: f32,
    pub aspect_multiplier: f32,
    pub zoom_multiplier: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    Simulated,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub kind: DisplayKind,
    pub width: u32,
    pub height: u32,
    pub max_texture_dimension: u32,
    pub name: String,
    pub serial: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Radians per second.
    pub rotation_speed: f32,
    /// Radians per pixel of mouse movement.
    pub drag_sensitivity: f32,
    pub input_cooldown_secs: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quilt: QuiltConfig::default(),
            display: DisplayConfig::default(),
            camera: CameraConfig::default(),
            interaction: InteractionConfig::default(),
            log_file: "quilt-cube.log".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for QuiltConfig {
    fn default() -> Self {
        Self {
            columns: 5,
            rows: 9,
            camera_offset_step: 0.5,
            aspect_multiplier: 1.0,
            zoom_multiplier: 1.0,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            kind: DisplayKind::Simulated,
            width: 1536,
            height: 2048,
            max_texture_dimension: 16384,
            name: "Simulated Portrait".to_string(),
            serial: "SIM-0000".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 5.0,
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            rotation_speed: 1.0,
            drag_sensitivity: 0.005,
            input_cooldown_secs: 3.0,
        }
    }
}

impl Config {
    /// Reads the config file, falling back to defaults when there is none.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(ConfigError::Io(error)),
        }
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        json5::from_str(text).map_err(ConfigError::Parse)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

impl QuiltConfig {
    pub fn request(&self) -> QuiltRequest {
        QuiltRequest {
            columns: self.columns,
            rows: self.rows,
        }
    }

    pub fn present_settings(&self) -> PresentSettings {
        PresentSettings {
            aspect_multiplier: self.aspect_multiplier,
            zoom_multiplier: self.zoom_multiplier,
        }
    }
}

impl DisplayConfig {
    pub fn simulated_display(&self) -> Option<SimulatedDisplay> {
        match self.kind {
            DisplayKind::Simulated => Some(SimulatedDisplay {
                width: self.width,
                height: self.height,
                max_texture_dimension: self.max_texture_dimension,
                name: self.name.clone(),
                serial: self.serial.clone(),
            }),
            DisplayKind::Disconnected => None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(json5::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(error) => write!(f, "failed to read config: {}", error),
            ConfigError::Parse(error) => write!(f, "failed to parse config: {}", error),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(error) => Some(error),
            ConfigError::Parse(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(Config::parse("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            // denser quilt for a smaller display
            {
                quilt: { columns: 8, camera_offset_step: 0.01 },
                display: { kind: "disconnected" },
                log_level: "debug",
            }
            "#,
        )
        .unwrap();

        assert_eq!(config.quilt.request(), QuiltRequest { columns: 8, rows: 9 });
        assert_eq!(config.quilt.camera_offset_step, 0.01);
        assert_eq!(config.quilt.aspect_multiplier, 1.0);
        assert_eq!(config.display.simulated_display(), None);
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.log_level(), LevelFilter::Debug);
    }

    #[test]
    fn default_display_is_simulated() {
        let display = Config::default().display.simulated_display().unwrap();
        assert_eq!((display.width, display.height), (1536, 2048));
        assert_eq!(display.max_texture_dimension, 16384);
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = Config::parse(r#"{ log_level: "loud" }"#).unwrap();
        assert_eq!(config.log_level(), LevelFilter::Info);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            Config::parse("{ quilt: { columns: -1 } }"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(Config::parse("{ quilt: "), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load("does/not/exist/config.json").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config = Config::parse(include_str!("../config.json")).unwrap();
        assert_eq!(config, Config::default());
    }
}
