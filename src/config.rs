//! Configuration file handling for live-detect.
//!
//! Loads configuration from `~/.config/live-detect/config.toml` or a custom
//! path. A missing file means defaults; CLI flags are applied on top.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ascii::CharSet;
use crate::camera::{CameraSettings, Resolution};
use crate::detection_loop::{LoopOptions, CONFIDENCE_THRESHOLD};
use crate::model::{ModelSource, YoloParams};

/// Written by `config init`. Must parse to `Config::default()`.
pub const DEFAULT_CONFIG: &str = r#"# live-detect configuration

[camera]
# Device index, see `live-detect list-cameras`.
device = 0
# Flip the picture horizontally (selfie view).
mirror = true
width = 640
height = 480
fps = 30

[model]
# Local ONNX model. Takes precedence over `url`.
# path = "/path/to/yolov8n.onnx"
# Downloaded once into the cache, then reused.
# url = "https://example.com/yolov8n.onnx"
# sha256 = "..."
# Replay recorded detections from a JSON script instead of running a model.
# replay = "detections.json"
input_size = 640
iou_threshold = 0.5
max_detections = 20

[detection]
# Detections must score strictly above this to be drawn.
min_score = 0.5
# Fail the loop if one inference takes longer than this.
# inference_timeout_ms = 2000

[preview]
# standard, blocks or minimal
charset = "standard"
invert = false
fps = 15

[ui]
status_bar = true

[log]
# error, warn, info, debug or trace. RUST_LOG wins when set.
level = "warn"
# file = "/tmp/live-detect.log"
"#;

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub device: u32,
    pub mirror: bool,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            mirror: true,
            width: Resolution::MEDIUM.width,
            height: Resolution::MEDIUM.height,
            fps: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay: Option<PathBuf>,
    pub input_size: u32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let yolo = YoloParams::default();
        Self {
            path: None,
            url: None,
            sha256: None,
            replay: None,
            input_size: yolo.input_size,
            iou_threshold: yolo.iou_threshold,
            max_detections: yolo.max_detections,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub min_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_timeout_ms: Option<u64>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_score: CONFIDENCE_THRESHOLD,
            inference_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub charset: CharSet,
    pub invert: bool,
    pub fps: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            charset: CharSet::Standard,
            invert: false,
            fps: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub status_bar: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { status_bar: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file path, or the default path.
    /// Returns default config if the file doesn't exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.clone(),
                source,
            },
            other => other,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.detection.min_score) {
            return Err(ConfigError::Invalid(format!(
                "detection.min_score must be within [0, 1], got {}",
                self.detection.min_score
            )));
        }
        if self.model.input_size == 0 {
            return Err(ConfigError::Invalid(
                "model.input_size must be positive".to_string(),
            ));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(ConfigError::Invalid(
                "camera.width and camera.height must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn camera_settings(&self) -> CameraSettings {
        CameraSettings {
            device_index: self.camera.device,
            resolution: self.resolution(),
            fps: self.camera.fps.max(1),
            mirror: self.camera.mirror,
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.camera.width,
            height: self.camera.height,
        }
    }

    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            input_size: self.model.input_size,
            conf_threshold: self.detection.min_score,
            iou_threshold: self.model.iou_threshold,
            max_detections: self.model.max_detections,
        }
    }

    pub fn loop_options(&self) -> LoopOptions {
        LoopOptions {
            threshold: self.detection.min_score,
            inference_timeout: self.detection.inference_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Model to load: replay script, then local file, then URL.
    pub fn model_source(&self) -> Option<ModelSource> {
        if let Some(path) = &self.model.replay {
            return Some(ModelSource::Replay(path.clone()));
        }
        if let Some(path) = &self.model.path {
            return Some(ModelSource::File(path.clone()));
        }
        self.model.url.as_ref().map(|url| ModelSource::Remote {
            url: url.clone(),
            sha256: self.model.sha256.clone(),
        })
    }

    /// Where logs go while the TUI owns the terminal.
    pub fn log_file(&self) -> PathBuf {
        self.log.file.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("live-detect")
                .join("live-detect.log")
        })
    }
}

/// Write [`DEFAULT_CONFIG`] to `path`, refusing to overwrite unless `force`.
pub fn write_default(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::Exists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, DEFAULT_CONFIG).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file '{0}' already exists (use --force to overwrite)")]
    Exists(PathBuf),
}

/// `~/.config/live-detect/config.toml`.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("live-detect")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        let parsed = Config::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::parse("[detection]\ninference_timeout_ms = 250\n").unwrap();
        assert_eq!(
            config.loop_options().inference_timeout,
            Some(Duration::from_millis(250))
        );
        assert_eq!(config.loop_options().threshold, CONFIDENCE_THRESHOLD);
        assert_eq!(config.preview.fps, 15);
        assert!(config.camera.mirror);
    }

    #[test]
    fn test_invalid_score_rejected() {
        let err = Config::parse("[detection]\nmin_score = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_charset_is_parse_error() {
        let err = Config::parse("[preview]\ncharset = \"braille\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = Config::default();
        config.model.replay = Some(PathBuf::from("script.json"));
        let text = config.to_toml().unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_model_source_precedence() {
        let mut config = Config::default();
        assert_eq!(config.model_source(), None);

        config.model.url = Some("https://example.com/m.onnx".to_string());
        assert!(matches!(config.model_source(), Some(ModelSource::Remote { .. })));

        config.model.path = Some(PathBuf::from("local.onnx"));
        assert_eq!(
            config.model_source(),
            Some(ModelSource::File(PathBuf::from("local.onnx")))
        );

        config.model.replay = Some(PathBuf::from("script.json"));
        assert_eq!(
            config.model_source(),
            Some(ModelSource::Replay(PathBuf::from("script.json")))
        );
    }

    #[test]
    fn test_derived_settings() {
        let config = Config::default();
        assert_eq!(config.camera_settings().resolution, Resolution::MEDIUM);
        assert_eq!(config.yolo_params(), YoloParams::default());
        assert!(config.log_file().ends_with("live-detect/live-detect.log"));
    }
}
