//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::{CharacterSet, LogLevel};
use crate::config::{Config, ConfigError};

/// Live webcam object detection with an ASCII terminal preview
#[derive(Parser, Debug)]
#[command(name = "live-detect")]
#[command(version, about = "Live webcam object detection in the terminal", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Camera device index (from list-cameras)
    #[arg(long, global = true)]
    pub camera: Option<u32>,

    /// Use a synthetic test pattern instead of a camera
    #[arg(long, global = true)]
    pub test_pattern: bool,

    /// Do not mirror the camera picture
    #[arg(long, global = true)]
    pub no_mirror: bool,

    /// Local ONNX model
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Replay detections from a JSON script instead of running a model
    #[arg(long, global = true)]
    pub replay: Option<PathBuf>,

    /// Minimum score (exclusive) for a detection to be drawn
    #[arg(long, global = true)]
    pub min_score: Option<f32>,

    /// Fail detection when one inference exceeds this many milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// ASCII character set
    #[arg(long, global = true)]
    pub charset: Option<CharacterSet>,

    /// Invert brightness (for light terminals)
    #[arg(long, global = true)]
    pub invert: bool,

    /// Preview and detection frame rate
    #[arg(long, global = true)]
    pub fps: Option<u32>,

    /// Hide status bar
    #[arg(long, global = true)]
    pub no_status: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the interactive preview (default)
    Run,
    /// Run without a UI, printing labels for each frame
    Headless,
    /// List available cameras
    ListCameras,
    /// Download and verify the configured model into the cache
    FetchModel {
        /// Model URL (defaults to [model] url)
        #[arg(long)]
        url: Option<String>,
        /// Expected SHA-256 (defaults to [model] sha256)
        #[arg(long)]
        sha256: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,
    /// Create default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Args {
    /// Subcommand, defaulting to `run`.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    /// Apply command-line overrides on top of file configuration.
    ///
    /// The merged result is validated again, so an override can be
    /// rejected the same way a bad file value is.
    pub fn apply(&self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(device) = self.camera {
            config.camera.device = device;
        }
        if self.no_mirror {
            config.camera.mirror = false;
        }
        if let Some(path) = &self.model {
            config.model.path = Some(path.clone());
        }
        if let Some(path) = &self.replay {
            config.model.replay = Some(path.clone());
        }
        if let Some(score) = self.min_score {
            config.detection.min_score = score;
        }
        if let Some(ms) = self.timeout_ms {
            config.detection.inference_timeout_ms = Some(ms);
        }
        if let Some(charset) = self.charset {
            config.preview.charset = charset.into();
        }
        if self.invert {
            config.preview.invert = true;
        }
        if let Some(fps) = self.fps {
            config.preview.fps = fps;
        }
        if self.no_status {
            config.ui.status_bar = false;
        }
        if let Some(level) = self.log_level {
            config.log.level = level.as_str().to_string();
        }
        config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::CharSet;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["live-detect"]);
        assert!(args.command.is_none());
        assert_eq!(args.command(), Command::Run);
        assert!(args.config.is_none());
        assert!(args.camera.is_none());
        assert!(!args.test_pattern);
        assert!(!args.no_status);
    }

    #[test]
    fn test_args_apply_overrides() {
        let args = Args::parse_from([
            "live-detect",
            "--camera",
            "2",
            "--no-mirror",
            "--replay",
            "script.json",
            "--min-score",
            "0.7",
            "--timeout-ms",
            "500",
            "--charset",
            "blocks",
            "--invert",
            "--fps",
            "10",
            "--no-status",
            "--log-level",
            "debug",
        ]);
        let mut config = Config::default();
        args.apply(&mut config).unwrap();

        assert_eq!(config.camera.device, 2);
        assert!(!config.camera.mirror);
        assert_eq!(config.model.replay, Some(PathBuf::from("script.json")));
        assert_eq!(config.detection.min_score, 0.7);
        assert_eq!(config.detection.inference_timeout_ms, Some(500));
        assert_eq!(config.preview.charset, CharSet::Blocks);
        assert!(config.preview.invert);
        assert_eq!(config.preview.fps, 10);
        assert!(!config.ui.status_bar);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_apply_without_flags_keeps_file_values() {
        let args = Args::parse_from(["live-detect"]);
        let mut config = Config::default();
        config.camera.device = 3;
        config.preview.charset = CharSet::Minimal;
        args.apply(&mut config).unwrap();
        assert_eq!(config.camera.device, 3);
        assert_eq!(config.preview.charset, CharSet::Minimal);
    }

    #[test]
    fn test_out_of_range_min_score_rejected() {
        for value in ["1.5", "--min-score=-0.1", "nan"] {
            let args = if value.starts_with("--") {
                Args::parse_from(["live-detect", value])
            } else {
                Args::parse_from(["live-detect", "--min-score", value])
            };
            let mut config = Config::default();
            let err = args.apply(&mut config).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid(ref msg) if msg.contains("min_score")),
                "{} gave {:?}",
                value,
                err
            );
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::parse_from(["live-detect", "headless", "--test-pattern"]);
        assert_eq!(args.command(), Command::Headless);
        assert!(args.test_pattern);
    }

    #[test]
    fn test_fetch_model_subcommand() {
        let args = Args::parse_from([
            "live-detect",
            "fetch-model",
            "--url",
            "https://example.com/m.onnx",
        ]);
        assert_eq!(
            args.command(),
            Command::FetchModel {
                url: Some("https://example.com/m.onnx".to_string()),
                sha256: None,
            }
        );
    }

    #[test]
    fn test_config_subcommands() {
        let args = Args::parse_from(["live-detect", "config", "show"]);
        assert_eq!(
            args.command(),
            Command::Config {
                action: ConfigAction::Show
            }
        );

        let args = Args::parse_from(["live-detect", "config", "init", "--force"]);
        assert_eq!(
            args.command(),
            Command::Config {
                action: ConfigAction::Init { force: true }
            }
        );
    }

    #[test]
    fn test_list_cameras_subcommand() {
        let args = Args::parse_from(["live-detect", "list-cameras"]);
        assert_eq!(args.command(), Command::ListCameras);
    }
}
