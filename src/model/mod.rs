//! Object detection models.
//!
//! The rest of the crate only sees two traits: a [`ModelProvider`] that
//! loads asynchronously, and the [`Detector`] it yields, whose single
//! capability is `detect(frame) -> Vec<Detection>`.

mod configured;
pub mod fetch;
pub mod labels;
mod replay;
#[cfg(feature = "backend-tract")]
mod tract;
pub mod yolo;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::camera::Frame;

pub use configured::{AnyDetector, ConfiguredProvider, ModelSource};
pub use fetch::{FetchError, ModelCache, ModelFetcher};
pub use replay::{ReplayDetector, ReplayProvider};
#[cfg(feature = "backend-tract")]
pub use tract::{TractDetector, TractProvider};
pub use yolo::YoloParams;

/// One model output for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Category label, e.g. `"person"`.
    pub class: String,
    /// Confidence in `[0, 1]`.
    pub score: f32,
    /// `[x, y, width, height]` in frame pixels, origin top-left.
    pub bbox: [f32; 4],
}

impl Detection {
    pub fn new(class: impl Into<String>, score: f32, bbox: [f32; 4]) -> Self {
        Self {
            class: class.into(),
            score,
            bbox,
        }
    }
}

/// Errors raised while loading a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("no model configured (set [model] path, url or replay)")]
    NotConfigured,

    #[error("model backend `{0}` was not compiled in")]
    BackendUnavailable(&'static str),

    #[error("failed to read model file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse replay script '{path}': {source}")]
    Script {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("replay script '{0}' contains no frames")]
    EmptyScript(PathBuf),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("model backend error: {0}")]
    Backend(String),
}

/// Errors raised by a single inference call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectError {
    #[error("frame {width}x{height} has {actual} bytes, expected {expected}")]
    FrameSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("unexpected model output shape {0:?}")]
    OutputShape(Vec<usize>),

    #[error("inference failed: {0}")]
    Backend(String),
}

/// A ready-to-use detector.
#[allow(async_fn_in_trait)]
pub trait Detector {
    /// Short backend name for logs and the status bar.
    fn name(&self) -> &str;

    /// Run detection on one frame.
    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, DetectError>;
}

/// Asynchronously yields a [`Detector`].
#[allow(async_fn_in_trait)]
pub trait ModelProvider {
    type Model: Detector;

    async fn load(self) -> Result<Self::Model, ModelError>;
}

/// Run a synchronous inference on the blocking pool.
///
/// CPU-bound backends call this from [`Detector::detect`] so the async
/// caller keeps being polled while the model runs. That is what lets a
/// surrounding `tokio::time::timeout` fire and keeps the preview drawing.
/// A panicked or cancelled worker is reported as [`DetectError::Backend`].
pub async fn detect_blocking<F>(work: F) -> Result<Vec<Detection>, DetectError>
where
    F: FnOnce() -> Result<Vec<Detection>, DetectError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| DetectError::Backend(format!("inference worker failed: {}", e)))?
}

/// Check that a frame's buffer matches its declared RGB dimensions.
pub(crate) fn check_frame(frame: &Frame) -> Result<(), DetectError> {
    let expected = (frame.width as usize) * (frame.height as usize) * frame.bytes_per_pixel();
    if frame.data.len() != expected {
        return Err(DetectError::FrameSize {
            width: frame.width,
            height: frame.height,
            expected,
            actual: frame.data.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_json_shape() {
        let json = r#"{"class":"cat","score":0.8,"bbox":[1,2,3,4]}"#;
        let detection: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(detection, Detection::new("cat", 0.8, [1.0, 2.0, 3.0, 4.0]));
    }

    #[tokio::test]
    async fn test_detect_blocking_returns_worker_result() {
        let detections = detect_blocking(|| Ok(vec![Detection::new("cup", 0.9, [0.0; 4])]))
            .await
            .unwrap();
        assert_eq!(detections[0].class, "cup");
    }

    #[tokio::test]
    async fn test_detect_blocking_reports_panicked_worker() {
        let err = detect_blocking(|| panic!("backend crashed")).await.unwrap_err();
        assert!(matches!(err, DetectError::Backend(_)));
    }

    #[test]
    fn test_check_frame_accepts_matching_buffer() {
        assert!(check_frame(&Frame::blank(4, 3)).is_ok());
    }

    #[test]
    fn test_check_frame_rejects_short_buffer() {
        let frame = Frame::rgb(vec![0; 5], 2, 2);
        assert_eq!(
            check_frame(&frame),
            Err(DetectError::FrameSize {
                width: 2,
                height: 2,
                expected: 12,
                actual: 5,
            })
        );
    }
}
