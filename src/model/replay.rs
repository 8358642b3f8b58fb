//! Scripted detector that replays recorded detections frame by frame.
//!
//! The script is a JSON array of frames, each an array of detections:
//!
//! ```json
//! [
//!   [{"class": "person", "score": 0.91, "bbox": [40, 30, 120, 260]}],
//!   []
//! ]
//! ```
//!
//! Frames are served in order and wrap around at the end.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{check_frame, DetectError, Detection, Detector, ModelError, ModelProvider};
use crate::camera::Frame;

#[derive(Debug)]
pub struct ReplayDetector {
    frames: Vec<Vec<Detection>>,
    cursor: AtomicUsize,
}

impl ReplayDetector {
    /// Build from in-memory frames. Returns `None` when `frames` is empty.
    pub fn new(frames: Vec<Vec<Detection>>) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        Some(Self {
            frames,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn from_json(json: &str) -> Result<Option<Self>, serde_json::Error> {
        let frames: Vec<Vec<Detection>> = serde_json::from_str(json)?;
        Ok(Self::new(frames))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl Detector for ReplayDetector {
    fn name(&self) -> &str {
        "replay"
    }

    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, DetectError> {
        check_frame(frame)?;
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        Ok(self.frames[index].clone())
    }
}

/// Loads a [`ReplayDetector`] from a JSON file.
#[derive(Debug, Clone)]
pub struct ReplayProvider {
    path: PathBuf,
}

impl ReplayProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ModelProvider for ReplayProvider {
    type Model = ReplayDetector;

    async fn load(self) -> Result<ReplayDetector, ModelError> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ModelError::Io {
                path: self.path.clone(),
                source,
            })?;
        let detector = ReplayDetector::from_json(&json).map_err(|source| ModelError::Script {
            path: self.path.clone(),
            source,
        })?;
        let detector = detector.ok_or_else(|| ModelError::EmptyScript(self.path.clone()))?;
        log::info!(
            "loaded replay script {} ({} frames)",
            self.path.display(),
            detector.frame_count()
        );
        Ok(detector)
    }
}
