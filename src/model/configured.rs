//! Picks a model backend from configuration.

use std::path::PathBuf;

use super::fetch::{ModelCache, ModelFetcher};
use super::{
    DetectError, Detection, Detector, ModelError, ModelProvider, ReplayDetector, ReplayProvider,
    YoloParams,
};
use crate::camera::Frame;

/// Where the model comes from, in order of precedence.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Recorded detections.
    Replay(PathBuf),
    /// A local ONNX file.
    File(PathBuf),
    /// An ONNX file fetched into the cache.
    Remote { url: String, sha256: Option<String> },
}

/// Any detector this crate can build.
#[derive(Debug)]
pub enum AnyDetector {
    Replay(ReplayDetector),
    #[cfg(feature = "backend-tract")]
    Tract(super::TractDetector),
}

impl Detector for AnyDetector {
    fn name(&self) -> &str {
        match self {
            AnyDetector::Replay(d) => d.name(),
            #[cfg(feature = "backend-tract")]
            AnyDetector::Tract(d) => d.name(),
        }
    }

    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, DetectError> {
        match self {
            AnyDetector::Replay(d) => d.detect(frame).await,
            #[cfg(feature = "backend-tract")]
            AnyDetector::Tract(d) => d.detect(frame).await,
        }
    }
}

/// Loads whichever model the configuration names.
#[derive(Debug, Clone)]
pub struct ConfiguredProvider {
    source: Option<ModelSource>,
    params: YoloParams,
    cache: ModelCache,
}

impl ConfiguredProvider {
    pub fn new(source: Option<ModelSource>, params: YoloParams, cache: ModelCache) -> Self {
        Self {
            source,
            params,
            cache,
        }
    }

    pub fn source(&self) -> Option<&ModelSource> {
        self.source.as_ref()
    }
}

impl ModelProvider for ConfiguredProvider {
    type Model = AnyDetector;

    async fn load(self) -> Result<AnyDetector, ModelError> {
        let Self {
            source,
            params,
            cache,
        } = self;

        let path = match source.ok_or(ModelError::NotConfigured)? {
            ModelSource::Replay(path) => {
                return ReplayProvider::new(path).load().await.map(AnyDetector::Replay);
            }
            ModelSource::File(path) => path,
            ModelSource::Remote { url, sha256 } => {
                ModelFetcher::new(cache)?
                    .fetch(&url, sha256.as_deref())
                    .await?
            }
        };

        load_onnx(path, params).await
    }
}

#[cfg(feature = "backend-tract")]
async fn load_onnx(path: PathBuf, params: YoloParams) -> Result<AnyDetector, ModelError> {
    super::TractProvider::new(path, params)
        .load()
        .await
        .map(AnyDetector::Tract)
}

#[cfg(not(feature = "backend-tract"))]
async fn load_onnx(path: PathBuf, _params: YoloParams) -> Result<AnyDetector, ModelError> {
    log::error!(
        "cannot load {}: built without the backend-tract feature",
        path.display()
    );
    Err(ModelError::BackendUnavailable("tract"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn provider(source: Option<ModelSource>) -> ConfiguredProvider {
        ConfiguredProvider::new(
            source,
            YoloParams::default(),
            ModelCache::new(std::env::temp_dir().join("live-detect-test-models")),
        )
    }

    #[tokio::test]
    async fn test_unconfigured_is_error() {
        let result = provider(None).load().await;
        assert!(matches!(result, Err(ModelError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_replay_source_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[[{{"class":"cup","score":0.6,"bbox":[0,0,4,4]}}]]"#).unwrap();

        let detector = provider(Some(ModelSource::Replay(file.path().to_path_buf())))
            .load()
            .await
            .unwrap();
        assert_eq!(detector.name(), "replay");
        let detections = detector.detect(&Frame::blank(8, 8)).await.unwrap();
        assert_eq!(detections[0].class, "cup");
    }

    #[cfg(not(feature = "backend-tract"))]
    #[tokio::test]
    async fn test_onnx_without_backend() {
        let result = provider(Some(ModelSource::File(PathBuf::from("m.onnx"))))
            .load()
            .await;
        assert!(matches!(result, Err(ModelError::BackendUnavailable("tract"))));
    }
}
