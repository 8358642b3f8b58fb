//! ONNX detection backend running on tract.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tract_onnx::prelude::*;

use super::yolo::{self, YoloParams};
use super::{
    check_frame, detect_blocking, DetectError, Detection, Detector, ModelError, ModelProvider,
};
use crate::camera::Frame;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A YOLO-style ONNX model, optimised and ready to run.
///
/// The plan is shared with the blocking worker that runs each inference.
pub struct TractDetector {
    plan: Arc<Plan>,
    params: YoloParams,
}

impl std::fmt::Debug for TractDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TractDetector")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl TractDetector {
    /// Load an ONNX model and fix its input to `[1, 3, size, size]`.
    pub fn from_path(model_path: &Path, params: YoloParams) -> Result<Self, ModelError> {
        let size = params.input_size as usize;
        let backend =
            |e: TractError| ModelError::Backend(format!("{}: {:#}", model_path.display(), e));

        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(backend)?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())
            .map_err(backend)?
            .into_optimized()
            .map_err(backend)?
            .into_runnable()
            .map_err(backend)?;

        Ok(Self {
            plan: Arc::new(plan),
            params,
        })
    }

    pub fn params(&self) -> &YoloParams {
        &self.params
    }
}

/// One synchronous forward pass: preprocess, run the plan, decode.
fn infer(plan: &Plan, params: &YoloParams, frame: &Frame) -> Result<Vec<Detection>, DetectError> {
    check_frame(frame)?;

    let size = params.input_size as usize;
    let input = yolo::preprocess(frame, params.input_size);
    let tensor = Tensor::from_shape(&[1, 3, size, size], &input)
        .map_err(|e| DetectError::Backend(e.to_string()))?;

    let outputs = plan
        .run(tvec!(tensor.into()))
        .map_err(|e| DetectError::Backend(format!("{:#}", e)))?;
    let output = outputs
        .first()
        .ok_or_else(|| DetectError::Backend("model produced no outputs".to_string()))?;
    let view = output
        .to_array_view::<f32>()
        .map_err(|e| DetectError::Backend(e.to_string()))?;

    let shape = view.shape().to_vec();
    let values: Vec<f32> = view.iter().copied().collect();
    yolo::decode(&values, &shape, frame.width, frame.height, params)
}

impl Detector for TractDetector {
    fn name(&self) -> &str {
        "tract"
    }

    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, DetectError> {
        let plan = Arc::clone(&self.plan);
        let params = self.params;
        let frame = frame.clone();
        detect_blocking(move || infer(&plan, &params, &frame)).await
    }
}

/// Loads a [`TractDetector`] off the async thread.
#[derive(Debug, Clone)]
pub struct TractProvider {
    path: PathBuf,
    params: YoloParams,
}

impl TractProvider {
    pub fn new(path: impl Into<PathBuf>, params: YoloParams) -> Self {
        Self {
            path: path.into(),
            params,
        }
    }
}

impl ModelProvider for TractProvider {
    type Model = TractDetector;

    async fn load(self) -> Result<TractDetector, ModelError> {
        let Self { path, params } = self;
        log::info!("loading ONNX model {}", path.display());
        let detector = tokio::task::spawn_blocking(move || TractDetector::from_path(&path, params))
            .await
            .map_err(|e| ModelError::Backend(e.to_string()))??;
        log::info!(
            "model ready (input {}x{})",
            detector.params.input_size,
            detector.params.input_size
        );
        Ok(detector)
    }
}
