//! Session context: capability gate, model handle and stream activation.

use std::sync::Arc;

use crate::detection_loop::{DetectionLoop, LoopOptions};
use crate::media::{MediaDevices, StreamConstraints, StreamError};
use crate::model::{Detector, ModelError, ModelProvider};
use crate::overlay::OverlaySurface;

/// Shown once when the host cannot capture video.
pub const UNSUPPORTED_MESSAGE: &str = "video capture is not supported on this system";

/// Errors from session setup.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a model is already loaded for this session")]
    ModelAlreadyLoaded,

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors from activating the camera.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActivationError {
    #[error("could not start the camera: {0}")]
    Stream(#[from] StreamError),
}

/// The "enable camera" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationControl {
    /// Wired up at all. `false` when capture is unsupported.
    pub enabled: bool,
    /// Still offered to the user. Cleared once activation starts.
    pub visible: bool,
}

/// Result of an activation request that did not error.
pub enum ActivationOutcome<L> {
    /// No model yet; nothing happened.
    ModelNotReady,
    /// Capture is unsupported; the control is inert.
    Unsupported,
    /// Activation already happened earlier in this session.
    AlreadyActive,
    /// A loop bound to the new stream, ready to run.
    Started(L),
}

impl<L> std::fmt::Debug for ActivationOutcome<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivationOutcome::ModelNotReady => write!(f, "ModelNotReady"),
            ActivationOutcome::Unsupported => write!(f, "Unsupported"),
            ActivationOutcome::AlreadyActive => write!(f, "AlreadyActive"),
            ActivationOutcome::Started(_) => write!(f, "Started(..)"),
        }
    }
}

/// Activation result carrying the concrete loop type.
pub type Activation<M, D, O> =
    ActivationOutcome<DetectionLoop<M, <D as MediaDevices>::Stream, O>>;

/// One demo session: a media device, an optional model, one activation.
pub struct Session<D: MediaDevices, M: Detector> {
    devices: D,
    model: Option<Arc<M>>,
    control: ActivationControl,
    options: LoopOptions,
    diagnostic: Option<&'static str>,
    last_error: Option<ActivationError>,
}

impl<D: MediaDevices, M: Detector> Session<D, M> {
    /// Create a session, running the capability gate once.
    pub fn new(devices: D, options: LoopOptions) -> Self {
        let supported = devices.supported();
        let diagnostic = if supported {
            None
        } else {
            log::warn!("{}", UNSUPPORTED_MESSAGE);
            Some(UNSUPPORTED_MESSAGE)
        };

        Self {
            devices,
            model: None,
            control: ActivationControl {
                enabled: supported,
                visible: true,
            },
            options,
            diagnostic,
            last_error: None,
        }
    }

    /// Populate the model handle. Only the first install succeeds.
    pub fn install_model(&mut self, model: M) -> Result<(), SessionError> {
        if self.model.is_some() {
            return Err(SessionError::ModelAlreadyLoaded);
        }
        log::info!("model ready: {}", model.name());
        self.model = Some(Arc::new(model));
        Ok(())
    }

    /// Load through `provider` and install the result.
    pub async fn load_model<P>(&mut self, provider: P) -> Result<(), SessionError>
    where
        P: ModelProvider<Model = M>,
    {
        if self.model.is_some() {
            return Err(SessionError::ModelAlreadyLoaded);
        }
        let model = provider.load().await?;
        self.install_model(model)
    }

    pub fn model(&self) -> Option<&Arc<M>> {
        self.model.as_ref()
    }

    pub fn is_model_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn control(&self) -> ActivationControl {
        self.control
    }

    /// One-time message from the capability gate, if it failed.
    pub fn diagnostic(&self) -> Option<&'static str> {
        self.diagnostic
    }

    /// The most recent activation failure.
    pub fn last_error(&self) -> Option<&ActivationError> {
        self.last_error.as_ref()
    }

    pub fn devices(&self) -> &D {
        &self.devices
    }

    /// Handle the user's request to enable the camera.
    ///
    /// On success the control is hidden and the returned loop is bound to
    /// the new stream and `surface`. On failure the control stays hidden
    /// and the error is kept for display.
    pub async fn activate<O: OverlaySurface>(
        &mut self,
        surface: O,
    ) -> Result<Activation<M, D, O>, ActivationError> {
        let Some(model) = self.model.clone() else {
            return Ok(ActivationOutcome::ModelNotReady);
        };
        if !self.control.enabled {
            return Ok(ActivationOutcome::Unsupported);
        }
        if !self.control.visible {
            return Ok(ActivationOutcome::AlreadyActive);
        }
        self.control.visible = false;

        let constraints = StreamConstraints::video_only();
        let stream = match self.devices.request_stream(&constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("camera activation failed: {}", e);
                let error = ActivationError::Stream(e);
                self.last_error = Some(error.clone());
                return Err(error);
            }
        };

        log::info!("camera stream acquired");
        Ok(ActivationOutcome::Started(DetectionLoop::new(
            model,
            stream,
            surface,
            self.options,
        )))
    }
}
