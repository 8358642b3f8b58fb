//! Webcam-backed media devices.

use crate::camera::{self, CameraSettings, FrameSlot};

use super::{MediaDevices, MediaStream, StreamConstraints, StreamError};

/// The system's cameras, opened through nokhwa.
#[derive(Debug, Clone)]
pub struct NativeDevices {
    settings: CameraSettings,
}

impl NativeDevices {
    pub fn new(settings: CameraSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }
}

impl MediaDevices for NativeDevices {
    type Stream = NativeStream;

    fn supported(&self) -> bool {
        if !cfg!(feature = "camera") {
            return false;
        }
        match camera::list_devices() {
            Ok(devices) => !devices.is_empty(),
            Err(e) => {
                log::debug!("camera query failed: {}", e);
                false
            }
        }
    }

    #[cfg(feature = "camera")]
    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<NativeStream, StreamError> {
        constraints.validate()?;

        let settings = self.settings.clone();
        // Opening blocks until the capture thread reports back.
        let capture = tokio::task::spawn_blocking(move || {
            let mut capture = camera::CameraCapture::open(settings)?;
            capture.start()?;
            Ok::<_, camera::CameraError>(capture)
        })
        .await
        .map_err(|e| StreamError::Camera(camera::CameraError::StreamFailed(e.to_string())))??;

        Ok(NativeStream { capture })
    }

    #[cfg(not(feature = "camera"))]
    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<NativeStream, StreamError> {
        constraints.validate()?;
        Err(StreamError::Unsupported)
    }
}

/// A running webcam stream. Dropping it stops the capture thread.
#[derive(Debug)]
pub struct NativeStream {
    #[cfg(feature = "camera")]
    capture: camera::CameraCapture,
}

impl MediaStream for NativeStream {
    #[cfg(feature = "camera")]
    fn frames(&self) -> FrameSlot {
        self.capture.frame_slot()
    }

    #[cfg(not(feature = "camera"))]
    fn frames(&self) -> FrameSlot {
        FrameSlot::new()
    }
}

#[cfg(all(test, not(feature = "camera")))]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_without_camera_feature() {
        let devices = NativeDevices::new(CameraSettings::default());
        assert!(!devices.supported());
    }

    #[tokio::test]
    async fn test_request_fails_without_camera_feature() {
        let devices = NativeDevices::new(CameraSettings::default());
        let result = devices
            .request_stream(&StreamConstraints::video_only())
            .await;
        assert!(matches!(result, Err(StreamError::Unsupported)));
    }
}
