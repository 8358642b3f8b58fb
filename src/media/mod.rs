//! Media capture boundary: capability check and video stream acquisition.
//!
//! [`MediaDevices`] is the host's capture capability. The session asks it
//! once whether capture is supported at all, and later requests a single
//! video-only [`MediaStream`] on user intent.

mod native;
mod pattern;

use std::time::Duration;

use tokio::time::Instant;

use crate::camera::{CameraError, Frame, FrameSlot};

pub use native::{NativeDevices, NativeStream};
pub use pattern::{PatternStream, TestPattern};

/// How long to wait for the first decoded frame of a new stream.
pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll interval while waiting for the first frame.
const FIRST_FRAME_POLL: Duration = Duration::from_millis(5);

/// Options for a stream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub video: bool,
    pub audio: bool,
}

impl StreamConstraints {
    /// Video only, audio explicitly excluded.
    pub const fn video_only() -> Self {
        Self {
            video: true,
            audio: false,
        }
    }

    /// Reject constraint sets this crate cannot satisfy.
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.audio {
            return Err(StreamError::AudioNotSupported);
        }
        if !self.video {
            return Err(StreamError::VideoRequired);
        }
        Ok(())
    }
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self::video_only()
    }
}

/// Errors from stream acquisition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("audio capture is not supported")]
    AudioNotSupported,

    #[error("a stream request must ask for video")]
    VideoRequired,

    #[error("video capture is not supported on this system")]
    Unsupported,

    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera device available")]
    NoDevice,

    #[error("no frame decoded within {0:?}")]
    NoFrames(Duration),

    #[error("video stream ended: {0}")]
    Ended(String),

    #[error(transparent)]
    Camera(CameraError),
}

impl From<CameraError> for StreamError {
    fn from(e: CameraError) -> Self {
        match e {
            CameraError::PermissionDenied => StreamError::PermissionDenied,
            CameraError::NoDevices | CameraError::DeviceNotFound(_) => StreamError::NoDevice,
            CameraError::NotCompiled => StreamError::Unsupported,
            other => StreamError::Camera(other),
        }
    }
}

/// A live video stream bound to a display.
#[allow(async_fn_in_trait)]
pub trait MediaStream {
    /// Shared handle onto the stream's latest-frame buffer.
    fn frames(&self) -> FrameSlot;

    /// The frame currently shown, if one has been decoded.
    fn current_frame(&self) -> Option<Frame> {
        self.frames().latest()
    }

    /// `Err` once the producer behind the stream has given up.
    fn check_alive(&self) -> Result<(), StreamError> {
        match self.frames().failure() {
            Some(reason) => Err(StreamError::Ended(reason)),
            None => Ok(()),
        }
    }

    /// Wait until the first frame has been decoded.
    async fn first_frame(&self) -> Result<Frame, StreamError> {
        let slot = self.frames();
        let started = Instant::now();
        loop {
            if let Some(reason) = slot.failure() {
                return Err(StreamError::Ended(reason));
            }
            if let Some(frame) = slot.latest() {
                return Ok(frame);
            }
            if started.elapsed() >= FIRST_FRAME_TIMEOUT {
                return Err(StreamError::NoFrames(FIRST_FRAME_TIMEOUT));
            }
            tokio::time::sleep(FIRST_FRAME_POLL).await;
        }
    }
}

/// The host's media capture capability.
#[allow(async_fn_in_trait)]
pub trait MediaDevices {
    type Stream: MediaStream;

    /// Pure query: can this host capture video at all?
    fn supported(&self) -> bool;

    /// Request a live stream matching `constraints`.
    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Self::Stream, StreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlotStream(FrameSlot);

    impl MediaStream for SlotStream {
        fn frames(&self) -> FrameSlot {
            self.0.clone()
        }
    }

    #[test]
    fn test_video_only_constraints_validate() {
        let constraints = StreamConstraints::video_only();
        assert!(constraints.video);
        assert!(!constraints.audio);
        assert!(constraints.validate().is_ok());
        assert_eq!(StreamConstraints::default(), constraints);
    }

    #[test]
    fn test_audio_constraints_rejected() {
        let constraints = StreamConstraints {
            video: true,
            audio: true,
        };
        assert_eq!(constraints.validate(), Err(StreamError::AudioNotSupported));

        let constraints = StreamConstraints {
            video: false,
            audio: false,
        };
        assert_eq!(constraints.validate(), Err(StreamError::VideoRequired));
    }

    #[test]
    fn test_camera_errors_map_to_stream_errors() {
        assert_eq!(
            StreamError::from(CameraError::PermissionDenied),
            StreamError::PermissionDenied
        );
        assert_eq!(
            StreamError::from(CameraError::DeviceNotFound(3)),
            StreamError::NoDevice
        );
        assert_eq!(
            StreamError::from(CameraError::NotCompiled),
            StreamError::Unsupported
        );
        assert!(matches!(
            StreamError::from(CameraError::StreamFailed("x".into())),
            StreamError::Camera(_)
        ));
    }

    #[tokio::test]
    async fn test_first_frame_returns_once_available() {
        let slot = FrameSlot::new();
        let stream = SlotStream(slot.clone());
        slot.store(Frame::blank(2, 2));
        let frame = stream.first_frame().await.unwrap();
        assert_eq!(frame.width, 2);
        assert!(stream.current_frame().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_frame_times_out() {
        let stream = SlotStream(FrameSlot::new());
        let result = stream.first_frame().await;
        assert_eq!(result.unwrap_err(), StreamError::NoFrames(FIRST_FRAME_TIMEOUT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_slot_ends_stream() {
        let slot = FrameSlot::new();
        let stream = SlotStream(slot.clone());
        assert!(stream.check_alive().is_ok());

        slot.fail("camera disconnected");

        let ended = StreamError::Ended("camera disconnected".to_string());
        assert_eq!(stream.check_alive(), Err(ended.clone()));
        assert_eq!(stream.first_frame().await.unwrap_err(), ended);
    }
}
