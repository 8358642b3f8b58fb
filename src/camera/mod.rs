//! Camera capture module for webcam access and frame capture.
//!
//! - Device enumeration via [`list_devices`]
//! - Camera capture via `CameraCapture` (requires the `camera` feature)
//! - Frame hand-off via [`FrameSlot`]

#[cfg(feature = "camera")]
mod capture;
#[cfg(feature = "camera")]
mod capture_loop;
mod device;
mod frame_utils;
mod types;

#[cfg(feature = "camera")]
pub use capture::CameraCapture;
pub use device::list_devices;
pub use frame_utils::mirror_horizontal;
pub use types::{
    CameraError, CameraInfo, CameraSettings, Frame, FrameFormat, FrameSlot, Resolution,
};
