//! Camera types and data structures.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Information about an available camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for selection
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// Camera resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Low resolution (320x240)
    pub const LOW: Resolution = Resolution {
        width: 320,
        height: 240,
    };

    /// Medium resolution (640x480) - what most detectors are trained around
    pub const MEDIUM: Resolution = Resolution {
        width: 640,
        height: 480,
    };

    /// High resolution (1280x720)
    pub const HIGH: Resolution = Resolution {
        width: 1280,
        height: 720,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::MEDIUM
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Pixel format of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
}

/// A decoded video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data in RGB format
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
    /// Timestamp when frame was captured
    pub timestamp: Instant,
}

impl Frame {
    /// Build an RGB frame stamped with the current instant.
    pub fn rgb(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        }
    }

    /// A black frame of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::rgb(vec![0; (width as usize) * (height as usize) * 3], width, height)
    }

    /// Get the number of bytes per pixel (3 for RGB).
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
        }
    }

    /// Frame dimensions as a [`Resolution`].
    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }
}

/// Single-slot buffer holding the most recent decoded frame.
///
/// Producers overwrite the slot; readers clone whatever is there. Frames
/// that arrive while nobody reads are dropped, never queued.
///
/// A producer that loses its device marks the slot failed with
/// [`FrameSlot::fail`]. The last frame stays readable, but consumers are
/// expected to check [`FrameSlot::failure`] before trusting it.
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    inner: Arc<Mutex<SlotState>>,
}

#[derive(Debug, Default)]
struct SlotState {
    latest: Option<Frame>,
    failure: Option<String>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored frame.
    pub fn store(&self, frame: Frame) {
        if let Ok(mut state) = self.inner.lock() {
            state.latest = Some(frame);
        }
    }

    /// Clone the latest frame, if any has been stored yet.
    pub fn latest(&self) -> Option<Frame> {
        let state = self.inner.lock().ok()?;
        state.latest.clone()
    }

    /// Whether at least one frame has been stored.
    pub fn has_frame(&self) -> bool {
        self.inner
            .lock()
            .map(|s| s.latest.is_some())
            .unwrap_or(false)
    }

    /// Mark the producer as gone. The first reason recorded wins.
    pub fn fail(&self, reason: impl Into<String>) {
        if let Ok(mut state) = self.inner.lock() {
            if state.failure.is_none() {
                state.failure = Some(reason.into());
            }
        }
    }

    /// Why the producer stopped, if it has.
    pub fn failure(&self) -> Option<String> {
        let state = self.inner.lock().ok()?;
        state.failure.clone()
    }
}

/// Settings for camera capture.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Camera device index
    pub device_index: u32,
    /// Capture resolution
    pub resolution: Resolution,
    /// Target FPS (actual may vary)
    pub fps: u32,
    /// Mirror horizontally (selfie mode)
    pub mirror: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolution: Resolution::default(),
            fps: 30,
            mirror: false,
        }
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("No cameras found")]
    NoDevices,

    #[error("Failed to query cameras: {0}")]
    QueryFailed(String),

    #[error("Failed to open camera: {0}")]
    OpenFailed(String),

    #[error("Camera permission denied. Grant camera access to this terminal and try again")]
    PermissionDenied,

    #[error("Camera device {0} not found. Run 'list-cameras' to see available devices")]
    DeviceNotFound(u32),

    #[error("Failed to start camera stream: {0}")]
    StreamFailed(String),

    #[error("Capture thread is already running")]
    AlreadyRunning,

    #[error("Camera support was not compiled in (enable the `camera` feature)")]
    NotCompiled,
}
