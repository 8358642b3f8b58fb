//! Camera capture handle and public API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use super::capture_loop::run_capture_loop;
use super::device::list_devices;
use super::types::{CameraError, CameraSettings, Frame, FrameSlot, Resolution};

/// Camera capture handle.
///
/// The camera runs a background thread that continuously captures frames
/// and stores the latest one in a [`FrameSlot`]. Call `start()` to begin
/// capturing and `get_frame()` (or a cloned slot) to read the latest frame.
pub struct CameraCapture {
    /// Latest captured frame (shared with capture thread)
    slot: FrameSlot,
    /// Capture thread handle
    capture_thread: Option<JoinHandle<()>>,
    /// Signal to stop capture thread
    stop_signal: Arc<AtomicBool>,
    /// Current settings
    settings: CameraSettings,
    /// Actual resolution (set after camera opens)
    actual_resolution: Option<Resolution>,
    /// Actual FPS (set after camera opens)
    actual_fps: Option<u32>,
}

impl std::fmt::Debug for CameraCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("settings", &self.settings)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraCapture {
    /// Open a camera with the specified settings.
    ///
    /// This validates that the device exists but does not open the stream
    /// until `start()` is called. The camera itself is opened inside the
    /// background thread, since nokhwa handles are not `Send` on every
    /// platform.
    ///
    /// # Arguments
    /// * `settings` - Device index, requested resolution, frame rate and mirroring
    ///
    /// # Errors
    /// * `CameraError::NoDevices` - If the system reports no cameras at all
    /// * `CameraError::DeviceNotFound` - If the device index doesn't exist
    /// * `CameraError::QueryFailed` - If device enumeration itself fails
    pub fn open(settings: CameraSettings) -> Result<Self, CameraError> {
        // First check that the device exists
        let devices = list_devices()?;
        if devices.is_empty() {
            return Err(CameraError::NoDevices);
        }
        if !devices.iter().any(|d| d.index == settings.device_index) {
            return Err(CameraError::DeviceNotFound(settings.device_index));
        }

        Ok(Self {
            slot: FrameSlot::new(),
            capture_thread: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            settings,
            actual_resolution: None,
            actual_fps: None,
        })
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Resolution negotiated with the camera.
    ///
    /// Returns `None` until `start()` succeeds. This may differ from the
    /// requested resolution if the camera doesn't support it exactly.
    pub fn actual_resolution(&self) -> Option<Resolution> {
        self.actual_resolution
    }

    /// Frame rate negotiated with the camera, once started.
    pub fn actual_fps(&self) -> Option<u32> {
        self.actual_fps
    }

    /// Start capturing frames in a background thread.
    ///
    /// Frames are continuously decoded into the shared [`FrameSlot`]. This
    /// blocks until the thread reports that the stream is open (or failed),
    /// so the negotiated resolution and frame rate are known on return.
    /// If the device later stops delivering frames, the thread marks the
    /// slot failed and exits.
    ///
    /// # Errors
    /// * `CameraError::AlreadyRunning` - If the capture thread is still alive
    /// * `CameraError::PermissionDenied` / `CameraError::OpenFailed` - If no
    ///   capture format could be opened
    /// * `CameraError::StreamFailed` - If the stream did not start
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.is_running() {
            return Err(CameraError::AlreadyRunning);
        }

        self.stop_signal.store(false, Ordering::SeqCst);

        let slot = self.slot.clone();
        let stop = Arc::clone(&self.stop_signal);
        let settings = self.settings.clone();
        let (info_tx, info_rx) = mpsc::channel::<Result<(Resolution, u32), CameraError>>();

        // The thread opens the camera and reports back exactly once
        let handle = std::thread::spawn(move || {
            run_capture_loop(settings, slot, stop, info_tx);
        });
        self.capture_thread = Some(handle);

        match info_rx.recv() {
            Ok(Ok((res, fps))) => {
                self.actual_resolution = Some(res);
                self.actual_fps = Some(fps);
                Ok(())
            }
            Ok(Err(e)) => {
                self.stop();
                Err(e)
            }
            Err(_) => {
                self.stop();
                Err(CameraError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    /// Signal the background thread to stop and wait for it.
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
    }

    /// Get the latest captured frame.
    pub fn get_frame(&self) -> Option<Frame> {
        self.slot.latest()
    }

    /// Shared handle onto the frame buffer.
    pub fn frame_slot(&self) -> FrameSlot {
        self.slot.clone()
    }

    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.stop();
    }
}
