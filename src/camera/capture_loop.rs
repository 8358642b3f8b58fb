//! Background capture thread implementation.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::frame_utils::{convert_to_rgb, mirror_horizontal};
use super::types::{CameraError, CameraSettings, FrameSlot, Resolution};

/// Consecutive failed reads after which the device is treated as gone.
const MAX_READ_FAILURES: u32 = 50;

/// Run the capture loop in a background thread.
///
/// Reports the negotiated resolution and frame rate (or the open error)
/// through `info_tx` before entering the loop. If the device stops
/// delivering frames, the slot is marked failed and the thread exits.
///
/// # Arguments
/// * `settings` - Device, format and mirroring to capture with
/// * `slot` - Shared buffer that receives every decoded frame
/// * `stop` - Set by the owner to end the loop
/// * `info_tx` - One-shot report of the open result
pub fn run_capture_loop(
    settings: CameraSettings,
    slot: FrameSlot,
    stop: Arc<AtomicBool>,
    info_tx: Sender<Result<(Resolution, u32), CameraError>>,
) {
    let index = CameraIndex::Index(settings.device_index);

    let mut camera = match open_camera_with_fallback(&index, &settings) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = info_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = info_tx.send(Err(CameraError::StreamFailed(e.to_string())));
        return;
    }

    let res = camera.resolution();
    let actual_res = Resolution {
        width: res.width(),
        height: res.height(),
    };
    let _ = info_tx.send(Ok((actual_res, camera.frame_rate())));
    log::info!(
        "camera {} streaming at {} @ {} fps",
        settings.device_index,
        actual_res,
        camera.frame_rate()
    );

    let mut dropped = 0u64;
    let mut failures = ReadFailures::default();
    while !stop.load(Ordering::Relaxed) {
        match camera.frame() {
            Ok(raw_frame) => {
                failures.reset();
                match convert_to_rgb(&raw_frame) {
                    Some(mut frame) => {
                        if settings.mirror {
                            mirror_horizontal(&mut frame);
                        }
                        slot.store(frame);
                    }
                    None => {
                        dropped += 1;
                        log::debug!("undecodable camera frame ({} so far)", dropped);
                    }
                }
            }
            Err(e) => {
                log::debug!("camera frame read failed: {}", e);
                if failures.record() {
                    log::error!(
                        "camera {} failed {} reads in a row, giving up: {}",
                        settings.device_index,
                        MAX_READ_FAILURES,
                        e
                    );
                    slot.fail(format!("camera read failed: {}", e));
                    break;
                }
            }
        }

        thread::sleep(Duration::from_millis(1));
    }

    let _ = camera.stop_stream();
    log::info!("camera {} stopped", settings.device_index);
}

/// Counts consecutive read errors against [`MAX_READ_FAILURES`].
#[derive(Debug, Default)]
struct ReadFailures(u32);

impl ReadFailures {
    /// Count one failure. Returns `true` once the bound is reached.
    fn record(&mut self) -> bool {
        self.0 += 1;
        self.0 >= MAX_READ_FAILURES
    }

    fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Try to open a camera with multiple format fallback strategies.
///
/// Order: NV12 (native on macOS), MJPEG (widely supported), then whatever
/// the camera offers at its highest resolution.
fn open_camera_with_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CameraError> {
    let wanted = nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height);
    let format_attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::NV12,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            wanted,
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = String::from("no capture format accepted");

    for requested in format_attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => {
                log::debug!("camera format attempt failed: {}", e);
                last_error = e.to_string();
            }
        }
    }

    Err(classify_open_error(&last_error))
}

/// Map a backend error message onto the camera error taxonomy.
pub(crate) fn classify_open_error(message: &str) -> CameraError {
    let msg = message.to_lowercase();
    if msg.contains("permission")
        || msg.contains("denied")
        || msg.contains("authorization")
        || msg.contains("access")
    {
        CameraError::PermissionDenied
    } else {
        CameraError::OpenFailed(message.to_string())
    }
}
