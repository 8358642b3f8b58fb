//! Camera device enumeration.

use super::types::{CameraError, CameraInfo};

/// List all available camera devices on the system.
///
/// Asks nokhwa's platform backend (AVFoundation, V4L2 or Media
/// Foundation) for every capture device it can see. The `index` of each
/// entry is what `--camera` and `[camera] device` refer to.
///
/// # Returns
/// A vector of [`CameraInfo`], or `CameraError::QueryFailed` if the
/// backend could not be queried. If no cameras are found, returns an
/// empty vector (not an error).
#[cfg(feature = "camera")]
pub fn list_devices() -> Result<Vec<CameraInfo>, CameraError> {
    use nokhwa::query;
    use nokhwa::utils::ApiBackend;

    let devices = query(ApiBackend::Auto).map_err(|e| CameraError::QueryFailed(e.to_string()))?;

    Ok(devices
        .into_iter()
        .map(|d| CameraInfo {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect())
}

/// Without the `camera` feature there is no capture backend, so no devices.
#[cfg(not(feature = "camera"))]
pub fn list_devices() -> Result<Vec<CameraInfo>, CameraError> {
    Ok(Vec::new())
}
