//! Frame conversion and transformation utilities.

use super::types::Frame;

/// Convert a nokhwa buffer to an RGB [`Frame`].
///
/// Handles the camera's native formats (MJPEG, YUYV, NV12, ...) through
/// nokhwa's `decode_image`, which converts to packed RGB.
///
/// # Arguments
/// * `buffer` - A raw buffer as returned by `Camera::frame()`
///
/// # Returns
/// The decoded frame at the buffer's resolution, or `None` if the
/// conversion fails (unsupported format or corrupt data).
#[cfg(feature = "camera")]
pub fn convert_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    use nokhwa::pixel_format::RgbFormat;

    let decoded = buffer.decode_image::<RgbFormat>().ok()?;
    let resolution = buffer.resolution();

    Some(Frame::rgb(
        decoded.into_raw(),
        resolution.width(),
        resolution.height(),
    ))
}

/// Mirror a frame horizontally (flip left-right) for selfie mode.
///
/// Works in place, one row at a time. A buffer shorter than its declared
/// dimensions is mirrored up to the last complete row and otherwise left
/// alone.
///
/// # Arguments
/// * `frame` - The frame to flip; any bytes-per-pixel layout
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let bpp = frame.bytes_per_pixel();

    for y in 0..height {
        let row_start = y * width * bpp;
        let Some(row) = frame.data.get_mut(row_start..row_start + width * bpp) else {
            return;
        };

        // Swap pixels from left and right
        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}
