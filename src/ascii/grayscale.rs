//! RGB to grayscale conversion using the ITU-R BT.601 luminance formula.

use crate::camera::Frame;

/// Luminance of one RGB pixel using the ITU-R BT.601 formula.
///
/// The formula is: Y = 0.299*R + 0.587*G + 0.114*B
///
/// Integer math keeps floating point out of the per-pixel path. The
/// coefficients are scaled by 1000:
/// - R: 299/1000
/// - G: 587/1000
/// - B: 114/1000
///
/// # Arguments
/// * `r`, `g`, `b` - Channel values of a single pixel
///
/// # Returns
/// The perceived brightness, 0 (black) to 255 (white)
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    // 299 + 587 + 114 = 1000, so white maps back to exactly 255
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

/// Convert an RGB frame to grayscale, reusing an existing buffer.
///
/// Called once per preview frame, so the buffer is cleared and refilled
/// instead of reallocated. A trailing partial pixel (a buffer whose length
/// is not a multiple of 3) is ignored.
///
/// # Arguments
/// * `frame` - An RGB frame from the camera or test pattern
/// * `buffer` - A mutable buffer to store grayscale values
///
/// # Returns
/// The number of pixels written to the buffer
pub fn to_grayscale_into(frame: &Frame, buffer: &mut Vec<u8>) -> usize {
    buffer.clear();

    // One luminance byte per RGB triplet
    buffer.extend(
        frame
            .data
            .chunks_exact(3)
            .map(|rgb| luma(rgb[0], rgb[1], rgb[2])),
    );
    buffer.len()
}
