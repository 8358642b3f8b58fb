//! Area-average downsampling from pixels to character cells.

use crate::camera::Frame;

/// RGB colour of one downsampled character cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Pixel span `[start, end)` covered by cell `index` of `cells` along an
/// axis of `pixels`. Never empty while `pixels > 0`.
fn span(index: u16, cells: u16, pixels: u32) -> (u32, u32) {
    let scale = pixels as f32 / cells as f32;
    let start = ((index as f32 * scale) as u32).min(pixels.saturating_sub(1));
    let end = (((index + 1) as f32 * scale) as u32).clamp(start + 1, pixels);
    (start, end)
}

/// Downsample a grayscale image into a character grid, reusing `buffer`.
///
/// Maps image pixels to character cells by averaging the brightness of
/// every pixel a cell covers. This takes the frame from the camera's pixel
/// dimensions down to the terminal's character dimensions. When the grid
/// is larger than the image, each cell still covers at least one pixel, so
/// no cell is left black.
///
/// # Arguments
/// * `gray` - Grayscale pixel data (one byte per pixel, row-major order)
/// * `img_width` - Width of the source image in pixels
/// * `img_height` - Height of the source image in pixels
/// * `cols` - Desired output width in characters
/// * `rows` - Desired output height in characters
/// * `buffer` - A mutable buffer to store the result
///
/// # Returns
/// The number of brightness values written, `cols * rows` in row-major
/// order, or 0 if either grid or image is empty.
///
/// # Example
/// ```ignore
/// // 640x480 camera frame onto a 40x20 grid
/// let written = downsample_into(&gray, 640, 480, 40, 20, &mut cells);
/// assert_eq!(written, 40 * 20);
/// ```
pub fn downsample_into(
    gray: &[u8],
    img_width: u32,
    img_height: u32,
    cols: u16,
    rows: u16,
    buffer: &mut Vec<u8>,
) -> usize {
    buffer.clear();
    // Handle edge cases
    if cols == 0 || rows == 0 || img_width == 0 || img_height == 0 || gray.is_empty() {
        return 0;
    }
    buffer.reserve(cols as usize * rows as usize);

    for cy in 0..rows {
        let (y0, y1) = span(cy, rows, img_height);
        for cx in 0..cols {
            // Pixel bounds for this cell
            let (x0, x1) = span(cx, cols, img_width);

            // Average brightness of all pixels in this cell
            let mut sum = 0u32;
            let mut count = 0u32;
            for py in y0..y1 {
                let row = (py * img_width) as usize;
                for px in x0..x1 {
                    if let Some(&v) = gray.get(row + px as usize) {
                        sum += v as u32;
                        count += 1;
                    }
                }
            }
            // Short buffers leave trailing cells black
            buffer.push(if count > 0 { (sum / count) as u8 } else { 0 });
        }
    }

    buffer.len()
}

/// Downsample an RGB frame into per-cell colours, reusing `buffer`.
///
/// Same cell mapping as [`downsample_into`], averaging each channel
/// separately. Used by the coloured preview so each character can be
/// tinted with the colour of the area it stands for.
///
/// # Arguments
/// * `frame` - An RGB frame (3 bytes per pixel)
/// * `cols` - Desired output width in characters
/// * `rows` - Desired output height in characters
/// * `buffer` - A mutable buffer to store the result
///
/// # Returns
/// The number of colours written to the buffer.
pub fn downsample_colors_into(
    frame: &Frame,
    cols: u16,
    rows: u16,
    buffer: &mut Vec<CellColor>,
) -> usize {
    buffer.clear();
    if cols == 0 || rows == 0 || frame.width == 0 || frame.height == 0 {
        return 0;
    }
    buffer.reserve(cols as usize * rows as usize);

    for cy in 0..rows {
        let (y0, y1) = span(cy, rows, frame.height);
        for cx in 0..cols {
            let (x0, x1) = span(cx, cols, frame.width);
            // Per-channel sums for this cell
            let mut sum = [0u32; 3];
            let mut count = 0u32;
            for py in y0..y1 {
                for px in x0..x1 {
                    let idx = ((py * frame.width + px) * 3) as usize;
                    if let Some(rgb) = frame.data.get(idx..idx + 3) {
                        sum[0] += rgb[0] as u32;
                        sum[1] += rgb[1] as u32;
                        sum[2] += rgb[2] as u32;
                        count += 1;
                    }
                }
            }
            buffer.push(if count > 0 {
                CellColor {
                    r: (sum[0] / count) as u8,
                    g: (sum[1] / count) as u8,
                    b: (sum[2] / count) as u8,
                }
            } else {
                CellColor::default()
            });
        }
    }

    buffer.len()
}
