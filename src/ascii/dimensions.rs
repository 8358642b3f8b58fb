//! Preview sizing and the pixel-to-cell projection used for overlays.

use crate::overlay::Rect;

/// Terminal cells are roughly twice as tall as they are wide.
pub const DEFAULT_CHAR_ASPECT_RATIO: f32 = 2.0;

/// Calculate a preview grid that preserves the image's aspect ratio.
///
/// Terminal cells are about twice as tall as they are wide, so mapping
/// pixels to cells one-to-one stretches the picture vertically. This
/// picks the largest grid that:
/// 1. Fits within `max_cols` x `max_rows`
/// 2. Shows the image at its original proportions once the ~2:1 cell
///    shape is accounted for
///
/// Overlay boxes are projected onto the same grid, so they line up with
/// the picture whatever size the terminal is.
///
/// # Arguments
/// * `img_width` - Width of the source image in pixels
/// * `img_height` - Height of the source image in pixels
/// * `max_cols` - Maximum output width in characters
/// * `max_rows` - Maximum output height in characters
///
/// # Returns
/// `(cols, rows)`, or `(0, 0)` if the image or the bounds are empty.
///
/// # Example
/// ```ignore
/// // 640x480 (4:3) into an 80x24 terminal area
/// let (cols, rows) = calculate_dimensions(640, 480, 80, 24);
/// assert_eq!((cols, rows), (64, 24));
/// ```
pub fn calculate_dimensions(
    img_width: u32,
    img_height: u32,
    max_cols: u16,
    max_rows: u16,
) -> (u16, u16) {
    calculate_dimensions_with_aspect(
        img_width,
        img_height,
        max_cols,
        max_rows,
        DEFAULT_CHAR_ASPECT_RATIO,
    )
}

/// [`calculate_dimensions`] for a font whose cells are `char_aspect`
/// times taller than wide.
pub fn calculate_dimensions_with_aspect(
    img_width: u32,
    img_height: u32,
    max_cols: u16,
    max_rows: u16,
    char_aspect: f32,
) -> (u16, u16) {
    if img_width == 0 || img_height == 0 || max_cols == 0 || max_rows == 0 {
        return (0, 0);
    }

    // Columns per row that keep the picture's proportions.
    let grid_aspect = img_width as f32 / img_height as f32 * char_aspect;

    let rows = (max_cols as f32 / grid_aspect).round() as u16;
    if rows > 0 && rows <= max_rows {
        return (max_cols, rows);
    }

    let cols = ((max_rows as f32 * grid_aspect).round() as u16).min(max_cols);
    (cols.max(1), max_rows)
}

/// A rectangle in character cells, relative to the preview origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub col: u16,
    pub row: u16,
    pub cols: u16,
    pub rows: u16,
}

/// Maps frame pixel coordinates onto a `cols` x `rows` cell grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellProjection {
    scale_x: f32,
    scale_y: f32,
    cols: u16,
    rows: u16,
}

impl CellProjection {
    pub fn new(frame_width: u32, frame_height: u32, cols: u16, rows: u16) -> Self {
        let scale = |cells: u16, pixels: u32| {
            if pixels == 0 {
                0.0
            } else {
                cells as f32 / pixels as f32
            }
        };
        Self {
            scale_x: scale(cols, frame_width),
            scale_y: scale(rows, frame_height),
            cols,
            rows,
        }
    }

    pub fn grid(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    /// Cell containing pixel `(x, y)`, or `None` when off the grid.
    pub fn point(&self, x: f32, y: f32) -> Option<(u16, u16)> {
        let col = (x * self.scale_x).floor();
        let row = (y * self.scale_y).floor();
        if col < 0.0 || row < 0.0 || col >= self.cols as f32 || row >= self.rows as f32 {
            return None;
        }
        Some((col as u16, row as u16))
    }

    /// Cells covered by `rect`, clipped to the grid. Any rectangle that
    /// touches the grid covers at least one cell.
    pub fn rect(&self, rect: &Rect) -> Option<CellRect> {
        let x0 = (rect.left * self.scale_x).floor().max(0.0);
        let y0 = (rect.top * self.scale_y).floor().max(0.0);
        let x1 = ((rect.left + rect.width) * self.scale_x)
            .ceil()
            .min(self.cols as f32);
        let y1 = ((rect.top + rect.height) * self.scale_y)
            .ceil()
            .min(self.rows as f32);

        if x0 >= self.cols as f32 || y0 >= self.rows as f32 || x1 <= 0.0 || y1 <= 0.0 {
            return None;
        }

        let col = x0 as u16;
        let row = y0 as u16;
        Some(CellRect {
            col,
            row,
            cols: (x1 as u16).saturating_sub(col).max(1),
            rows: (y1 as u16).saturating_sub(row).max(1),
        })
    }
}
