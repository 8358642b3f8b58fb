//! ASCII preview of camera frames.
//!
//! Frames go through BT.601 luminance, area-average downsampling to the
//! cell grid, then a brightness ramp. [`CellProjection`] maps overlay
//! geometry from frame pixels onto the same grid.

mod charset;
mod dimensions;
mod downsample;
mod grayscale;
mod mapping;

pub use charset::{CharSet, BLOCKS_CHARSET, MINIMAL_CHARSET, STANDARD_CHARSET};
pub use dimensions::{
    calculate_dimensions, calculate_dimensions_with_aspect, CellProjection, CellRect,
    DEFAULT_CHAR_ASPECT_RATIO,
};
pub use downsample::{downsample_colors_into, downsample_into, CellColor};
pub use grayscale::{luma, to_grayscale_into};
pub use mapping::{glyph, map_to_chars_into};
