//! Character grid for the live preview.

use crate::ascii::{self, CellColor, CharSet};
use crate::camera::Frame;

/// A frame rendered to characters, with an optional colour per cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsciiFrame {
    /// Row-major characters.
    pub chars: Vec<char>,
    /// Same length as `chars` when present.
    pub colors: Option<Vec<CellColor>>,
    pub width: u16,
    pub height: u16,
}

impl AsciiFrame {
    /// A blank grid.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            chars: vec![' '; width as usize * height as usize],
            colors: None,
            width,
            height,
        }
    }

    pub fn from_chars_colored(
        chars: Vec<char>,
        colors: Vec<CellColor>,
        width: u16,
        height: u16,
    ) -> Self {
        Self {
            chars,
            colors: Some(colors),
            width,
            height,
        }
    }

    /// One string per row.
    pub fn rows(&self) -> impl Iterator<Item = String> + '_ {
        self.chars
            .chunks(self.width.max(1) as usize)
            .map(|row| row.iter().collect())
    }

    /// Colour of cell `(col, row)`, if colour data is present.
    pub fn color_at(&self, col: u16, row: u16) -> Option<CellColor> {
        let idx = row as usize * self.width as usize + col as usize;
        self.colors.as_ref()?.get(idx).copied()
    }

    /// Rows joined by newlines.
    pub fn to_string_display(&self) -> String {
        if self.width == 0 || self.height == 0 {
            return String::new();
        }
        self.rows().collect::<Vec<_>>().join("\n")
    }
}

/// Converts camera frames to [`AsciiFrame`]s, reusing its buffers.
#[derive(Debug, Default)]
pub struct Rasterizer {
    gray: Vec<u8>,
    brightness: Vec<u8>,
    chars: Vec<char>,
    colors: Vec<CellColor>,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        frame: &Frame,
        cols: u16,
        rows: u16,
        charset: CharSet,
        invert: bool,
    ) -> AsciiFrame {
        ascii::to_grayscale_into(frame, &mut self.gray);
        ascii::downsample_into(
            &self.gray,
            frame.width,
            frame.height,
            cols,
            rows,
            &mut self.brightness,
        );
        ascii::map_to_chars_into(&self.brightness, charset.chars(), invert, &mut self.chars);
        ascii::downsample_colors_into(frame, cols, rows, &mut self.colors);

        if self.chars.len() != cols as usize * rows as usize {
            return AsciiFrame::new(cols, rows);
        }
        AsciiFrame::from_chars_colored(self.chars.clone(), self.colors.clone(), cols, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_blank() {
        let frame = AsciiFrame::new(4, 2);
        assert_eq!(frame.chars.len(), 8);
        assert!(frame.chars.iter().all(|&c| c == ' '));
        assert_eq!(frame.to_string_display(), "    \n    ");
    }

    #[test]
    fn test_empty_display() {
        assert_eq!(AsciiFrame::default().to_string_display(), "");
    }

    #[test]
    fn test_rasterizer_maps_brightness() {
        // Left pixel black, right pixel white.
        let frame = Frame::rgb(vec![0, 0, 0, 255, 255, 255], 2, 1);
        let mut rasterizer = Rasterizer::new();
        let ascii = rasterizer.render(&frame, 2, 1, CharSet::Standard, false);
        assert_eq!(ascii.chars, vec![' ', '@']);
        assert_eq!(
            ascii.color_at(1, 0),
            Some(CellColor {
                r: 255,
                g: 255,
                b: 255
            })
        );

        let inverted = rasterizer.render(&frame, 2, 1, CharSet::Standard, true);
        assert_eq!(inverted.chars, vec!['@', ' ']);
    }

    #[test]
    fn test_rasterizer_empty_frame_gives_blank_grid() {
        let frame = Frame::rgb(Vec::new(), 0, 0);
        let ascii = Rasterizer::new().render(&frame, 3, 2, CharSet::Minimal, false);
        assert_eq!(ascii, AsciiFrame::new(3, 2));
    }
}
