//! Overlay elements projected from frame pixels onto the preview grid.

use crate::ascii::{CellProjection, CellRect};
use crate::overlay::{MemorySurface, OverlayElement, SharedSurface};

/// The overlay surface the terminal preview draws from.
pub type Scene = SharedSurface<MemorySurface>;

/// Something to draw on top of the preview, in cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenePrimitive {
    /// A box-drawn outline.
    Outline(CellRect),
    /// Text starting at `(col, row)`, already clipped to the grid.
    Text { col: u16, row: u16, text: String },
}

/// Project overlay elements onto a preview grid, keeping their order.
///
/// Elements entirely off the grid are dropped. Labels above the top edge
/// are pulled down to row 0 and label text is clipped at the right edge.
pub fn project(elements: &[OverlayElement], projection: &CellProjection) -> Vec<ScenePrimitive> {
    let (cols, rows) = projection.grid();
    if cols == 0 || rows == 0 {
        return Vec::new();
    }

    elements
        .iter()
        .filter_map(|element| match element {
            OverlayElement::Highlight(h) => projection.rect(&h.rect).map(ScenePrimitive::Outline),
            OverlayElement::Label(label) => {
                let (col, row) = projection
                    .point(label.margin_left.max(0.0), label.margin_top.max(0.0))?;
                let room = (cols - col) as usize;
                let text: String = label.text.chars().take(room).collect();
                Some(ScenePrimitive::Text { col, row, text })
            }
        })
        .collect()
}
