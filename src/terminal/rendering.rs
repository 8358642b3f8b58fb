//! Drawing the preview, its overlays and the status bar with ratatui.
//!
//! Everything here is pure rendering onto a ratatui frame; terminal
//! lifecycle lives in [`super::Tui`].

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::scene::ScenePrimitive;
use super::{AsciiFrame, StatusBar, StatusInfo};

const HIGHLIGHT_COLOR: Color = Color::LightGreen;

/// What the preview area shows this tick.
#[derive(Debug, Default)]
pub struct PreviewView<'a> {
    pub frame: Option<&'a AsciiFrame>,
    pub overlays: &'a [ScenePrimitive],
    /// Shown centred when there is no frame.
    pub placeholder: &'a str,
}

/// Area left for the preview once the status bar takes the last row.
pub fn preview_area(area: Rect, status_visible: bool) -> Rect {
    if status_visible {
        Rect {
            height: area.height.saturating_sub(1),
            ..area
        }
    } else {
        area
    }
}

/// Where a `width` x `height` grid sits, centred in `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Copy an ASCII frame into the buffer cell by cell, coloured if possible.
pub fn render_ascii(frame: &mut ratatui::Frame, ascii: &AsciiFrame, area: Rect) {
    let buf = frame.buffer_mut();
    for (row, line) in ascii.chars.chunks(ascii.width.max(1) as usize).enumerate() {
        let row = row as u16;
        if row >= area.height {
            break;
        }
        for (col, ch) in line.iter().enumerate() {
            let col = col as u16;
            if col >= area.width {
                break;
            }
            if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                cell.set_char(*ch);
                let fg = ascii
                    .color_at(col, row)
                    .map(|c| Color::Rgb(c.r, c.g, c.b))
                    .unwrap_or(Color::White);
                cell.set_fg(fg);
            }
        }
    }
}

/// Draw overlay primitives relative to the preview's top-left corner.
pub fn render_overlays(frame: &mut ratatui::Frame, overlays: &[ScenePrimitive], area: Rect) {
    for primitive in overlays {
        match primitive {
            ScenePrimitive::Outline(cells) => {
                let rect = Rect {
                    x: area.x + cells.col,
                    y: area.y + cells.row,
                    width: cells.cols,
                    height: cells.rows,
                }
                .intersection(area);
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(HIGHLIGHT_COLOR));
                frame.render_widget(block, rect);
            }
            ScenePrimitive::Text { col, row, text } => {
                let rect = Rect {
                    x: area.x + col,
                    y: area.y + row,
                    width: text.chars().count() as u16,
                    height: 1,
                }
                .intersection(area);
                let label = Paragraph::new(text.as_str()).style(
                    Style::default()
                        .fg(Color::Black)
                        .bg(HIGHLIGHT_COLOR)
                        .add_modifier(Modifier::BOLD),
                );
                frame.render_widget(label, rect);
            }
        }
    }
}

/// Bottom-row status bar; red when reporting an error.
pub fn render_status_bar(
    frame: &mut ratatui::Frame,
    status_bar: &StatusBar,
    info: &StatusInfo,
    area: Rect,
) {
    let status_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1),
        width: area.width,
        height: area.height.min(1),
    };
    let style = if info.has_error() {
        Style::default().fg(Color::White).bg(Color::Red)
    } else {
        Style::default().fg(Color::Black).bg(Color::White)
    };
    let paragraph = Paragraph::new(status_bar.format(info)).style(style);
    frame.render_widget(paragraph, status_area);
}

/// Render the whole screen: preview, overlays, status bar.
pub fn render_full_frame(
    frame: &mut ratatui::Frame,
    view: &PreviewView<'_>,
    status_bar: &StatusBar,
    info: &StatusInfo,
) {
    let area = frame.area();
    let main = preview_area(area, status_bar.visible);

    match view.frame {
        Some(ascii) => {
            let grid = centered(main, ascii.width, ascii.height);
            render_ascii(frame, ascii, grid);
            render_overlays(frame, view.overlays, grid);
        }
        None => {
            let width = view.placeholder.chars().count() as u16;
            let rect = centered(main, width, 1);
            frame.render_widget(
                Paragraph::new(view.placeholder).style(Style::default().fg(Color::DarkGray)),
                rect,
            );
        }
    }

    if status_bar.visible {
        render_status_bar(frame, status_bar, info, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::{CellRect, CharSet};
    use crate::session::ActivationControl;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn info() -> StatusInfo {
        StatusInfo::new(
            ActivationControl {
                enabled: true,
                visible: true,
            },
            CharSet::Standard,
        )
    }

    #[test]
    fn test_centered_fits_inside() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(centered(area, 40, 10), Rect::new(20, 7, 40, 10));
        assert_eq!(centered(area, 100, 30), area);
    }

    #[test]
    fn test_preview_area_reserves_status_row() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(preview_area(area, true).height, 23);
        assert_eq!(preview_area(area, false).height, 24);
    }

    #[test]
    fn test_full_frame_draws_outline_and_label() {
        let backend = TestBackend::new(20, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        let ascii = AsciiFrame::new(20, 7);
        let overlays = vec![
            ScenePrimitive::Outline(CellRect {
                col: 2,
                row: 2,
                cols: 6,
                rows: 3,
            }),
            ScenePrimitive::Text {
                col: 2,
                row: 1,
                text: "cat".to_string(),
            },
        ];
        let view = PreviewView {
            frame: Some(&ascii),
            overlays: &overlays,
            placeholder: "",
        };

        terminal
            .draw(|f| render_full_frame(f, &view, &StatusBar::new(), &info()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        assert_eq!(buffer[(2, 2)].symbol(), "┌");
        assert_eq!(buffer[(7, 4)].symbol(), "┘");
        assert_eq!(buffer[(2, 1)].symbol(), "c");
        assert_eq!(buffer[(4, 1)].symbol(), "t");
        // Status bar on the last row.
        assert_eq!(buffer[(1, 7)].symbol(), "m");
    }

    #[test]
    fn test_placeholder_without_frame() {
        let backend = TestBackend::new(20, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let view = PreviewView {
            frame: None,
            overlays: &[],
            placeholder: "wait",
        };
        let bar = StatusBar::with_visibility(false);
        terminal
            .draw(|f| render_full_frame(f, &view, &bar, &info()))
            .unwrap();
        assert_eq!(terminal.backend().buffer()[(8, 1)].symbol(), "w");
    }
}
