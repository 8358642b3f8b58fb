//! Overlay rendering: highlight boxes and labels for detections.

mod element;
mod renderer;
mod surface;

pub use element::{label_text, Highlight, Label, OverlayElement, Rect, LABEL_INSET};
pub use renderer::OverlayRenderer;
pub use surface::{ConsoleSurface, MemorySurface, OverlaySurface, SharedSurface};
