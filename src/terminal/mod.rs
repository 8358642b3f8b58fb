//! Terminal preview: ratatui lifecycle, ASCII frames, overlays and status.

mod frame;
mod raw_mode;
pub mod rendering;
pub mod scene;
mod status_bar;
mod tui;

pub use frame::{AsciiFrame, Rasterizer};
pub use scene::{project, Scene, ScenePrimitive};
pub use status_bar::{ModelStatus, StatusBar, StatusInfo, ACTIVATION_PROMPT};
pub use tui::Tui;
