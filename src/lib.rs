//! live-detect library crate.
//!
//! Webcam object detection with overlays, previewed as ASCII art in the
//! terminal. The binary wires these modules together; they are public for
//! integration testing.

pub mod app;
pub mod ascii;
pub mod camera;
pub mod cli;
pub mod config;
pub mod detection_loop;
pub mod input;
pub mod media;
pub mod model;
pub mod overlay;
pub mod session;
pub mod terminal;
