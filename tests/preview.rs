//! End-to-end tests for the preview pipeline and headless mode.
//!
//! Covers:
//! - Headless run: test pattern + replayed detections, stopped by the shutdown flag
//! - Frame -> ASCII grid -> projected overlays -> ratatui buffer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tempfile::TempDir;

use live_detect::app::{self, AppError, AppSettings};
use live_detect::ascii::{calculate_dimensions, CellProjection, CharSet};
use live_detect::camera::{Frame, Resolution};
use live_detect::config::Config;
use live_detect::detection_loop::{LoopOptions, LoopState};
use live_detect::media::TestPattern;
use live_detect::model::{Detection, ReplayProvider};
use live_detect::overlay::{MemorySurface, OverlayElement, OverlaySurface, SharedSurface};
use live_detect::session::ActivationControl;
use live_detect::terminal::rendering::{preview_area, render_full_frame, PreviewView};
use live_detect::terminal::{project, Rasterizer, ScenePrimitive, StatusBar, StatusInfo};

const SCRIPT: &str = r#"[
  [{"class": "person", "score": 0.91, "bbox": [40, 30, 60, 40]},
   {"class": "dog", "score": 0.30, "bbox": [0, 0, 10, 10]}],
  [{"class": "person", "score": 0.88, "bbox": [42, 30, 60, 40]}]
]"#;

fn settings() -> AppSettings {
    AppSettings {
        charset: CharSet::Standard,
        invert: false,
        fps: 60,
        status_bar: false,
        loop_options: LoopOptions::default(),
    }
}

fn write_script(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("script.json");
    std::fs::write(&path, SCRIPT).unwrap();
    path
}

// ====================
// Headless mode
// ====================

#[tokio::test]
async fn test_headless_run_with_replay() {
    let dir = TempDir::new().unwrap();
    let provider = ReplayProvider::new(write_script(&dir));
    let devices = TestPattern::new(Resolution { width: 160, height: 120 }, 30);
    let surface = SharedSurface::new(MemorySurface::new());
    let shutdown = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&shutdown);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        flag.store(true, Ordering::SeqCst);
    });

    let report = app::run_headless(settings(), devices, provider, surface.clone(), shutdown)
        .await
        .unwrap();

    assert_eq!(report.state, LoopState::Stopped);
    assert!(report.stats.iterations >= 1);
    assert_eq!(report.stats.retained, 1);

    let labels: Vec<String> = surface
        .snapshot()
        .iter()
        .filter_map(|e| e.as_label().map(|l| l.text.clone()))
        .collect();
    assert_eq!(labels.len(), 1);
    assert!(labels[0].starts_with("person - com "));
}

#[tokio::test]
async fn test_headless_missing_model_is_error() {
    let dir = TempDir::new().unwrap();
    let provider = ReplayProvider::new(dir.path().join("missing.json"));
    let result = app::run_headless(
        settings(),
        TestPattern::default(),
        provider,
        SharedSurface::new(MemorySurface::new()),
        Arc::new(AtomicBool::new(true)),
    )
    .await;

    assert!(matches!(result, Err(AppError::Session(_))));
}

#[test]
fn test_settings_follow_config() {
    let mut config = Config::default();
    config.preview.charset = CharSet::Minimal;
    config.detection.min_score = 0.8;
    config.ui.status_bar = false;

    let settings = AppSettings::from(&config);

    assert_eq!(settings.charset, CharSet::Minimal);
    assert_eq!(settings.loop_options.threshold, 0.8);
    assert!(!settings.status_bar);
}

// ====================
// Preview pipeline
// ====================

#[test]
fn test_frame_and_overlays_reach_the_screen() {
    // Dark frame with a bright block where the detection is
    let (width, height) = (80u32, 48u32);
    let mut data = vec![0u8; (width * height * 3) as usize];
    for y in 12..36 {
        for x in 20..60 {
            let i = ((y * width + x) * 3) as usize;
            data[i..i + 3].copy_from_slice(&[255, 255, 255]);
        }
    }
    let frame = Frame::rgb(data, width, height);

    let mut scene = SharedSurface::new(MemorySurface::new());
    let detection = Detection::new("cup", 0.734, [20.0, 12.0, 40.0, 24.0]);
    for element in OverlayElement::pair_for(&detection) {
        scene.append(&element);
    }

    let status_bar = StatusBar::with_visibility(true);
    let screen = Rect::new(0, 0, 40, 13);
    let main = preview_area(screen, status_bar.visible);
    let (cols, rows) = calculate_dimensions(width, height, main.width, main.height);
    assert_eq!((cols, rows), (40, 12));

    let ascii = Rasterizer::new().render(&frame, cols, rows, CharSet::Standard, false);
    let projection = CellProjection::new(width, height, cols, rows);
    let overlays = project(&scene.snapshot(), &projection);
    assert!(matches!(overlays[0], ScenePrimitive::Outline(_)));
    assert_eq!(
        overlays[1],
        ScenePrimitive::Text {
            col: 10,
            row: 0,
            text: "cup - com 73% de certeza.".to_string(),
        }
    );

    let info = StatusInfo::new(
        ActivationControl {
            enabled: true,
            visible: false,
        },
        CharSet::Standard,
    );
    let view = PreviewView {
        frame: Some(&ascii),
        overlays: &overlays,
        placeholder: "",
    };
    let mut terminal = Terminal::new(TestBackend::new(screen.width, screen.height)).unwrap();
    terminal
        .draw(|f| render_full_frame(f, &view, &status_bar, &info))
        .unwrap();

    let buffer = terminal.backend().buffer();
    // Outline corners around the bright block
    assert_eq!(buffer[(10, 3)].symbol(), "┌");
    assert_eq!(buffer[(29, 8)].symbol(), "┘");
    // Label text above it
    assert_eq!(buffer[(10, 0)].symbol(), "c");
    // Dark background stays dark
    assert_eq!(buffer[(1, 10)].symbol(), " ");
}
