//! Session wiring for the interactive preview and headless mode.
//!
//! The TUI runs on one cooperative task: a `tokio::select!` over keyboard
//! events, the model load, the detection loop and the preview ticker.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::layout::Rect;
use tokio::time::MissedTickBehavior;

use crate::ascii::{calculate_dimensions, CellProjection, CharSet};
use crate::camera::{Frame, FrameSlot};
use crate::config::Config;
use crate::detection_loop::{
    IntervalPacer, LoopError, LoopMonitor, LoopOptions, LoopState, LoopStats,
};
use crate::input::{handle_key_event, AppAction};
use crate::media::{MediaDevices, MediaStream};
use crate::model::{Detector, ModelProvider};
use crate::overlay::{MemorySurface, OverlaySurface};
use crate::session::{ActivationError, ActivationOutcome, Session, SessionError};
use crate::terminal::rendering::{preview_area, PreviewView};
use crate::terminal::{
    project, ModelStatus, Rasterizer, Scene, StatusBar, StatusInfo, Tui, ACTIVATION_PROMPT,
};

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Activation(#[from] ActivationError),

    #[error(transparent)]
    Loop(#[from] LoopError),

    #[error("video capture is not supported on this system")]
    Unsupported,

    #[error("detection model is not loaded")]
    ModelNotReady,

    #[error("camera was already activated in this session")]
    AlreadyActive,
}

/// Unwrap the loop from an activation, or say why there is none.
fn started<L>(outcome: ActivationOutcome<L>) -> Result<L, AppError> {
    match outcome {
        ActivationOutcome::Started(detection_loop) => Ok(detection_loop),
        ActivationOutcome::Unsupported => Err(AppError::Unsupported),
        ActivationOutcome::ModelNotReady => Err(AppError::ModelNotReady),
        ActivationOutcome::AlreadyActive => Err(AppError::AlreadyActive),
    }
}

/// Run-time settings shared by both modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppSettings {
    pub charset: CharSet,
    pub invert: bool,
    pub fps: u32,
    pub status_bar: bool,
    pub loop_options: LoopOptions,
}

impl From<&Config> for AppSettings {
    fn from(config: &Config) -> Self {
        Self {
            charset: config.preview.charset,
            invert: config.preview.invert,
            fps: config.preview.fps.max(1),
            status_bar: config.ui.status_bar,
            loop_options: config.loop_options(),
        }
    }
}

impl AppSettings {
    fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

/// Run the interactive preview until the user quits.
pub async fn run_tui<D, P>(settings: AppSettings, devices: D, provider: P) -> Result<(), AppError>
where
    D: MediaDevices,
    P: ModelProvider,
{
    let mut session: Session<D, P::Model> = Session::new(devices, settings.loop_options);
    let scene = Scene::new(MemorySurface::new());

    let mut charset = settings.charset;
    let mut status_bar = StatusBar::with_visibility(settings.status_bar);
    let mut info = StatusInfo::new(session.control(), charset);
    info.diagnostic = session.diagnostic().map(str::to_string);

    let load = provider.load();
    tokio::pin!(load);
    let mut loading = true;

    let mut running: Option<Pin<Box<dyn Future<Output = LoopState> + '_>>> = None;
    let mut frames: Option<FrameSlot> = None;
    let mut monitor: Option<LoopMonitor> = None;

    let mut tui = Tui::new()?;
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(settings.frame_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut rasterizer = Rasterizer::new();

    loop {
        tokio::select! {
            result = &mut load, if loading => {
                loading = false;
                match result {
                    Ok(model) => {
                        info.model = ModelStatus::Ready(model.name().to_string());
                        session.install_model(model)?;
                    }
                    Err(e) => {
                        log::error!("model load failed: {}", e);
                        info.model = ModelStatus::Failed(e.to_string());
                    }
                }
            }

            state = async {
                match running.as_mut() {
                    Some(detection) => detection.await,
                    None => std::future::pending().await,
                }
            }, if running.is_some() => {
                running = None;
                log::info!("detection loop ended: {}", state);
            }

            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => match handle_key_event(key) {
                        AppAction::Quit => break,
                        AppAction::CycleCharset => {
                            charset = charset.next();
                            info.charset = charset;
                        }
                        AppAction::ToggleStatusBar => status_bar.toggle(),
                        AppAction::Activate => {
                            match session.activate(scene.clone()).await {
                                Ok(ActivationOutcome::Started(mut detection_loop)) => {
                                    frames = Some(detection_loop.stream().frames());
                                    monitor = Some(detection_loop.monitor());
                                    let mut pacer = IntervalPacer::new(settings.frame_period());
                                    running = Some(Box::pin(async move {
                                        detection_loop.run(&mut pacer).await
                                    }));
                                }
                                Ok(outcome) => log::debug!("activation ignored: {:?}", outcome),
                                Err(e) => info.activation_error = Some(e.to_string()),
                            }
                            info.control = session.control();
                        }
                        AppAction::None => {}
                    },
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }

            _ = ticker.tick() => {
                info.loop_status = monitor.as_ref().map(LoopMonitor::snapshot);
                let frame = frames.as_ref().and_then(FrameSlot::latest);
                let placeholder = placeholder(&info, frames.is_some());
                draw(
                    &mut tui,
                    &mut rasterizer,
                    frame.as_ref(),
                    &scene,
                    &status_bar,
                    &info,
                    settings.invert,
                    placeholder,
                )?;
            }
        }
    }

    tui.restore()?;
    Ok(())
}

/// Text shown in place of the preview before frames arrive.
fn placeholder(info: &StatusInfo, streaming: bool) -> &'static str {
    match (&info.model, streaming) {
        (_, true) => "waiting for camera...",
        (ModelStatus::Loading, false) => "loading model...",
        (ModelStatus::Failed(_), false) => "model failed to load",
        (ModelStatus::Ready(_), false) if info.control.enabled && info.control.visible => {
            ACTIVATION_PROMPT
        }
        (ModelStatus::Ready(_), false) => "camera unavailable",
    }
}

#[allow(clippy::too_many_arguments)]
fn draw(
    tui: &mut Tui,
    rasterizer: &mut Rasterizer,
    frame: Option<&Frame>,
    scene: &Scene,
    status_bar: &StatusBar,
    info: &StatusInfo,
    invert: bool,
    placeholder: &str,
) -> std::io::Result<()> {
    let size = tui.terminal().size()?;
    let main = preview_area(Rect::new(0, 0, size.width, size.height), status_bar.visible);

    let rendered = frame.map(|frame| {
        let (cols, rows) =
            calculate_dimensions(frame.width, frame.height, main.width, main.height);
        let ascii = rasterizer.render(frame, cols, rows, info.charset, invert);
        let projection = CellProjection::new(frame.width, frame.height, cols, rows);
        (ascii, project(&scene.snapshot(), &projection))
    });

    let view = match &rendered {
        Some((ascii, overlays)) => PreviewView {
            frame: Some(ascii),
            overlays,
            placeholder,
        },
        None => PreviewView {
            frame: None,
            overlays: &[],
            placeholder,
        },
    };
    tui.draw(&view, status_bar, info)
}

/// Summary of a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessReport {
    pub state: LoopState,
    pub stats: LoopStats,
}

/// Load the model, activate straight away and run until `shutdown` is set.
///
/// Each frame's labels go to `surface`. A failed loop is returned as an
/// error after its stats are logged.
pub async fn run_headless<D, P, O>(
    settings: AppSettings,
    devices: D,
    provider: P,
    surface: O,
    shutdown: Arc<AtomicBool>,
) -> Result<HeadlessReport, AppError>
where
    D: MediaDevices,
    P: ModelProvider,
    O: OverlaySurface,
{
    let mut session: Session<D, P::Model> = Session::new(devices, settings.loop_options);
    session.load_model(provider).await?;

    let mut detection_loop = started(session.activate(surface).await?)?;

    let mut pacer = IntervalPacer::new(settings.frame_period()).with_shutdown(shutdown);
    let state = detection_loop.run(&mut pacer).await;
    let stats = detection_loop.stats();
    log::info!(
        "headless run finished: {} after {} frames ({:.1} fps)",
        state,
        stats.iterations,
        stats.fps
    );

    if let LoopState::Failed(e) = state {
        return Err(e.into());
    }
    Ok(HeadlessReport { state, stats })
}
