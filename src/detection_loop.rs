//! Per-frame detect-and-render loop.
//!
//! Each iteration submits the stream's current frame to the model, clears
//! the overlays drawn for the previous frame, and draws a highlight and a
//! label for every detection above the confidence threshold. Iterations
//! are paced by a [`FramePacer`]; at most one inference is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::media::{MediaStream, StreamError};
use crate::model::{DetectError, Detector};
use crate::overlay::{OverlayRenderer, OverlaySurface};

/// Detections must score strictly above this to be drawn.
pub const CONFIDENCE_THRESHOLD: f32 = 0.50;

/// Weight of the newest sample in the smoothed FPS figure.
const FPS_SMOOTHING: f32 = 0.2;

/// Source of frame-pacing signals.
#[allow(async_fn_in_trait)]
pub trait FramePacer {
    /// Wait for the next frame slot. `false` means the host is gone and
    /// the loop should stop.
    async fn next_frame(&mut self) -> bool;
}

/// Paces the loop on a tokio interval.
///
/// Ticks that elapse while an inference is running are skipped rather
/// than replayed in a burst.
pub struct IntervalPacer {
    interval: Interval,
    shutdown: Option<Arc<AtomicBool>>,
}

impl IntervalPacer {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            shutdown: None,
        }
    }

    /// Pacer ticking `fps` times per second (at least once).
    pub fn from_fps(fps: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / fps.max(1) as f64))
    }

    /// Stop pacing once `flag` is set.
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    fn shutting_down(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

impl FramePacer for IntervalPacer {
    async fn next_frame(&mut self) -> bool {
        if self.shutting_down() {
            return false;
        }
        self.interval.tick().await;
        !self.shutting_down()
    }
}

/// Why a loop ended in [`LoopState::Failed`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoopError {
    #[error("detection failed: {0}")]
    Inference(DetectError),

    #[error("detection did not finish within {0:?}")]
    InferenceTimeout(Duration),

    #[error("video stream failed: {0}")]
    Stream(StreamError),
}

/// Lifecycle of a [`DetectionLoop`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
    /// The pacer ended.
    Stopped,
    Failed(LoopError),
}

impl LoopState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Stopped | LoopState::Failed(_))
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopState::Idle => write!(f, "idle"),
            LoopState::Running => write!(f, "running"),
            LoopState::Stopped => write!(f, "stopped"),
            LoopState::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Loop counters for the status bar and headless logs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopStats {
    /// Completed iterations (frames that went through the model).
    pub iterations: u64,
    /// Wall time of the most recent `detect` call.
    pub last_latency: Option<Duration>,
    /// Smoothed completed iterations per second.
    pub fps: f32,
    /// Detections drawn for the most recent frame.
    pub retained: usize,
}

/// State and stats of a loop, as seen from outside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopStatus {
    pub state: LoopState,
    pub stats: LoopStats,
}

/// Read-only view onto a running loop.
#[derive(Debug, Clone, Default)]
pub struct LoopMonitor {
    status: Arc<Mutex<LoopStatus>>,
}

impl LoopMonitor {
    pub fn snapshot(&self) -> LoopStatus {
        self.status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn state(&self) -> LoopState {
        self.snapshot().state
    }

    fn update(&self, f: impl FnOnce(&mut LoopStatus)) {
        if let Ok(mut status) = self.status.lock() {
            f(&mut status);
        }
    }
}

/// Tunables for one loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopOptions {
    /// Strict lower bound on rendered scores.
    pub threshold: f32,
    /// Give up on a `detect` call after this long. `None` waits forever.
    pub inference_timeout: Option<Duration>,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            threshold: CONFIDENCE_THRESHOLD,
            inference_timeout: None,
        }
    }
}

/// The detect-and-render loop bound to one stream and one surface.
pub struct DetectionLoop<M, S, O>
where
    M: Detector,
    S: MediaStream,
    O: OverlaySurface,
{
    model: Arc<M>,
    stream: S,
    overlays: OverlayRenderer<O>,
    options: LoopOptions,
    monitor: LoopMonitor,
    last_completed: Option<Instant>,
}

impl<M, S, O> DetectionLoop<M, S, O>
where
    M: Detector,
    S: MediaStream,
    O: OverlaySurface,
{
    pub fn new(model: Arc<M>, stream: S, surface: O, options: LoopOptions) -> Self {
        Self {
            model,
            stream,
            overlays: OverlayRenderer::new(surface),
            options,
            monitor: LoopMonitor::default(),
            last_completed: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.monitor.state()
    }

    pub fn stats(&self) -> LoopStats {
        self.monitor.snapshot().stats
    }

    /// Handle that keeps reporting after the loop is moved into a task.
    pub fn monitor(&self) -> LoopMonitor {
        self.monitor.clone()
    }

    pub fn options(&self) -> &LoopOptions {
        &self.options
    }

    pub fn overlays(&self) -> &OverlayRenderer<O> {
        &self.overlays
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Wait for the first frame, then iterate until the pacer ends or an
    /// iteration fails. Returns the terminal state.
    pub async fn run<P: FramePacer>(&mut self, pacer: &mut P) -> LoopState {
        if let Err(e) = self.stream.first_frame().await {
            return self.fail(LoopError::Stream(e));
        }

        self.set_state(LoopState::Running);
        log::info!("detection loop running ({})", self.model.name());

        loop {
            if let Err(e) = self.step().await {
                return self.fail(e);
            }
            if !pacer.next_frame().await {
                log::info!("frame pacer ended, stopping detection loop");
                self.set_state(LoopState::Stopped);
                return LoopState::Stopped;
            }
        }
    }

    /// Run one iteration against the current frame.
    ///
    /// Returns the number of detections drawn, or `None` when the stream
    /// has no frame yet (overlays are left untouched). A stream whose
    /// producer has failed is an error even if a stale frame remains.
    pub async fn step(&mut self) -> Result<Option<usize>, LoopError> {
        self.stream.check_alive().map_err(LoopError::Stream)?;
        let Some(frame) = self.stream.current_frame() else {
            return Ok(None);
        };

        let started = Instant::now();
        let result = match self.options.inference_timeout {
            Some(limit) => tokio::time::timeout(limit, self.model.detect(&frame))
                .await
                .map_err(|_| LoopError::InferenceTimeout(limit))?,
            None => self.model.detect(&frame).await,
        };
        let detections = result.map_err(LoopError::Inference)?;
        let latency = started.elapsed();

        self.overlays.clear();
        let threshold = self.options.threshold;
        let mut drawn = 0;
        for detection in detections.iter().filter(|d| d.score > threshold) {
            self.overlays.add(detection);
            drawn += 1;
        }

        log::debug!(
            "frame {}x{}: {} detections, {} drawn in {:?}",
            frame.width,
            frame.height,
            detections.len(),
            drawn,
            latency
        );
        self.record(latency, drawn);
        Ok(Some(drawn))
    }

    fn record(&mut self, latency: Duration, drawn: usize) {
        let now = Instant::now();
        let instant_fps = self
            .last_completed
            .map(|prev| now.duration_since(prev).as_secs_f32())
            .filter(|secs| *secs > 0.0)
            .map(|secs| 1.0 / secs);
        self.last_completed = Some(now);

        self.monitor.update(|status| {
            let stats = &mut status.stats;
            stats.iterations += 1;
            stats.last_latency = Some(latency);
            stats.retained = drawn;
            if let Some(sample) = instant_fps {
                stats.fps = if stats.fps == 0.0 {
                    sample
                } else {
                    stats.fps + FPS_SMOOTHING * (sample - stats.fps)
                };
            }
        });
    }

    fn set_state(&self, state: LoopState) {
        self.monitor.update(|status| status.state = state);
    }

    fn fail(&mut self, error: LoopError) -> LoopState {
        log::error!("detection loop failed: {}", error);
        self.overlays.clear();
        let state = LoopState::Failed(error);
        self.set_state(state.clone());
        state
    }
}
