//! Synthetic test-pattern device, for running without a webcam.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::camera::{Frame, FrameSlot, Resolution};

use super::{MediaDevices, MediaStream, StreamConstraints, StreamError};

/// A media device that always exists and renders a moving gradient.
#[derive(Debug, Clone, Copy)]
pub struct TestPattern {
    resolution: Resolution,
    fps: u32,
}

impl TestPattern {
    pub fn new(resolution: Resolution, fps: u32) -> Self {
        Self {
            resolution,
            fps: fps.max(1),
        }
    }
}

impl Default for TestPattern {
    fn default() -> Self {
        Self::new(Resolution::LOW, 30)
    }
}

impl MediaDevices for TestPattern {
    type Stream = PatternStream;

    fn supported(&self) -> bool {
        true
    }

    async fn request_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<PatternStream, StreamError> {
        constraints.validate()?;
        Ok(PatternStream::start(self.resolution, self.fps))
    }
}

/// Stream fed by a generator thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct PatternStream {
    slot: FrameSlot,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl PatternStream {
    fn start(resolution: Resolution, fps: u32) -> Self {
        let slot = FrameSlot::new();
        let stop = Arc::new(AtomicBool::new(false));
        let period = Duration::from_secs(1) / fps;

        let worker = {
            let slot = slot.clone();
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                let started = Instant::now();
                while !stop.load(Ordering::Relaxed) {
                    let phase = (started.elapsed().as_millis() / 16) as u32;
                    slot.store(render_pattern(resolution, phase));
                    std::thread::sleep(period);
                }
            })
        };

        Self {
            slot,
            stop,
            worker: Some(worker),
        }
    }
}

impl MediaStream for PatternStream {
    fn frames(&self) -> FrameSlot {
        self.slot.clone()
    }
}

impl Drop for PatternStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Diagonal gradient scrolled by `phase`, with a bright square in the middle.
pub(crate) fn render_pattern(resolution: Resolution, phase: u32) -> Frame {
    let Resolution { width, height } = resolution;
    let mut data = Vec::with_capacity((width as usize) * (height as usize) * 3);

    let (box_x0, box_x1) = (width / 3, width * 2 / 3);
    let (box_y0, box_y1) = (height / 3, height * 2 / 3);

    for y in 0..height {
        for x in 0..width {
            if (box_x0..box_x1).contains(&x) && (box_y0..box_y1).contains(&y) {
                data.extend_from_slice(&[240, 240, 240]);
                continue;
            }
            let v = x.wrapping_add(y).wrapping_add(phase) % 256;
            data.extend_from_slice(&[v as u8, (v / 2) as u8, (255 - v) as u8]);
        }
    }

    Frame::rgb(data, width, height)
}
