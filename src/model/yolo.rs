//! Pre- and post-processing for YOLOv8-style detection heads.
//!
//! The head emits a `[1, 4 + C, N]` tensor: for each of `N` anchors, a
//! centre-format box in input pixels followed by `C` class scores.

use serde::{Deserialize, Serialize};

use super::labels::class_name;
use super::{DetectError, Detection};
use crate::camera::Frame;

/// Inference parameters for a YOLO model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoloParams {
    /// Square input edge, in pixels.
    pub input_size: u32,
    /// Minimum class score for a candidate to survive decoding.
    pub conf_threshold: f32,
    /// Overlap above which the weaker of two boxes is suppressed.
    pub iou_threshold: f32,
    /// Cap on boxes returned per frame.
    pub max_detections: usize,
}

impl Default for YoloParams {
    fn default() -> Self {
        Self {
            input_size: 640,
            conf_threshold: 0.5,
            iou_threshold: 0.5,
            max_detections: 20,
        }
    }
}

/// Resize `frame` to a `size`x`size` NCHW tensor with values in `[0, 1]`.
///
/// Nearest-neighbour sampling, no letterboxing: boxes are mapped back with
/// independent x/y scale factors in [`decode`].
pub fn preprocess(frame: &Frame, size: u32) -> Vec<f32> {
    let size = size as usize;
    let plane = size * size;
    let mut input = vec![0.0f32; plane * 3];

    if frame.width == 0 || frame.height == 0 || size == 0 {
        return input;
    }

    let src_w = frame.width as usize;
    let src_h = frame.height as usize;
    for y in 0..size {
        let sy = (y * src_h / size).min(src_h - 1);
        for x in 0..size {
            let sx = (x * src_w / size).min(src_w - 1);
            let idx = (sy * src_w + sx) * 3;
            let Some(rgb) = frame.data.get(idx..idx + 3) else {
                continue;
            };
            for channel in 0..3 {
                input[channel * plane + y * size + x] = rgb[channel] as f32 / 255.0;
            }
        }
    }

    input
}

/// Decode a raw head output into detections in frame pixel coordinates.
pub fn decode(
    output: &[f32],
    shape: &[usize],
    frame_width: u32,
    frame_height: u32,
    params: &YoloParams,
) -> Result<Vec<Detection>, DetectError> {
    let (channels, anchors) = match shape {
        [1, c, n] | [c, n] => (*c, *n),
        other => return Err(DetectError::OutputShape(other.to_vec())),
    };
    if channels < 5 || output.len() != channels * anchors {
        return Err(DetectError::OutputShape(shape.to_vec()));
    }

    let at = |channel: usize, anchor: usize| output[channel * anchors + anchor];
    let scale_x = frame_width as f32 / params.input_size as f32;
    let scale_y = frame_height as f32 / params.input_size as f32;
    let max_x = frame_width as f32;
    let max_y = frame_height as f32;

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_index, score) = (4..channels)
            .map(|c| (c - 4, at(c, anchor)))
            .fold((0, f32::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            });
        if !(score >= params.conf_threshold) {
            continue;
        }

        let (cx, cy, w, h) = (
            at(0, anchor),
            at(1, anchor),
            at(2, anchor),
            at(3, anchor),
        );
        let x0 = ((cx - w / 2.0) * scale_x).clamp(0.0, max_x);
        let y0 = ((cy - h / 2.0) * scale_y).clamp(0.0, max_y);
        let x1 = ((cx + w / 2.0) * scale_x).clamp(0.0, max_x);
        let y1 = ((cy + h / 2.0) * scale_y).clamp(0.0, max_y);
        if x1 <= x0 || y1 <= y0 {
            continue;
        }

        candidates.push(Detection::new(
            class_name(class_index),
            score,
            [x0, y0, x1 - x0, y1 - y0],
        ));
    }

    Ok(non_max_suppression(
        candidates,
        params.iou_threshold,
        params.max_detections,
    ))
}

/// Greedy class-agnostic NMS. Output is sorted by descending score.
pub fn non_max_suppression(
    mut candidates: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        if kept
            .iter()
            .all(|k| iou(&k.bbox, &candidate.bbox) <= iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}

/// Intersection over union of two `[x, y, w, h]` boxes.
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix0 = a[0].max(b[0]);
    let iy0 = a[1].max(b[1]);
    let ix1 = (a[0] + a[2]).min(b[0] + b[2]);
    let iy1 = (a[1] + a[3]).min(b[1] + b[3]);

    let intersection = (ix1 - ix0).max(0.0) * (iy1 - iy0).max(0.0);
    let union = a[2] * a[3] + b[2] * b[3] - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}
