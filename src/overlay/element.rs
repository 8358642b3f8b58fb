//! Overlay elements: the highlight box and the text label drawn per detection.

use crate::model::Detection;

/// Offset applied to a label relative to its highlight, in source pixels.
///
/// The label sits `LABEL_INSET` above the box top and is `LABEL_INSET`
/// narrower than the box.
pub const LABEL_INSET: f32 = 10.0;

/// Axis-aligned rectangle in source pixels, relative to the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn from_bbox(bbox: &[f32; 4]) -> Self {
        Self {
            left: bbox[0],
            top: bbox[1],
            width: bbox[2],
            height: bbox[3],
        }
    }
}

/// Rectangle outlining one detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub rect: Rect,
}

/// Text describing one detection, positioned just above its highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub margin_left: f32,
    pub margin_top: f32,
    pub width: f32,
}

/// One visual artifact on the overlay surface.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayElement {
    Highlight(Highlight),
    Label(Label),
}

impl OverlayElement {
    /// Highlight whose rectangle matches the detection's bbox exactly.
    pub fn highlight_for(detection: &Detection) -> Self {
        OverlayElement::Highlight(Highlight {
            rect: Rect::from_bbox(&detection.bbox),
        })
    }

    /// Label for a detection, offset by [`LABEL_INSET`].
    pub fn label_for(detection: &Detection) -> Self {
        let [x, y, width, _] = detection.bbox;
        OverlayElement::Label(Label {
            text: label_text(&detection.class, detection.score),
            margin_left: x,
            margin_top: y - LABEL_INSET,
            width: width - LABEL_INSET,
        })
    }

    /// The highlight and then the label for one detection.
    pub fn pair_for(detection: &Detection) -> [OverlayElement; 2] {
        [Self::highlight_for(detection), Self::label_for(detection)]
    }

    pub fn as_highlight(&self) -> Option<&Highlight> {
        match self {
            OverlayElement::Highlight(h) => Some(h),
            OverlayElement::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&Label> {
        match self {
            OverlayElement::Label(l) => Some(l),
            OverlayElement::Highlight(_) => None,
        }
    }
}

/// `"{class} - com {round(score * 100)}% de certeza."`
///
/// Rounds half away from zero, so `0.825` becomes `83%`.
pub fn label_text(class: &str, score: f32) -> String {
    format!("{} - com {}% de certeza.", class, (score * 100.0).round() as i64)
}
