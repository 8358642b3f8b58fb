//! One-line status bar at the bottom of the preview.

use crate::ascii::CharSet;
use crate::detection_loop::{LoopState, LoopStatus};
use crate::session::ActivationControl;

/// Shown while the control is offered and the model is ready.
pub const ACTIVATION_PROMPT: &str = "press Enter to enable webcam";

/// Where the model load stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelStatus {
    #[default]
    Loading,
    Ready(String),
    Failed(String),
}

/// Everything the status bar reports.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusInfo {
    pub model: ModelStatus,
    pub control: ActivationControl,
    /// One-time capability diagnostic.
    pub diagnostic: Option<String>,
    /// Last activation failure.
    pub activation_error: Option<String>,
    pub loop_status: Option<LoopStatus>,
    pub charset: CharSet,
}

impl StatusInfo {
    pub fn new(control: ActivationControl, charset: CharSet) -> Self {
        Self {
            model: ModelStatus::Loading,
            control,
            diagnostic: None,
            activation_error: None,
            loop_status: None,
            charset,
        }
    }

    /// Something the user should look at went wrong.
    pub fn has_error(&self) -> bool {
        matches!(self.model, ModelStatus::Failed(_))
            || self.activation_error.is_some()
            || self
                .loop_status
                .as_ref()
                .is_some_and(|s| matches!(s.state, LoopState::Failed(_)))
    }
}

/// Status bar visibility and formatting.
#[derive(Debug, Clone)]
pub struct StatusBar {
    pub visible: bool,
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBar {
    pub fn new() -> Self {
        Self { visible: true }
    }

    pub fn with_visibility(visible: bool) -> Self {
        Self { visible }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// `" model | prompt or error | loop | charset "`, skipping empty parts.
    pub fn format(&self, info: &StatusInfo) -> String {
        let mut parts: Vec<String> = Vec::new();

        parts.push(match &info.model {
            ModelStatus::Loading => "model: loading...".to_string(),
            ModelStatus::Ready(name) => format!("model: {}", name),
            ModelStatus::Failed(e) => format!("model error: {}", e),
        });

        if let Some(diagnostic) = &info.diagnostic {
            parts.push(diagnostic.clone());
        } else if let Some(error) = &info.activation_error {
            parts.push(error.clone());
        } else if matches!(info.model, ModelStatus::Ready(_))
            && info.control.enabled
            && info.control.visible
        {
            parts.push(ACTIVATION_PROMPT.to_string());
        }

        if let Some(status) = &info.loop_status {
            parts.push(format!("detection: {}", status.state));
            if status.state == LoopState::Running {
                let stats = &status.stats;
                parts.push(format!("{:.1} fps", stats.fps));
                parts.push(format!("{} objects", stats.retained));
                if let Some(latency) = stats.last_latency {
                    parts.push(format!("{} ms", latency.as_millis()));
                }
            }
        }

        parts.push(info.charset.name().to_string());
        format!(" {} ", parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection_loop::{LoopError, LoopStats};
    use crate::model::DetectError;
    use std::time::Duration;

    fn control() -> ActivationControl {
        ActivationControl {
            enabled: true,
            visible: true,
        }
    }

    #[test]
    fn test_prompt_only_after_model_ready() {
        let bar = StatusBar::new();
        let mut info = StatusInfo::new(control(), CharSet::Standard);
        assert!(!bar.format(&info).contains(ACTIVATION_PROMPT));

        info.model = ModelStatus::Ready("replay".into());
        let text = bar.format(&info);
        assert!(text.contains("model: replay"));
        assert!(text.contains(ACTIVATION_PROMPT));
    }

    #[test]
    fn test_diagnostic_replaces_prompt() {
        let mut info = StatusInfo::new(
            ActivationControl {
                enabled: false,
                visible: true,
            },
            CharSet::Blocks,
        );
        info.model = ModelStatus::Ready("replay".into());
        info.diagnostic = Some("video capture is not supported".into());
        let text = StatusBar::new().format(&info);
        assert!(text.contains("not supported"));
        assert!(!text.contains(ACTIVATION_PROMPT));
        assert!(text.ends_with("blocks "));
    }

    #[test]
    fn test_running_loop_shows_stats() {
        let mut info = StatusInfo::new(control(), CharSet::Standard);
        info.model = ModelStatus::Ready("tract".into());
        info.control.visible = false;
        info.loop_status = Some(LoopStatus {
            state: LoopState::Running,
            stats: LoopStats {
                iterations: 10,
                last_latency: Some(Duration::from_millis(42)),
                fps: 12.34,
                retained: 3,
            },
        });
        let text = StatusBar::new().format(&info);
        assert!(text.contains("detection: running"));
        assert!(text.contains("12.3 fps"));
        assert!(text.contains("3 objects"));
        assert!(text.contains("42 ms"));
        assert!(!info.has_error());
    }

    #[test]
    fn test_failed_loop_is_an_error() {
        let mut info = StatusInfo::new(control(), CharSet::Standard);
        info.loop_status = Some(LoopStatus {
            state: LoopState::Failed(LoopError::Inference(DetectError::Backend("boom".into()))),
            stats: LoopStats::default(),
        });
        assert!(info.has_error());
        assert!(StatusBar::new().format(&info).contains("boom"));
    }
}
