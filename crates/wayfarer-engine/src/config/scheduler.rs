use serde::{Deserialize, Serialize};

/// When the host renders.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameLoop {
    /// Only after an explicit request.
    #[default]
    Demand,
    /// Every tick.
    Always,
    /// Never on its own; only `force_render`.
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    pub frameloop: FrameLoop,
    /// Quiet period before a resize reallocates shared targets.
    pub resize_debounce_ms: u64,
    /// Quiet period before scroll/resize listeners refresh anchor rects.
    pub layout_debounce_ms: u64,
    /// Frame counter rate used to quantize depth clears.
    pub depth_clear_rate: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frameloop: FrameLoop::Demand,
            resize_debounce_ms: 150,
            layout_debounce_ms: 100,
            depth_clear_rate: 60,
        }
    }
}
