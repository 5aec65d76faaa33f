use crate::coords::Extent;

use super::{DeviceError, FrameEncoder, GlobalState};

/// Opaque handle to a render target owned by a [`GpuService`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub(crate) u32);

/// Render target description. Storage is always RGBA floating point.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDesc {
    pub label: String,
    pub extent: Extent,
}

impl TargetDesc {
    pub fn new(label: impl Into<String>, extent: Extent) -> Self {
        Self {
            label: label.into(),
            extent: Extent::new(extent.width.max(1), extent.height.max(1)),
        }
    }
}

/// The single owner of the GPU context for a mounted canvas.
///
/// The host holds exactly one service for the canvas' lifetime and passes it
/// explicitly to the subsystems that allocate resources; nothing reaches for a
/// global. Implementations: [`WgpuService`](super::WgpuService) on real
/// hardware and [`SoftService`](super::SoftService), a CPU reference used by tests.
pub trait GpuService {
    /// Applies clear color, auto-clear flags, tone mapping and color space.
    ///
    /// Called once per context lifetime by the host.
    fn apply_global_state(&mut self, state: &GlobalState);

    /// Canvas size in physical pixels.
    fn canvas_extent(&self) -> Extent;

    /// Reallocates the canvas color/depth buffers. Contents are undefined afterwards.
    fn resize_canvas(&mut self, extent: Extent);

    fn create_target(&mut self, desc: TargetDesc) -> Result<TargetId, DeviceError>;

    /// Creates a target initialized from row-major RGBA floats.
    fn create_target_with_data(
        &mut self,
        desc: TargetDesc,
        rgba: &[f32],
    ) -> Result<TargetId, DeviceError>;

    /// Frees a target. Unknown ids are ignored.
    fn release_target(&mut self, id: TargetId);

    fn target_extent(&self, id: TargetId) -> Option<Extent>;

    /// Whether `id` names a target that has not been released.
    fn is_live(&self, id: TargetId) -> bool {
        self.target_extent(id).is_some()
    }

    /// Checks recorded commands the way [`submit`](Self::submit) will, without
    /// running them: every target must be live and no pass may sample its output.
    fn validate(&self, commands: &FrameEncoder) -> Result<(), DeviceError> {
        commands.validate(|id| self.is_live(id))
    }

    /// Number of targets currently allocated.
    fn live_targets(&self) -> usize;

    /// Executes every recorded command in order as one GPU submission.
    fn submit(&mut self, frame: FrameEncoder) -> Result<(), DeviceError>;

    /// Re-creates the context after a loss. Every live `TargetId` stays valid;
    /// contents are zeroed. Global state must be applied again.
    fn restore(&mut self) -> Result<(), DeviceError>;

    /// Number of successful submissions so far.
    fn submissions(&self) -> u64;
}
