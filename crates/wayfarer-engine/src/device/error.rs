use std::fmt;

use super::{Output, TargetId};

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); the context must be restored.
    Fatal,
}

/// Errors reported by a [`GpuService`](super::GpuService).
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// The context is gone; nothing renders until `restore` succeeds.
    ContextLost,
    /// A command referenced a target that was never created or already released.
    UnknownTarget(TargetId),
    /// Upload data length did not match the target size.
    InvalidData { expected: usize, actual: usize },
    /// A pass sampled the surface it writes to.
    FeedbackLoop(Output),
    /// Backend-specific failure (adapter/device acquisition, validation).
    Backend(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::ContextLost => write!(f, "GPU context lost"),
            DeviceError::UnknownTarget(id) => write!(f, "unknown render target {id:?}"),
            DeviceError::InvalidData { expected, actual } => {
                write!(f, "invalid texel data: expected {expected} floats, got {actual}")
            }
            DeviceError::FeedbackLoop(output) => {
                write!(f, "pass samples its own output {output:?}")
            }
            DeviceError::Backend(msg) => write!(f, "GPU backend error: {msg}"),
        }
    }
}

impl std::error::Error for DeviceError {}
