//! GPU context ownership and command execution.
//!
//! This module is responsible for:
//! - the [`GpuService`] seam every subsystem allocates and draws through
//! - recording frames ([`FrameEncoder`], [`Pass`]) of full-screen [`Kernel`]s
//! - the wgpu backend bound to a window surface ([`WgpuService`])
//! - a CPU reference backend ([`SoftService`]) with identical semantics

mod error;
mod frame;
mod gpu;
mod init;
pub mod kernel;
mod pipelines;
mod service;
mod soft;
mod surface;

pub use error::{DeviceError, SurfaceErrorAction};
pub use frame::{Command, FrameEncoder, Output, Pass, Source};
pub use gpu::WgpuService;
pub use init::{AutoClear, ColorSpace, GlobalState, GpuInit, ToneMapping};
pub use kernel::{Kernel, KernelKind};
pub use service::{GpuService, TargetDesc, TargetId};
pub use soft::SoftService;
