use crate::paint::Color;

/// Initialization parameters for the wgpu backend.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Present mode (swap behavior).
    ///
    /// FIFO is broadly supported and ties presentation to the display refresh.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Which buffers a service clears on its own at the start of every submission.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AutoClear {
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ToneMapping {
    #[default]
    None,
    Aces,
}

/// Output color space of the presented frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ColorSpace {
    #[default]
    Srgb,
    Linear,
}

/// Context-wide state set once when the canvas mounts.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlobalState {
    pub clear_color: Color,
    pub auto_clear: AutoClear,
    pub tone_mapping: ToneMapping,
    pub color_space: ColorSpace,
}

impl Default for GlobalState {
    /// The canvas host's policy: transparent clear, no automatic clears, no tone mapping.
    fn default() -> Self {
        Self {
            clear_color: Color::transparent(),
            auto_clear: AutoClear::default(),
            tone_mapping: ToneMapping::None,
            color_space: ColorSpace::Srgb,
        }
    }
}
