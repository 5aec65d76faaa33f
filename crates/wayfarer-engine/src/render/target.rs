use crate::coords::Extent;
use crate::device::{DeviceError, FrameEncoder, GpuService, TargetDesc, TargetId};

/// A service-owned render target plus its size.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RenderTarget {
    pub id: TargetId,
    pub extent: Extent,
}

impl RenderTarget {
    pub fn create(
        gpu: &mut dyn GpuService,
        label: &str,
        extent: Extent,
    ) -> Result<Self, DeviceError> {
        let desc = TargetDesc::new(label, extent);
        let extent = desc.extent;
        let id = gpu.create_target(desc)?;
        Ok(Self { id, extent })
    }

    /// Creates a target initialized from row-major RGBA floats.
    pub fn with_data(
        gpu: &mut dyn GpuService,
        label: &str,
        extent: Extent,
        rgba: &[f32],
    ) -> Result<Self, DeviceError> {
        let desc = TargetDesc::new(label, extent);
        let extent = desc.extent;
        let id = gpu.create_target_with_data(desc, rgba)?;
        Ok(Self { id, extent })
    }

    #[inline]
    pub fn texel(&self) -> [f32; 2] {
        self.extent.texel()
    }

    pub fn release(self, gpu: &mut dyn GpuService) {
        gpu.release_target(self.id);
    }
}

/// Read/write pair for ping-pong passes.
///
/// Exactly one side is current (`read`). [`swap`](Self::swap) exchanges the
/// handles; texel data never moves.
#[derive(Debug)]
pub struct DoubleTarget {
    read: RenderTarget,
    write: RenderTarget,
}

impl DoubleTarget {
    pub fn create(
        gpu: &mut dyn GpuService,
        label: &str,
        extent: Extent,
    ) -> Result<Self, DeviceError> {
        let read = RenderTarget::create(gpu, &format!("{label} a"), extent)?;
        let write = match RenderTarget::create(gpu, &format!("{label} b"), extent) {
            Ok(t) => t,
            Err(err) => {
                read.release(gpu);
                return Err(err);
            }
        };
        Ok(Self { read, write })
    }

    /// The current result.
    #[inline]
    pub fn read(&self) -> RenderTarget {
        self.read
    }

    /// The side the next pass writes to.
    #[inline]
    pub fn write(&self) -> RenderTarget {
        self.write
    }

    #[inline]
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.read, &mut self.write);
    }

    #[inline]
    pub fn extent(&self) -> Extent {
        self.read.extent
    }

    #[inline]
    pub fn texel(&self) -> [f32; 2] {
        self.read.texel()
    }

    /// Records a zero-fill of both sides.
    pub fn clear(&self, frame: &mut FrameEncoder) {
        frame.clear_target(self.read.id, [0.0; 4]);
        frame.clear_target(self.write.id, [0.0; 4]);
    }

    pub fn release(self, gpu: &mut dyn GpuService) {
        self.read.release(gpu);
        self.write.release(gpu);
    }
}

/// Grid size for a simulation field: `resolution` names the short side of
/// `canvas`, the long side scales with the aspect ratio.
pub fn grid_size(resolution: u32, canvas: Extent) -> Extent {
    let resolution = resolution.max(1);
    if canvas.is_empty() {
        return Extent::new(resolution, resolution);
    }

    let aspect = canvas.aspect();
    let long = (resolution as f32 * aspect.max(1.0 / aspect)).round() as u32;
    if canvas.width >= canvas.height {
        Extent::new(long, resolution)
    } else {
        Extent::new(resolution, long)
    }
}
