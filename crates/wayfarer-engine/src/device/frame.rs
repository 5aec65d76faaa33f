use crate::coords::PixelRect;

use super::kernel::Kernel;
use super::{DeviceError, TargetId};

/// Where a pass samples from.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Source {
    /// Unbound slot; samples read as zero.
    #[default]
    None,
    /// The shared canvas color buffer.
    Canvas,
    Target(TargetId),
}

/// Where a pass writes to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Output {
    Canvas,
    Target(TargetId),
}

/// One kernel invocation over an output, optionally scissored.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub kernel: Kernel,
    pub inputs: [Source; 3],
    pub output: Output,
    /// Physical-pixel scissor on the output. `None` covers the whole output.
    pub scissor: Option<PixelRect>,
}

impl Pass {
    #[inline]
    pub fn new(kernel: Kernel, output: Output) -> Self {
        Self {
            kernel,
            inputs: [Source::None; 3],
            output,
            scissor: None,
        }
    }

    #[inline]
    pub fn to_canvas(kernel: Kernel) -> Self {
        Self::new(kernel, Output::Canvas)
    }

    #[inline]
    pub fn to_target(kernel: Kernel, target: TargetId) -> Self {
        Self::new(kernel, Output::Target(target))
    }

    #[inline]
    pub fn input(mut self, slot: usize, source: Source) -> Self {
        self.inputs[slot] = source;
        self
    }

    #[inline]
    pub fn sample(self, slot: usize, target: TargetId) -> Self {
        self.input(slot, Source::Target(target))
    }

    #[inline]
    pub fn scissor(mut self, rect: PixelRect) -> Self {
        self.scissor = Some(rect);
        self
    }
}

/// A recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Draw(Pass),
    /// Resets the canvas depth buffer to the far plane. Color is untouched.
    ClearDepth,
    /// Fills a render target with a constant value.
    ClearTarget { target: TargetId, value: [f32; 4] },
}

/// Ordered command recording for one submission.
///
/// Nothing executes until the encoder is handed to
/// [`GpuService::submit`](super::GpuService::submit); commands run in push order.
#[derive(Debug, Default)]
pub struct FrameEncoder {
    commands: Vec<Command>,
}

impl FrameEncoder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn draw(&mut self, pass: Pass) {
        self.commands.push(Command::Draw(pass));
    }

    #[inline]
    pub fn clear_depth(&mut self) {
        self.commands.push(Command::ClearDepth);
    }

    #[inline]
    pub fn clear_target(&mut self, target: TargetId, value: [f32; 4]) {
        self.commands.push(Command::ClearTarget { target, value });
    }

    /// Moves all commands of `other` to the end of this encoder.
    #[inline]
    pub fn append(&mut self, other: &mut FrameEncoder) {
        self.commands.append(&mut other.commands);
    }

    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    #[inline]
    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Checks every referenced target against `known` and rejects passes
    /// that sample their own output.
    pub(crate) fn validate(&self, known: impl Fn(TargetId) -> bool) -> Result<(), DeviceError> {
        let check = |id: TargetId| {
            if known(id) {
                Ok(())
            } else {
                Err(DeviceError::UnknownTarget(id))
            }
        };

        for cmd in &self.commands {
            match cmd {
                Command::Draw(pass) => {
                    if let Output::Target(id) = pass.output {
                        check(id)?;
                    }
                    for src in pass.inputs {
                        match (src, pass.output) {
                            (Source::Canvas, Output::Canvas) => {
                                return Err(DeviceError::FeedbackLoop(Output::Canvas));
                            }
                            (Source::Target(a), Output::Target(b)) if a == b => {
                                return Err(DeviceError::FeedbackLoop(pass.output));
                            }
                            (Source::Target(id), _) => check(id)?,
                            _ => {}
                        }
                    }
                }
                Command::ClearTarget { target, .. } => check(*target)?,
                Command::ClearDepth => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_unknown_targets() {
        let mut enc = FrameEncoder::new();
        enc.clear_target(TargetId(7), [0.0; 4]);
        assert_eq!(enc.validate(|_| false), Err(DeviceError::UnknownTarget(TargetId(7))));
        assert_eq!(enc.validate(|_| true), Ok(()));
    }

    #[test]
    fn canvas_cannot_sample_itself() {
        let mut enc = FrameEncoder::new();
        enc.draw(Pass::to_canvas(Kernel::Copy).input(0, Source::Canvas));
        assert_eq!(enc.validate(|_| true), Err(DeviceError::FeedbackLoop(Output::Canvas)));
    }

    #[test]
    fn append_preserves_order() {
        let mut a = FrameEncoder::new();
        a.clear_depth();
        let mut b = FrameEncoder::new();
        b.clear_target(TargetId(1), [1.0; 4]);
        a.append(&mut b);
        assert!(b.is_empty());
        assert_eq!(a.len(), 2);
        assert_eq!(a.commands()[0], Command::ClearDepth);
    }
}
