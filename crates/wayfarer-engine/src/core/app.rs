use winit::event::WindowEvent;

use crate::device::WgpuService;
use crate::host::{CanvasHost, TickOutcome};
use crate::input::Key;
use crate::tunnel::LayoutProvider;

/// The host as seen from a window: a canvas bound to that window's surface.
pub type WindowHost<'w> = CanvasHost<WgpuService<'w>>;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by binaries embedding the engine.
///
/// The runtime owns the window and the host; the app owns the layout its
/// viewports follow and decides what to register.
pub trait App {
    /// Called once the canvas is mounted on a new window.
    fn mount(&mut self, host: &mut WindowHost<'_>) -> anyhow::Result<()>;

    /// Anchor geometry for the tunnel.
    fn layout(&self) -> &dyn LayoutProvider;

    /// Called for raw window events after the runtime applied its own handling.
    fn on_window_event(&mut self, host: &mut WindowHost<'_>, event: &WindowEvent) -> AppControl {
        let _ = (host, event);
        AppControl::Continue
    }

    fn on_key(&mut self, host: &mut WindowHost<'_>, key: Key) -> AppControl {
        let _ = (host, key);
        AppControl::Continue
    }

    /// Called after every tick that was due.
    fn on_frame(&mut self, host: &mut WindowHost<'_>, outcome: TickOutcome) -> AppControl {
        let _ = (host, outcome);
        AppControl::Continue
    }
}
