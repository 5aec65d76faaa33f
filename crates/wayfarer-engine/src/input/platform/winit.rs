use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::Window;

use crate::input::{InputEvent, Key};

/// Translates a winit `WindowEvent` into an engine `InputEvent`.
///
/// Returns `None` for events the engine does not consume.
pub fn translate_window_event(window: &Window, event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),

        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = to_logical_f32(window, *position);
            Some(InputEvent::PointerMoved { x, y })
        }

        WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
            let key = match event.physical_key {
                PhysicalKey::Code(KeyCode::Escape) => Key::Escape,
                PhysicalKey::Code(KeyCode::Space) => Key::Space,
                PhysicalKey::Code(KeyCode::KeyR) => Key::R,
                _ => Key::Other,
            };
            Some(InputEvent::KeyPressed(key))
        }

        _ => None,
    }
}

fn to_logical_f32(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let scale = window.scale_factor();
    let logical = pos.to_logical::<f64>(scale);
    (logical.x as f32, logical.y as f32)
}
