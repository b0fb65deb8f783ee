use atelier_portal::platform::InputEvent;
use winit::event::MouseScrollDelta;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pixels scrolled per wheel notch for line-based devices.
const LINE_HEIGHT_PX: f32 = 100.0;

/// Keyboard shortcuts: Enter/Space continue, Backspace goes back.
pub fn key_event(key: PhysicalKey, pressed: bool) -> Option<InputEvent> {
    if !pressed {
        return None;
    }
    match key {
        PhysicalKey::Code(KeyCode::Enter)
        | PhysicalKey::Code(KeyCode::NumpadEnter)
        | PhysicalKey::Code(KeyCode::Space) => Some(InputEvent::Confirm),
        PhysicalKey::Code(KeyCode::Backspace) | PhysicalKey::Code(KeyCode::BrowserBack) => {
            Some(InputEvent::Back)
        }
        _ => None,
    }
}

/// Positive when scrolling down, like a browser's `deltaY`.
pub fn wheel_delta(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT_PX,
        MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn keys_map_to_navigation() {
        let enter = PhysicalKey::Code(KeyCode::Enter);
        assert_eq!(key_event(enter, true), Some(InputEvent::Confirm));
        assert_eq!(key_event(enter, false), None);
        assert_eq!(
            key_event(PhysicalKey::Code(KeyCode::Backspace), true),
            Some(InputEvent::Back)
        );
        assert_eq!(key_event(PhysicalKey::Code(KeyCode::KeyA), true), None);
    }

    #[test]
    fn scrolling_down_is_positive() {
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, -1.0)), 100.0);
        assert_eq!(
            wheel_delta(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 40.0))),
            -40.0
        );
    }
}
