use egui::Key;
use teleop::{KeyId, SpecialKey};

/// Translate an egui key into the teleop vocabulary. Keys outside it map to `None`.
pub fn key_id(key: Key) -> Option<KeyId> {
    let special = match key {
        Key::Escape => SpecialKey::Esc,
        Key::ArrowUp => SpecialKey::Up,
        Key::ArrowDown => SpecialKey::Down,
        Key::ArrowLeft => SpecialKey::Left,
        Key::ArrowRight => SpecialKey::Right,
        Key::Space => SpecialKey::Space,
        Key::Enter => SpecialKey::Enter,
        Key::Tab => SpecialKey::Tab,
        Key::Backspace => SpecialKey::Backspace,
        // letters and digits are named by their single character
        other => {
            let mut chars = other.name().chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => Some(KeyId::char(c)),
                _ => None,
            };
        }
    };
    Some(KeyId::Special(special))
}
