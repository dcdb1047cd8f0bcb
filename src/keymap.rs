//! Spoken key names
//!
//! Resolves the key and modifier vocabulary used by the "press ..." grammar:
//! "press tab", "press control alt delete", "press f5".

use crate::actions::{Key, Modifier};

/// Resolve a spoken key name (possibly multi-word, already lowercased).
pub fn lookup_key(name: &str) -> Option<Key> {
    let key = match name {
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "space" | "spacebar" => Key::Space,
        "backspace" => Key::Backspace,
        "delete" => Key::Delete,
        "escape" | "esc" => Key::Escape,
        "home" => Key::Home,
        "end" => Key::End,
        "page up" => Key::PageUp,
        "page down" => Key::PageDown,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        _ => {
            // "f1" .. "f12"
            if let Some(digits) = name.strip_prefix('f') {
                if let Ok(n) = digits.parse::<u8>() {
                    if (1..=12).contains(&n) {
                        return Some(Key::Function(n));
                    }
                }
            }
            // Single letter or digit keys
            let mut chars = name.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if c.is_ascii_alphanumeric() {
                    return Some(Key::Char(c));
                }
            }
            return None;
        }
    };
    Some(key)
}

/// Resolve a spoken modifier name.
pub fn lookup_modifier(name: &str) -> Option<Modifier> {
    match name {
        "shift" => Some(Modifier::Shift),
        "control" | "ctrl" => Some(Modifier::Control),
        "alt" | "option" => Some(Modifier::Alt),
        "command" | "cmd" | "super" | "windows" | "meta" => Some(Modifier::Meta),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys() {
        assert_eq!(lookup_key("enter"), Some(Key::Return));
        assert_eq!(lookup_key("return"), Some(Key::Return));
        assert_eq!(lookup_key("page up"), Some(Key::PageUp));
        assert_eq!(lookup_key("escape"), Some(Key::Escape));
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(lookup_key("f1"), Some(Key::Function(1)));
        assert_eq!(lookup_key("f12"), Some(Key::Function(12)));
        assert_eq!(lookup_key("f13"), None);
        assert_eq!(lookup_key("f0"), None);
    }

    #[test]
    fn test_character_keys() {
        assert_eq!(lookup_key("a"), Some(Key::Char('a')));
        assert_eq!(lookup_key("7"), Some(Key::Char('7')));
        assert_eq!(lookup_key("pineapple"), None);
    }

    #[test]
    fn test_modifiers() {
        assert_eq!(lookup_modifier("control"), Some(Modifier::Control));
        assert_eq!(lookup_modifier("ctrl"), Some(Modifier::Control));
        assert_eq!(lookup_modifier("command"), Some(Modifier::Meta));
        assert_eq!(lookup_modifier("banana"), None);
    }
}
