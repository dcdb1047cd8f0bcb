//! Action commands dispatched to the automation layer
//!
//! An [`ActionCommand`] is the unit handed to an executor: type this text,
//! press this chord, click, scroll. A finalized transcript maps to an ordered
//! sequence of these, and that order is what the user spoke; executors must
//! never reorder or batch them.

use std::fmt;

/// A named, platform-neutral key. Executors translate this into whatever
/// their input backend understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Return,
    Tab,
    Space,
    Backspace,
    Delete,
    Escape,
    Home,
    End,
    PageUp,
    PageDown,
    UpArrow,
    DownArrow,
    LeftArrow,
    RightArrow,
    /// F1..F12
    Function(u8),
    /// A printable character key.
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Shift,
    Control,
    Alt,
    Meta,
}

/// A key plus zero or more modifiers, pressed as one gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub modifiers: Vec<Modifier>,
    pub key: Key,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self {
            modifiers: Vec::new(),
            key,
        }
    }

    pub fn with(modifiers: &[Modifier], key: Key) -> Self {
        Self {
            modifiers: modifiers.to_vec(),
            key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// One discrete instruction for the automation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionCommand {
    /// Type literal text into the focused target.
    TypeText(String),
    /// Press a key chord.
    PressKey(KeyChord),
    /// Click a mouse button at the current pointer position.
    Click(MouseButton),
    /// Scroll by the given number of lines.
    Scroll(ScrollDirection, u32),
}

impl fmt::Display for ActionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionCommand::TypeText(text) => write!(f, "type {:?}", text),
            ActionCommand::PressKey(chord) => {
                write!(f, "press ")?;
                for m in &chord.modifiers {
                    write!(f, "{:?}+", m)?;
                }
                write!(f, "{:?}", chord.key)
            }
            ActionCommand::Click(button) => write!(f, "click {:?}", button),
            ActionCommand::Scroll(dir, lines) => write!(f, "scroll {:?} {}", dir, lines),
        }
    }
}
