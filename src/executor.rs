//! Action execution
//!
//! The automation layer behind [`ActionExecutor`] is opaque to the pipeline:
//! one command in, success or a per-command error out, no rollback. Commands
//! execute strictly in submission order, since out-of-order punctuation or editing
//! corrupts the dictated text, so there is no batching here and never will
//! be.

use tracing::info;

use crate::actions::ActionCommand;
use crate::error::ExecutionError;

/// Execution capability. Must be safe to call with no focused target:
/// report [`ExecutionError::NoTarget`], never fault.
pub trait ActionExecutor: Send {
    fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutionError>;
}

impl<T: ActionExecutor + ?Sized> ActionExecutor for Box<T> {
    fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutionError> {
        (**self).execute(command)
    }
}

/// How text reaches the focused window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMethod {
    /// Native text input (default, more reliable).
    #[default]
    Direct,
    /// Copy to clipboard, then paste. Falls back to direct on failure.
    Clipboard,
}

impl InputMethod {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "clipboard" => InputMethod::Clipboard,
            _ => InputMethod::Direct,
        }
    }
}

/// Logs commands instead of injecting them. Used by `--dry-run`.
#[derive(Default)]
pub struct DryRunExecutor {
    executed: usize,
}

impl DryRunExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> usize {
        self.executed
    }
}

impl ActionExecutor for DryRunExecutor {
    fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutionError> {
        self.executed += 1;
        info!(%command, "dry-run");
        Ok(())
    }
}

/// Leading-space and capitalization fixup for dictated text. Pure so it can
/// be tested without an input backend; the enigo executor owns the state.
pub(crate) fn prepare_text(last_char: Option<char>, capitalize_next: bool, text: &str) -> String {
    let mut result = String::new();

    let needs_space = last_char.is_some_and(|c| {
        c.is_alphanumeric()
            || matches!(c, ')' | ']' | '}' | '"' | '\'')
            || matches!(c, ',' | '.' | '!' | '?' | ':' | ';')
    });
    if needs_space && !text.is_empty() {
        let first = text.chars().next().unwrap();
        if !first.is_ascii_punctuation() {
            result.push(' ');
        }
    }

    if capitalize_next && !text.is_empty() {
        let mut chars = text.chars();
        if let Some(c) = chars.next() {
            result.extend(c.to_uppercase());
            result.push_str(chars.as_str());
        }
    } else {
        result.push_str(text);
    }

    result
}

fn ends_sentence(c: char) -> bool {
    c == '.' || c == '!' || c == '?'
}

#[cfg(feature = "typing")]
pub use enigo_executor::EnigoExecutor;

#[cfg(feature = "typing")]
mod enigo_executor {
    use std::thread;
    use std::time::Duration;

    use arboard::Clipboard;
    use enigo::{Axis, Button, Direction, Enigo, Key as EnigoKey, Keyboard, Mouse, Settings};
    use tracing::warn;

    use super::{ActionExecutor, InputMethod, ends_sentence, prepare_text};
    use crate::actions::{
        ActionCommand, Key, KeyChord, Modifier, MouseButton, ScrollDirection,
    };
    use crate::error::ExecutionError;

    /// Keyboard/mouse injection via enigo, with clipboard-paste as an
    /// alternative text path. Tracks the last typed character so dictated
    /// fragments get sensible spacing and sentence capitalization.
    pub struct EnigoExecutor {
        enigo: Enigo,
        clipboard: Clipboard,
        method: InputMethod,
        last_char: Option<char>,
        capitalize_next: bool,
    }

    impl EnigoExecutor {
        pub fn new(method: InputMethod) -> Result<Self, ExecutionError> {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| ExecutionError::Other(format!("enigo init: {}", e)))?;
            let clipboard = Clipboard::new()
                .map_err(|e| ExecutionError::Other(format!("clipboard init: {}", e)))?;
            Ok(Self {
                enigo,
                clipboard,
                method,
                last_char: None,
                capitalize_next: true,
            })
        }

        fn type_text(&mut self, text: &str) -> Result<(), ExecutionError> {
            let prepared = prepare_text(self.last_char, self.capitalize_next, text);
            if prepared.is_empty() {
                return Ok(());
            }

            match self.method {
                InputMethod::Direct => self.type_direct(&prepared)?,
                InputMethod::Clipboard => {
                    if let Err(e) = self.type_via_clipboard(&prepared) {
                        warn!(error = %e, "clipboard typing failed, falling back to direct");
                        self.type_direct(&prepared)?;
                    }
                }
            }

            if let Some(c) = prepared.chars().last() {
                self.last_char = Some(c);
                self.capitalize_next = ends_sentence(c);
            }
            Ok(())
        }

        fn type_direct(&mut self, text: &str) -> Result<(), ExecutionError> {
            self.enigo
                .text(text)
                .map_err(|e| ExecutionError::Other(format!("type text: {}", e)))
        }

        fn type_via_clipboard(&mut self, text: &str) -> Result<(), ExecutionError> {
            let old_content = self.clipboard.get_text().ok();

            self.clipboard
                .set_text(text)
                .map_err(|e| ExecutionError::Other(format!("set clipboard: {}", e)))?;
            thread::sleep(Duration::from_millis(50));

            let paste = KeyChord::with(&[primary_paste_modifier()], Key::Char('v'));
            let result = self.press_chord(&paste);
            thread::sleep(Duration::from_millis(100));

            // Restore whatever the user had (best effort).
            if let Some(old) = old_content {
                let _ = self.clipboard.set_text(old);
            }
            result
        }

        fn press_chord(&mut self, chord: &KeyChord) -> Result<(), ExecutionError> {
            for modifier in &chord.modifiers {
                self.enigo
                    .key(to_enigo_modifier(*modifier), Direction::Press)
                    .map_err(|e| ExecutionError::Other(format!("press modifier: {}", e)))?;
            }
            if !chord.modifiers.is_empty() {
                thread::sleep(Duration::from_millis(10));
            }

            let key = to_enigo_key(chord.key)?;
            let result = self
                .enigo
                .key(key, Direction::Click)
                .map_err(|e| ExecutionError::Other(format!("press key: {}", e)));

            for modifier in chord.modifiers.iter().rev() {
                let _ = self.enigo.key(to_enigo_modifier(*modifier), Direction::Release);
            }
            result
        }

        fn track_chord(&mut self, chord: &KeyChord) {
            match chord.key {
                Key::Return => {
                    self.last_char = Some('\n');
                    self.capitalize_next = true;
                }
                Key::Tab => self.last_char = Some('\t'),
                Key::Space => self.last_char = Some(' '),
                // After deletions and navigation we no longer know what the
                // character to our left is.
                _ => self.last_char = None,
            }
        }
    }

    impl ActionExecutor for EnigoExecutor {
        fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutionError> {
            match command {
                ActionCommand::TypeText(text) => self.type_text(text),
                ActionCommand::PressKey(chord) => {
                    self.press_chord(chord)?;
                    self.track_chord(chord);
                    Ok(())
                }
                ActionCommand::Click(button) => self
                    .enigo
                    .button(to_enigo_button(*button), Direction::Click)
                    .map_err(|e| ExecutionError::Other(format!("click: {}", e))),
                ActionCommand::Scroll(dir, lines) => {
                    let amount = match dir {
                        ScrollDirection::Up => -(*lines as i32),
                        ScrollDirection::Down => *lines as i32,
                    };
                    self.enigo
                        .scroll(amount, Axis::Vertical)
                        .map_err(|e| ExecutionError::Other(format!("scroll: {}", e)))
                }
            }
        }
    }

    fn primary_paste_modifier() -> Modifier {
        #[cfg(target_os = "macos")]
        {
            Modifier::Meta
        }
        #[cfg(not(target_os = "macos"))]
        {
            Modifier::Control
        }
    }

    fn to_enigo_button(button: MouseButton) -> Button {
        match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
        }
    }

    fn to_enigo_modifier(modifier: Modifier) -> EnigoKey {
        match modifier {
            Modifier::Shift => EnigoKey::Shift,
            Modifier::Control => EnigoKey::Control,
            Modifier::Alt => EnigoKey::Alt,
            Modifier::Meta => EnigoKey::Meta,
        }
    }

    fn to_enigo_key(key: Key) -> Result<EnigoKey, ExecutionError> {
        let key = match key {
            Key::Return => EnigoKey::Return,
            Key::Tab => EnigoKey::Tab,
            Key::Space => EnigoKey::Space,
            Key::Backspace => EnigoKey::Backspace,
            Key::Delete => EnigoKey::Delete,
            Key::Escape => EnigoKey::Escape,
            Key::Home => EnigoKey::Home,
            Key::End => EnigoKey::End,
            Key::PageUp => EnigoKey::PageUp,
            Key::PageDown => EnigoKey::PageDown,
            Key::UpArrow => EnigoKey::UpArrow,
            Key::DownArrow => EnigoKey::DownArrow,
            Key::LeftArrow => EnigoKey::LeftArrow,
            Key::RightArrow => EnigoKey::RightArrow,
            Key::Function(n) => match n {
                1 => EnigoKey::F1,
                2 => EnigoKey::F2,
                3 => EnigoKey::F3,
                4 => EnigoKey::F4,
                5 => EnigoKey::F5,
                6 => EnigoKey::F6,
                7 => EnigoKey::F7,
                8 => EnigoKey::F8,
                9 => EnigoKey::F9,
                10 => EnigoKey::F10,
                11 => EnigoKey::F11,
                12 => EnigoKey::F12,
                _ => return Err(ExecutionError::Other(format!("no such function key: F{}", n))),
            },
            Key::Char(c) => EnigoKey::Unicode(c),
        };
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_method_from_str() {
        assert_eq!(InputMethod::from_str("direct"), InputMethod::Direct);
        assert_eq!(InputMethod::from_str("Clipboard"), InputMethod::Clipboard);
        assert_eq!(InputMethod::from_str("unknown"), InputMethod::Direct);
    }

    #[test]
    fn test_prepare_text_inserts_space_after_word() {
        assert_eq!(prepare_text(Some('o'), false, "world"), " world");
        assert_eq!(prepare_text(Some(')'), false, "next"), " next");
        // Dictated fragments arrive as separate commands; punctuation from
        // the previous one still needs a space before new words.
        assert_eq!(prepare_text(Some(','), false, "world"), " world");
    }

    #[test]
    fn test_prepare_text_no_space_cases() {
        // Start of input, after whitespace, or before punctuation.
        assert_eq!(prepare_text(None, false, "hello"), "hello");
        assert_eq!(prepare_text(Some('\n'), false, "hello"), "hello");
        assert_eq!(prepare_text(Some('o'), false, ","), ",");
    }

    #[test]
    fn test_prepare_text_capitalizes_sentence_start() {
        assert_eq!(prepare_text(None, true, "hello there"), "Hello there");
        assert_eq!(prepare_text(Some('.'), true, "next one"), " Next one");
    }

    #[test]
    fn test_dry_run_counts() {
        let mut exec = DryRunExecutor::new();
        exec.execute(&ActionCommand::TypeText("hi".into())).unwrap();
        exec.execute(&ActionCommand::TypeText("there".into())).unwrap();
        assert_eq!(exec.executed(), 2);
    }
}
