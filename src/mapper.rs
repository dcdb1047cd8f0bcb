//! Transcript -> command mapping
//!
//! Pure and order-preserving: identical transcript text always yields an
//! identical outcome, independent of prior calls. The scan is greedy
//! longest-match against the lexicon, left to right; equal-length ties fall
//! to the first-registered phrase (the lexicon never stores duplicates, so
//! the tie-break is enforced at registration). Unmatched words accumulate in
//! a literal buffer that flushes as one `TypeText` whenever a non-literal
//! token lands, or at end of input; trailing fragments are typed as-is,
//! never completed.

use crate::actions::{ActionCommand, Key, KeyChord, Modifier, MouseButton, ScrollDirection};
use crate::keymap::{lookup_key, lookup_modifier};
use crate::lexicon::{CommandToken, EditKind, Lexicon, SystemKind};

const SCROLL_LINES: u32 = 3;

#[cfg(target_os = "macos")]
pub(crate) fn primary_modifier() -> Modifier {
    Modifier::Meta
}

#[cfg(not(target_os = "macos"))]
pub(crate) fn primary_modifier() -> Modifier {
    Modifier::Control
}

/// Loop-level requests a transcript can carry. These are not executor
/// actions; the recognition loop applies them against the controller and
/// stop signal after dispatching the transcript's actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    PauseListening,
    Shutdown,
}

/// Result of mapping one final transcript.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapOutcome {
    /// Ordered executor commands. Order equals spoken order, always.
    pub actions: Vec<ActionCommand>,
    /// At most one control request. A control phrase ends the scan, so
    /// anything spoken after it in the same utterance is dropped.
    pub control: Option<ControlRequest>,
}

pub struct CommandMapper {
    lexicon: Lexicon,
}

impl CommandMapper {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Map a final transcript to its ordered command sequence.
    pub fn map(&self, text: &str) -> MapOutcome {
        let words: Vec<String> = text
            .split_whitespace()
            .map(normalize_word)
            .filter(|w| !w.is_empty())
            .collect();

        let mut out = MapOutcome::default();
        let mut literals: Vec<String> = Vec::new();
        let max_window = self.lexicon.max_phrase_words().max(1);

        let mut i = 0;
        while i < words.len() {
            if let Some((token, consumed)) = self.match_at(&words, i, max_window) {
                i += consumed;
                match token {
                    CommandToken::Literal(repl) => literals.push(repl.clone()),
                    CommandToken::Punctuation(c) => {
                        flush_literals(&mut literals, &mut out.actions);
                        out.actions.push(ActionCommand::TypeText(c.to_string()));
                    }
                    CommandToken::Edit(kind) => {
                        flush_literals(&mut literals, &mut out.actions);
                        out.actions.extend(edit_commands(*kind));
                    }
                    CommandToken::System(SystemKind::PauseListening) => {
                        flush_literals(&mut literals, &mut out.actions);
                        out.control = Some(ControlRequest::PauseListening);
                        break;
                    }
                    CommandToken::System(SystemKind::Shutdown) => {
                        flush_literals(&mut literals, &mut out.actions);
                        out.control = Some(ControlRequest::Shutdown);
                        break;
                    }
                    CommandToken::System(kind) => {
                        flush_literals(&mut literals, &mut out.actions);
                        out.actions.extend(system_commands(*kind));
                    }
                }
                continue;
            }

            // "press <modifiers> <key>" chord grammar; falls back to
            // literals when the key does not resolve.
            if words[i] == "press" {
                if let Some((chord, consumed)) = parse_chord(&words, i + 1) {
                    flush_literals(&mut literals, &mut out.actions);
                    out.actions.push(ActionCommand::PressKey(chord));
                    i += 1 + consumed;
                    continue;
                }
            }

            literals.push(words[i].clone());
            i += 1;
        }

        flush_literals(&mut literals, &mut out.actions);
        out
    }

    /// Longest lexicon match starting at `i`, with the words consumed.
    fn match_at(
        &self,
        words: &[String],
        i: usize,
        max_window: usize,
    ) -> Option<(&CommandToken, usize)> {
        let window = max_window.min(words.len() - i);
        for len in (1..=window).rev() {
            let phrase = words[i..i + len].join(" ");
            if let Some(token) = self.lexicon.lookup(&phrase) {
                return Some((token, len));
            }
        }
        None
    }
}

/// Lowercase and strip punctuation the engine glued onto word edges.
/// Inner characters (apostrophes, hyphens) survive.
fn normalize_word(word: &str) -> String {
    word.to_lowercase()
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .to_string()
}

fn flush_literals(literals: &mut Vec<String>, actions: &mut Vec<ActionCommand>) {
    if literals.is_empty() {
        return;
    }
    actions.push(ActionCommand::TypeText(literals.join(" ")));
    literals.clear();
}

/// Modifiers then a key name (two-word names like "page up" tried first).
/// Returns the chord and the number of words consumed after "press".
fn parse_chord(words: &[String], start: usize) -> Option<(KeyChord, usize)> {
    let mut idx = start;
    let mut modifiers = Vec::new();
    while idx < words.len() {
        match lookup_modifier(&words[idx]) {
            Some(m) if !modifiers.contains(&m) => {
                modifiers.push(m);
                idx += 1;
            }
            _ => break,
        }
    }

    if idx + 1 < words.len() {
        let two = format!("{} {}", words[idx], words[idx + 1]);
        if let Some(key) = lookup_key(&two) {
            return Some((KeyChord { modifiers, key }, idx + 2 - start));
        }
    }
    if idx < words.len() {
        if let Some(key) = lookup_key(&words[idx]) {
            return Some((KeyChord { modifiers, key }, idx + 1 - start));
        }
    }
    None
}

fn edit_commands(kind: EditKind) -> Vec<ActionCommand> {
    let primary = primary_modifier();
    match kind {
        EditKind::Newline => vec![ActionCommand::PressKey(KeyChord::plain(Key::Return))],
        EditKind::Tab => vec![ActionCommand::PressKey(KeyChord::plain(Key::Tab))],
        EditKind::Space => vec![ActionCommand::PressKey(KeyChord::plain(Key::Space))],
        EditKind::Backspace => vec![ActionCommand::PressKey(KeyChord::plain(Key::Backspace))],
        EditKind::DeleteWord => {
            #[cfg(target_os = "macos")]
            let chord = KeyChord::with(&[Modifier::Alt], Key::Backspace);
            #[cfg(not(target_os = "macos"))]
            let chord = KeyChord::with(&[Modifier::Control], Key::Backspace);
            vec![ActionCommand::PressKey(chord)]
        }
        EditKind::DeleteLine => {
            #[cfg(target_os = "macos")]
            {
                vec![
                    ActionCommand::PressKey(KeyChord::with(
                        &[Modifier::Meta, Modifier::Shift],
                        Key::LeftArrow,
                    )),
                    ActionCommand::PressKey(KeyChord::plain(Key::Backspace)),
                ]
            }
            #[cfg(not(target_os = "macos"))]
            {
                vec![
                    ActionCommand::PressKey(KeyChord::plain(Key::Home)),
                    ActionCommand::PressKey(KeyChord::with(&[Modifier::Shift], Key::End)),
                    ActionCommand::PressKey(KeyChord::plain(Key::Backspace)),
                ]
            }
        }
        EditKind::Undo => vec![ActionCommand::PressKey(KeyChord::with(
            &[primary],
            Key::Char('z'),
        ))],
        EditKind::Redo => {
            #[cfg(target_os = "macos")]
            let chord = KeyChord::with(&[Modifier::Meta, Modifier::Shift], Key::Char('z'));
            #[cfg(not(target_os = "macos"))]
            let chord = KeyChord::with(&[Modifier::Control], Key::Char('y'));
            vec![ActionCommand::PressKey(chord)]
        }
        EditKind::SelectAll => vec![ActionCommand::PressKey(KeyChord::with(
            &[primary],
            Key::Char('a'),
        ))],
        EditKind::SelectLine => {
            #[cfg(target_os = "macos")]
            {
                vec![
                    ActionCommand::PressKey(KeyChord::with(&[Modifier::Meta], Key::LeftArrow)),
                    ActionCommand::PressKey(KeyChord::with(
                        &[Modifier::Meta, Modifier::Shift],
                        Key::RightArrow,
                    )),
                ]
            }
            #[cfg(not(target_os = "macos"))]
            {
                vec![
                    ActionCommand::PressKey(KeyChord::plain(Key::Home)),
                    ActionCommand::PressKey(KeyChord::with(&[Modifier::Shift], Key::End)),
                ]
            }
        }
        EditKind::LineStart => {
            #[cfg(target_os = "macos")]
            let chord = KeyChord::with(&[Modifier::Meta], Key::LeftArrow);
            #[cfg(not(target_os = "macos"))]
            let chord = KeyChord::plain(Key::Home);
            vec![ActionCommand::PressKey(chord)]
        }
        EditKind::LineEnd => {
            #[cfg(target_os = "macos")]
            let chord = KeyChord::with(&[Modifier::Meta], Key::RightArrow);
            #[cfg(not(target_os = "macos"))]
            let chord = KeyChord::plain(Key::End);
            vec![ActionCommand::PressKey(chord)]
        }
    }
}

fn system_commands(kind: SystemKind) -> Vec<ActionCommand> {
    match kind {
        SystemKind::ScrollUp => vec![ActionCommand::Scroll(ScrollDirection::Up, SCROLL_LINES)],
        SystemKind::ScrollDown => vec![ActionCommand::Scroll(ScrollDirection::Down, SCROLL_LINES)],
        SystemKind::ClickLeft => vec![ActionCommand::Click(MouseButton::Left)],
        SystemKind::ClickRight => vec![ActionCommand::Click(MouseButton::Right)],
        SystemKind::DoubleClick => vec![
            ActionCommand::Click(MouseButton::Left),
            ActionCommand::Click(MouseButton::Left),
        ],
        SystemKind::SwitchWindow => {
            #[cfg(target_os = "macos")]
            let chord = KeyChord::with(&[Modifier::Meta], Key::Tab);
            #[cfg(not(target_os = "macos"))]
            let chord = KeyChord::with(&[Modifier::Alt], Key::Tab);
            vec![ActionCommand::PressKey(chord)]
        }
        // Handled in map(); never reaches the command table.
        SystemKind::PauseListening | SystemKind::Shutdown => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;

    fn mapper() -> CommandMapper {
        CommandMapper::new(Lexicon::builtin())
    }

    #[test]
    fn test_dictation_sequence_order() {
        let out = mapper().map("hello comma new line world period");
        assert_eq!(
            out.actions,
            vec![
                ActionCommand::TypeText("hello".into()),
                ActionCommand::TypeText(",".into()),
                ActionCommand::PressKey(KeyChord::plain(Key::Return)),
                ActionCommand::TypeText("world".into()),
                ActionCommand::TypeText(".".into()),
            ]
        );
        assert_eq!(out.control, None);
    }

    #[test]
    fn test_empty_transcript_is_noop() {
        let out = mapper().map("");
        assert!(out.actions.is_empty());
        assert_eq!(out.control, None);

        let out = mapper().map("   ");
        assert!(out.actions.is_empty());
    }

    #[test]
    fn test_plain_text_single_command() {
        let out = mapper().map("the quick brown fox");
        assert_eq!(
            out.actions,
            vec![ActionCommand::TypeText("the quick brown fox".into())]
        );
    }

    #[test]
    fn test_trailing_fragment_flushed_as_is() {
        let out = mapper().map("hello wor");
        assert_eq!(out.actions, vec![ActionCommand::TypeText("hello wor".into())]);
    }

    #[test]
    fn test_longest_match_not_split() {
        // "new line" must match as one phrase, not "new" + "line" literals.
        let out = mapper().map("new line");
        assert_eq!(
            out.actions,
            vec![ActionCommand::PressKey(KeyChord::plain(Key::Return))]
        );

        // "question mark" over a would-be shorter interpretation.
        let out = mapper().map("is this a question mark");
        assert_eq!(
            out.actions,
            vec![
                ActionCommand::TypeText("is this a".into()),
                ActionCommand::TypeText("?".into()),
            ]
        );
    }

    #[test]
    fn test_engine_punctuation_stripped() {
        let out = mapper().map("Hello, world.");
        assert_eq!(out.actions, vec![ActionCommand::TypeText("hello world".into())]);
    }

    #[test]
    fn test_press_chord_grammar() {
        let out = mapper().map("press control alt delete");
        assert_eq!(
            out.actions,
            vec![ActionCommand::PressKey(KeyChord::with(
                &[Modifier::Control, Modifier::Alt],
                Key::Delete,
            ))]
        );

        let out = mapper().map("press f5");
        assert_eq!(
            out.actions,
            vec![ActionCommand::PressKey(KeyChord::plain(Key::Function(5)))]
        );

        let out = mapper().map("press page down");
        assert_eq!(
            out.actions,
            vec![ActionCommand::PressKey(KeyChord::plain(Key::PageDown))]
        );
    }

    #[test]
    fn test_press_fallback_to_literal() {
        let out = mapper().map("press pineapple");
        assert_eq!(
            out.actions,
            vec![ActionCommand::TypeText("press pineapple".into())]
        );

        // Inside a sentence, "press" with no resolvable key stays text.
        let out = mapper().map("press the button");
        assert_eq!(
            out.actions,
            vec![ActionCommand::TypeText("press the button".into())]
        );
    }

    #[test]
    fn test_pause_phrase_ends_scan() {
        let out = mapper().map("hello stop listening world");
        assert_eq!(out.actions, vec![ActionCommand::TypeText("hello".into())]);
        assert_eq!(out.control, Some(ControlRequest::PauseListening));
    }

    #[test]
    fn test_pause_phrase_alone() {
        let out = mapper().map("stop listening");
        assert!(out.actions.is_empty());
        assert_eq!(out.control, Some(ControlRequest::PauseListening));

        // Bare "stop" is just text.
        let out = mapper().map("stop");
        assert_eq!(out.actions, vec![ActionCommand::TypeText("stop".into())]);
        assert_eq!(out.control, None);
    }

    #[test]
    fn test_shutdown_phrase() {
        let out = mapper().map("quit dictation");
        assert!(out.actions.is_empty());
        assert_eq!(out.control, Some(ControlRequest::Shutdown));
    }

    #[test]
    fn test_custom_literal_joins_buffer() {
        let mut lex = Lexicon::builtin();
        lex.register("smiley face", CommandToken::Literal(":)".into()));
        let out = CommandMapper::new(lex).map("hello smiley face");
        assert_eq!(out.actions, vec![ActionCommand::TypeText("hello :)".into())]);
    }

    #[test]
    fn test_double_click_expands_in_order() {
        let out = mapper().map("double click");
        assert_eq!(
            out.actions,
            vec![
                ActionCommand::Click(MouseButton::Left),
                ActionCommand::Click(MouseButton::Left),
            ]
        );
    }

    #[test]
    fn test_scroll_commands() {
        let out = mapper().map("scroll down");
        assert_eq!(
            out.actions,
            vec![ActionCommand::Scroll(ScrollDirection::Down, SCROLL_LINES)]
        );
    }

    #[test]
    fn test_map_is_pure() {
        let m = mapper();
        let text = "hello comma press control a new line stop listening";
        assert_eq!(m.map(text), m.map(text));
    }
}
