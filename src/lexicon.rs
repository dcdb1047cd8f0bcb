//! The command lexicon: spoken phrase -> command token
//!
//! Entries are registered in declaration order and the first registration of
//! a phrase wins; later duplicates (including user extras from config) never
//! displace an earlier entry. The mapper relies on that for its deterministic
//! tie-break, so registration order here is part of the contract.

use std::collections::HashMap;

/// Editing actions the lexicon can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Newline,
    Tab,
    Space,
    Backspace,
    DeleteWord,
    DeleteLine,
    Undo,
    Redo,
    SelectAll,
    SelectLine,
    LineStart,
    LineEnd,
}

/// System-level actions the lexicon can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemKind {
    ScrollUp,
    ScrollDown,
    ClickLeft,
    ClickRight,
    DoubleClick,
    SwitchWindow,
    /// Suspend listening (resume is hotkey-only; paused frames never reach
    /// the engine, so a spoken resume could not be heard).
    PauseListening,
    /// Stop the whole pipeline.
    Shutdown,
}

/// Classification of a matched phrase span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandToken {
    /// Replacement text that joins the surrounding literal stream.
    Literal(String),
    /// A punctuation character, typed as its own command.
    Punctuation(char),
    Edit(EditKind),
    System(SystemKind),
}

/// Phrase table with declaration-order bookkeeping.
pub struct Lexicon {
    entries: HashMap<String, (usize, CommandToken)>,
    order: Vec<String>,
    max_words: usize,
}

impl Lexicon {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            max_words: 0,
        }
    }

    /// The built-in command table.
    pub fn builtin() -> Self {
        let mut lex = Self::new();

        // Punctuation
        for (phrase, c) in [
            ("period", '.'),
            ("full stop", '.'),
            ("dot", '.'),
            ("comma", ','),
            ("question mark", '?'),
            ("exclamation point", '!'),
            ("exclamation mark", '!'),
            ("colon", ':'),
            ("semicolon", ';'),
            ("dash", '-'),
            ("hyphen", '-'),
            ("underscore", '_'),
            ("open parenthesis", '('),
            ("close parenthesis", ')'),
            ("open paren", '('),
            ("close paren", ')'),
            ("open bracket", '['),
            ("close bracket", ']'),
            ("open brace", '{'),
            ("close brace", '}'),
            ("open quote", '"'),
            ("close quote", '"'),
            ("double quote", '"'),
            ("single quote", '\''),
            ("apostrophe", '\''),
            ("at sign", '@'),
            ("hashtag", '#'),
            ("hash", '#'),
            ("dollar sign", '$'),
            ("percent sign", '%'),
            ("ampersand", '&'),
            ("asterisk", '*'),
            ("star", '*'),
            ("plus sign", '+'),
            ("equals sign", '='),
            ("forward slash", '/'),
            ("slash", '/'),
            ("backslash", '\\'),
            ("back slash", '\\'),
            ("pipe", '|'),
            ("tilde", '~'),
            ("caret", '^'),
        ] {
            lex.register(phrase, CommandToken::Punctuation(c));
        }

        // Editing
        for phrase in ["new line", "newline", "new paragraph"] {
            lex.register(phrase, CommandToken::Edit(EditKind::Newline));
        }
        lex.register("tab key", CommandToken::Edit(EditKind::Tab));
        lex.register("space bar", CommandToken::Edit(EditKind::Space));
        for phrase in ["backspace", "back space", "delete that"] {
            lex.register(phrase, CommandToken::Edit(EditKind::Backspace));
        }
        lex.register("delete word", CommandToken::Edit(EditKind::DeleteWord));
        for phrase in ["delete line", "clear line"] {
            lex.register(phrase, CommandToken::Edit(EditKind::DeleteLine));
        }
        lex.register("undo that", CommandToken::Edit(EditKind::Undo));
        lex.register("redo that", CommandToken::Edit(EditKind::Redo));
        lex.register("select all", CommandToken::Edit(EditKind::SelectAll));
        lex.register("select line", CommandToken::Edit(EditKind::SelectLine));
        for phrase in ["start of line", "beginning of line"] {
            lex.register(phrase, CommandToken::Edit(EditKind::LineStart));
        }
        lex.register("end of line", CommandToken::Edit(EditKind::LineEnd));

        // Window and pointer control
        lex.register("scroll up", CommandToken::System(SystemKind::ScrollUp));
        lex.register("scroll down", CommandToken::System(SystemKind::ScrollDown));
        for phrase in ["click", "left click"] {
            lex.register(phrase, CommandToken::System(SystemKind::ClickLeft));
        }
        lex.register("right click", CommandToken::System(SystemKind::ClickRight));
        lex.register("double click", CommandToken::System(SystemKind::DoubleClick));
        for phrase in ["switch window", "next window"] {
            lex.register(phrase, CommandToken::System(SystemKind::SwitchWindow));
        }

        // Listening control. Multi-word on purpose: bare "stop" must stay
        // typable text.
        for phrase in ["stop listening", "pause listening", "stop dictation"] {
            lex.register(phrase, CommandToken::System(SystemKind::PauseListening));
        }
        for phrase in ["quit dictation", "end dictation"] {
            lex.register(phrase, CommandToken::System(SystemKind::Shutdown));
        }

        lex
    }

    /// Register a phrase. The first registration wins; a duplicate is
    /// dropped so earlier entries keep their meaning.
    pub fn register(&mut self, phrase: &str, token: CommandToken) -> bool {
        let phrase = phrase.trim().to_lowercase();
        if phrase.is_empty() || self.entries.contains_key(&phrase) {
            return false;
        }
        let words = phrase.split_whitespace().count();
        self.max_words = self.max_words.max(words);
        let idx = self.order.len();
        self.order.push(phrase.clone());
        self.entries.insert(phrase, (idx, token));
        true
    }

    pub fn lookup(&self, phrase: &str) -> Option<&CommandToken> {
        self.entries.get(phrase).map(|(_, token)| token)
    }

    /// Longest registered phrase, in words. The mapper uses this to bound
    /// its match window.
    pub fn max_phrase_words(&self) -> usize {
        self.max_words
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in declaration order, for `voxkey lexicon`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandToken)> {
        self.order
            .iter()
            .map(move |phrase| (phrase.as_str(), &self.entries[phrase].1))
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}
