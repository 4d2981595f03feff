//! Undo/redo triggers.
//!
//! Buttons produce a `HistoryAction` directly; keyboard input is described
//! by a `KeyChord` and mapped to the same actions, so both surfaces end up in
//! `TodoDocument::apply_history`.

/// What the user asked the history to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryAction {
    Undo,
    Redo,
}

/// A key press with its modifiers.
///
/// `ctrl` and `meta` are interchangeable so the same chords work on every
/// platform (Ctrl on Linux/Windows, Cmd on macOS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    key: String,
    ctrl: bool,
    meta: bool,
    shift: bool,
}

impl KeyChord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            meta: false,
            shift: false,
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Parse `"ctrl+shift+z"`, `"cmd+y"`, ... Modifier names are case-insensitive.
    ///
    /// Returns `None` when there is no key or an unknown modifier.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts: Vec<&str> = text.split('+').map(str::trim).collect();
        let key = parts.pop().filter(|key| !key.is_empty())?;
        let mut chord = KeyChord::new(key);
        for modifier in parts {
            chord = match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl(),
                "cmd" | "meta" | "super" => chord.meta(),
                "shift" => chord.shift(),
                _ => return None,
            };
        }
        Some(chord)
    }

    /// Platform-conventional undo/redo chords.
    ///
    /// - Ctrl/Cmd + Z -> Undo
    /// - Ctrl/Cmd + Shift + Z -> Redo
    /// - Ctrl/Cmd + Y -> Redo
    pub fn history_action(&self) -> Option<HistoryAction> {
        if !(self.ctrl || self.meta) {
            return None;
        }
        match self.key.to_lowercase().as_str() {
            "z" if self.shift => Some(HistoryAction::Redo),
            "z" => Some(HistoryAction::Undo),
            "y" => Some(HistoryAction::Redo),
            _ => None,
        }
    }
}
