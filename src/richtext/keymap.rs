// Keymap
// Maps key presses from the host to editor actions

use super::format::FormatCommand;
use super::structured_document::Mark;

/// Keys the editor reacts to. Hosts map their platform events to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    /// A character key, case-insensitive ('Z' and 'z' are the same key)
    Char(char),
    Enter,
    Backspace,
    Delete,
}

bitflags::bitflags! {
    /// Keyboard modifier flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS
    pub fn has_command(self) -> bool {
        self.intersects(Modifiers::CTRL | Modifiers::META)
    }
}

/// A key press with the modifiers held down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: Modifiers,
}

impl KeyEvent {
    pub fn new(code: KeyCode, mods: Modifiers) -> Self {
        KeyEvent { code, mods }
    }

    /// Ctrl/Cmd plus a character
    pub fn command(c: char) -> Self {
        Self::new(KeyCode::Char(c), Modifiers::CTRL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    Undo,
    Redo,
    Format(FormatCommand),
    ParagraphBreak,
    LineBreak,
    DeleteBackward,
    DeleteForward,
}

/// Look up the action bound to a key press. Unbound keys return None and
/// are left to the host.
pub fn action_for(event: &KeyEvent) -> Option<EditorAction> {
    let shift = event.mods.contains(Modifiers::SHIFT);

    match event.code {
        KeyCode::Char(c) if event.mods.has_command() => {
            match (c.to_ascii_lowercase(), shift) {
                ('z', false) => Some(EditorAction::Undo),
                ('z', true) | ('y', false) => Some(EditorAction::Redo),
                ('b', false) => Some(EditorAction::Format(FormatCommand::ToggleMark(Mark::Bold))),
                ('i', false) => Some(EditorAction::Format(FormatCommand::ToggleMark(
                    Mark::Italic,
                ))),
                ('u', false) => Some(EditorAction::Format(FormatCommand::ToggleMark(
                    Mark::Underline,
                ))),
                _ => None,
            }
        }
        KeyCode::Enter if shift => Some(EditorAction::LineBreak),
        KeyCode::Enter => Some(EditorAction::ParagraphBreak),
        KeyCode::Backspace => Some(EditorAction::DeleteBackward),
        KeyCode::Delete => Some(EditorAction::DeleteForward),
        KeyCode::Char(_) => None,
    }
}
