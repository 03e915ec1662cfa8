//! Keyboard bindings of the demo host.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

/// What a key does in the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Leave the demo.
    Quit,
    /// Scroll one step up.
    ScrollUp,
    /// Scroll one step down.
    ScrollDown,
    /// Scroll one step left.
    ScrollLeft,
    /// Scroll one step right.
    ScrollRight,
    /// Scroll one view height up.
    PageUp,
    /// Scroll one view height down.
    PageDown,
    /// Jump to the first item.
    ScrollToTop,
    /// Jump to the last item.
    ScrollToBottom,
    /// Insert an item before the first visible one.
    InsertItem,
    /// Remove the first visible item.
    RemoveItem,
    /// Show or hide the scroll thumbs.
    ToggleThumbs,
}

/// Maps keyboard events to demo actions.
///
/// Vim-style defaults plus arrows and paging keys.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<KeyEvent, KeyAction>,
}

impl KeyBindings {
    /// Look up the action for a key event.
    pub fn get(&self, key: KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&key).copied()
    }

    /// Binds `key` to `action`, replacing any previous binding.
    pub fn bind(&mut self, key: KeyEvent, action: KeyAction) {
        self.bindings.insert(key, action);
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let plain = |code| KeyEvent::new(code, KeyModifiers::NONE);
        let bindings = [
            (plain(KeyCode::Char('q')), KeyAction::Quit),
            (
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                KeyAction::Quit,
            ),
            (plain(KeyCode::Char('k')), KeyAction::ScrollUp),
            (plain(KeyCode::Up), KeyAction::ScrollUp),
            (plain(KeyCode::Char('j')), KeyAction::ScrollDown),
            (plain(KeyCode::Down), KeyAction::ScrollDown),
            (plain(KeyCode::Char('h')), KeyAction::ScrollLeft),
            (plain(KeyCode::Left), KeyAction::ScrollLeft),
            (plain(KeyCode::Char('l')), KeyAction::ScrollRight),
            (plain(KeyCode::Right), KeyAction::ScrollRight),
            (plain(KeyCode::PageUp), KeyAction::PageUp),
            (
                KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL),
                KeyAction::PageUp,
            ),
            (plain(KeyCode::PageDown), KeyAction::PageDown),
            (
                KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL),
                KeyAction::PageDown,
            ),
            (plain(KeyCode::Char('g')), KeyAction::ScrollToTop),
            (plain(KeyCode::Home), KeyAction::ScrollToTop),
            (
                KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT),
                KeyAction::ScrollToBottom,
            ),
            (plain(KeyCode::End), KeyAction::ScrollToBottom),
            (plain(KeyCode::Char('a')), KeyAction::InsertItem),
            (plain(KeyCode::Char('x')), KeyAction::RemoveItem),
            (plain(KeyCode::Char('t')), KeyAction::ToggleThumbs),
        ];

        Self {
            bindings: bindings.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_cover_quit_and_scrolling() {
        let keys = KeyBindings::default();
        assert_eq!(
            keys.get(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            keys.get(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyAction::Quit)
        );
        assert_eq!(
            keys.get(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE)),
            Some(KeyAction::ScrollDown)
        );
        assert_eq!(
            keys.get(KeyEvent::new(KeyCode::Char('G'), KeyModifiers::SHIFT)),
            Some(KeyAction::ScrollToBottom)
        );
    }

    #[test]
    fn unbound_key_has_no_action() {
        let keys = KeyBindings::default();
        assert_eq!(
            keys.get(KeyEvent::new(KeyCode::Char('z'), KeyModifiers::NONE)),
            None
        );
        assert_eq!(
            keys.get(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)),
            None
        );
    }

    #[test]
    fn bind_replaces_existing_action() {
        let mut keys = KeyBindings::default();
        let key = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
        keys.bind(key, KeyAction::PageDown);
        assert_eq!(keys.get(key), Some(KeyAction::PageDown));
    }
}
