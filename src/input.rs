//! Key bindings: arrows and vim-style cursor, grab, edit palette.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dropcombo::TokenKind;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    /// Pick up the token under the cursor, or drop the held one (paints in edit mode).
    Grab,
    ToggleEdit,
    ToggleSkyfall,
    Select(TokenKind),
    /// New board and a fresh battle.
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Supports both arrows and vim keys (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Left | KeyCode::Char('h') => Action::CursorLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::CursorRight,
        KeyCode::Up | KeyCode::Char('k') => Action::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => Action::CursorDown,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Grab,
        KeyCode::Char('e') => Action::ToggleEdit,
        KeyCode::Char('s') => Action::ToggleSkyfall,
        KeyCode::Char('r') => Action::Restart,
        KeyCode::Char(c @ '1'..='6') => c
            .to_digit(10)
            .and_then(|d| TokenKind::from_index(d as usize - 1))
            .map_or(Action::None, Action::Select),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_cursor_keys_arrows_and_vim() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::CursorLeft);
        assert_eq!(key_to_action(key(KeyCode::Char('h'))), Action::CursorLeft);
        assert_eq!(key_to_action(key(KeyCode::Char('j'))), Action::CursorDown);
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::CursorUp);
    }

    #[test]
    fn test_digit_selects_palette_token() {
        assert_eq!(
            key_to_action(key(KeyCode::Char('1'))),
            Action::Select(TokenKind::Fire)
        );
        assert_eq!(
            key_to_action(key(KeyCode::Char('6'))),
            Action::Select(TokenKind::Heart)
        );
        assert_eq!(key_to_action(key(KeyCode::Char('7'))), Action::None);
    }

    #[test]
    fn test_modifiers() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl_c), Action::Quit);
        let alt_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::ALT);
        assert_eq!(key_to_action(alt_s), Action::None);
    }
}
