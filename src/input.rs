//! Key bindings: normal and vim-style.

use crate::command::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Forwarded to the simulation's command queue.
    Game(Command),
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to an action. Arrows plus Z/X, or vim-style hjkl plus u.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    let code = match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    };
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') | KeyCode::Enter => Action::Pause,
        KeyCode::Char('r') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::Game(Command::MoveLeft),
        KeyCode::Right | KeyCode::Char('l') => Action::Game(Command::MoveRight),
        KeyCode::Down | KeyCode::Char('j') => Action::Game(Command::MoveDown),
        KeyCode::Char('z' | 'u') => Action::Game(Command::RotateCcw),
        KeyCode::Up | KeyCode::Char('x' | 'k') => Action::Game(Command::RotateCw),
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Action {
        key_to_action(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn arrows_and_vim_keys_agree() {
        assert_eq!(press(KeyCode::Left), press(KeyCode::Char('h')));
        assert_eq!(press(KeyCode::Right), press(KeyCode::Char('l')));
        assert_eq!(press(KeyCode::Down), Action::Game(Command::MoveDown));
        assert_eq!(press(KeyCode::Up), Action::Game(Command::RotateCw));
        assert_eq!(press(KeyCode::Char('u')), Action::Game(Command::RotateCcw));
    }

    #[test]
    fn shifted_letters_still_map() {
        let key = KeyEvent::new(KeyCode::Char('Z'), KeyModifiers::SHIFT);
        assert_eq!(key_to_action(key), Action::Game(Command::RotateCcw));
    }

    #[test]
    fn frontend_keys() {
        assert_eq!(press(KeyCode::Esc), Action::Quit);
        assert_eq!(press(KeyCode::Enter), Action::Pause);
        assert_eq!(press(KeyCode::Char('r')), Action::Restart);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Left, KeyModifiers::ALT)),
            Action::None
        );
    }
}
