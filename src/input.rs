//! Keyboard handling for the preview.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    /// Enable the webcam.
    Activate,
    CycleCharset,
    ToggleStatusBar,
    Quit,
    None,
}

/// Map a key event onto an [`AppAction`].
///
/// - Enter: activate
/// - `c`: cycle charset
/// - `s`: toggle status bar
/// - `q`, Esc, Ctrl+C: quit
pub fn handle_key_event(event: KeyEvent) -> AppAction {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = event;

    if kind == KeyEventKind::Release {
        return AppAction::None;
    }

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('C') => AppAction::Quit,
            _ => AppAction::None,
        };
    }

    match code {
        KeyCode::Enter => AppAction::Activate,
        KeyCode::Char('c') | KeyCode::Char('C') => AppAction::CycleCharset,
        KeyCode::Char('s') | KeyCode::Char('S') => AppAction::ToggleStatusBar,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => AppAction::Quit,
        _ => AppAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_bindings() {
        assert_eq!(handle_key_event(key(KeyCode::Enter)), AppAction::Activate);
        assert_eq!(handle_key_event(key(KeyCode::Char('c'))), AppAction::CycleCharset);
        assert_eq!(handle_key_event(key(KeyCode::Char('S'))), AppAction::ToggleStatusBar);
        assert_eq!(handle_key_event(key(KeyCode::Char('q'))), AppAction::Quit);
        assert_eq!(handle_key_event(key(KeyCode::Esc)), AppAction::Quit);
        assert_eq!(handle_key_event(key(KeyCode::Char('x'))), AppAction::None);
    }

    #[test]
    fn test_ctrl_c_quits_instead_of_cycling() {
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(event), AppAction::Quit);
    }

    #[test]
    fn test_release_ignored() {
        let mut event = key(KeyCode::Enter);
        event.kind = KeyEventKind::Release;
        assert_eq!(handle_key_event(event), AppAction::None);
    }
}
