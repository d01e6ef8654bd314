use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// The key code when no control or alt modifier is held. Shift is part of the character.
pub fn plain(key: &KeyEvent) -> Option<KeyCode> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        None
    } else {
        Some(key.code)
    }
}

pub fn is_ctrl(key: &KeyEvent, ch: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(ch)
}

pub fn is_next(key: &KeyEvent) -> bool {
    matches!(
        plain(key),
        Some(KeyCode::Tab | KeyCode::Down | KeyCode::Char('j'))
    )
}

pub fn is_previous(key: &KeyEvent) -> bool {
    matches!(
        plain(key),
        Some(KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k'))
    )
}

pub fn is_increment(key: &KeyEvent) -> bool {
    matches!(
        plain(key),
        Some(KeyCode::Char('+' | '=' | 'l') | KeyCode::Right)
    )
}

pub fn is_decrement(key: &KeyEvent) -> bool {
    matches!(plain(key), Some(KeyCode::Char('-' | 'h') | KeyCode::Left))
}

pub fn is_enter(key: &KeyEvent) -> bool {
    plain(key) == Some(KeyCode::Enter)
}

pub fn is_esc(key: &KeyEvent) -> bool {
    plain(key) == Some(KeyCode::Esc)
}

pub fn is_char(key: &KeyEvent, ch: char) -> bool {
    plain(key) == Some(KeyCode::Char(ch))
}

pub fn is_delete(key: &KeyEvent) -> bool {
    matches!(
        plain(key),
        Some(KeyCode::Delete | KeyCode::Backspace | KeyCode::Char('d' | 'x'))
    )
}

#[cfg(test)]
pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[cfg(test)]
pub fn ch(ch: char) -> KeyEvent {
    key(KeyCode::Char(ch))
}
