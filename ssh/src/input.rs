use std::io;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use termion::event::{Event, Key, parse_event};

const ESC: u8 = 0x1b;

/// Decode one chunk of client keystrokes.
///
/// A chunk holding nothing but `ESC` is the escape key itself; inside a longer chunk it
/// starts a control sequence. Sequences the terminal parser rejects are dropped.
pub fn parse_keys(data: &[u8]) -> Vec<KeyEvent> {
    if data == [ESC] {
        return vec![KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)];
    }

    let mut keys = Vec::new();
    let mut bytes = data.iter().map(|byte| Ok::<u8, io::Error>(*byte));
    while let Some(Ok(byte)) = bytes.next() {
        match parse_event(byte, &mut bytes) {
            Ok(Event::Key(key)) => keys.extend(to_key_event(key)),
            Ok(_) => {}
            Err(error) => tracing::trace!(%error, "dropping unparsed input"),
        }
    }
    keys
}

fn to_key_event(key: Key) -> Option<KeyEvent> {
    let (code, modifiers) = match key {
        Key::Char('\n') => (KeyCode::Enter, KeyModifiers::NONE),
        Key::Char('\t') => (KeyCode::Tab, KeyModifiers::NONE),
        Key::Char(ch) => (KeyCode::Char(ch), KeyModifiers::NONE),
        Key::Alt(ch) => (KeyCode::Char(ch), KeyModifiers::ALT),
        Key::Ctrl(ch) => (KeyCode::Char(ch), KeyModifiers::CONTROL),
        Key::Backspace => (KeyCode::Backspace, KeyModifiers::NONE),
        Key::Delete => (KeyCode::Delete, KeyModifiers::NONE),
        Key::Insert => (KeyCode::Insert, KeyModifiers::NONE),
        Key::Left => (KeyCode::Left, KeyModifiers::NONE),
        Key::Right => (KeyCode::Right, KeyModifiers::NONE),
        Key::Up => (KeyCode::Up, KeyModifiers::NONE),
        Key::Down => (KeyCode::Down, KeyModifiers::NONE),
        Key::Home => (KeyCode::Home, KeyModifiers::NONE),
        Key::End => (KeyCode::End, KeyModifiers::NONE),
        Key::PageUp => (KeyCode::PageUp, KeyModifiers::NONE),
        Key::PageDown => (KeyCode::PageDown, KeyModifiers::NONE),
        Key::BackTab => (KeyCode::BackTab, KeyModifiers::SHIFT),
        Key::F(n) => (KeyCode::F(n), KeyModifiers::NONE),
        Key::Esc => (KeyCode::Esc, KeyModifiers::NONE),
        _ => return None,
    };
    Some(KeyEvent::new(code, modifiers))
}
