//! Terminal key events to physical key identifiers.
//!
//! Terminals report the produced character rather than the key position, so
//! characters are mapped back to their US-ANSI key (shifted symbols share the
//! identifier of their base key). Modifier and keypad identity is only
//! available when the terminal supports keyboard enhancement.

use crossterm::event::{KeyCode, KeyEvent, KeyEventState, ModifierKeyCode};

/// A key as seen by the checker: stable physical identifier plus the value
/// the key produced, for logging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhysicalKey {
    pub code: &'static str,
    pub key: String,
}

impl PhysicalKey {
    pub fn new(code: &'static str, key: impl Into<String>) -> Self {
        Self {
            code,
            key: key.into(),
        }
    }
}

const F_KEYS: [&str; 24] = [
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "F13", "F14",
    "F15", "F16", "F17", "F18", "F19", "F20", "F21", "F22", "F23", "F24",
];

/// Identifier of the main-block key that produces `ch` on a US-ANSI board.
pub fn char_code(ch: char) -> Option<&'static str> {
    let code = match ch.to_ascii_lowercase() {
        'a' => "KeyA",
        'b' => "KeyB",
        'c' => "KeyC",
        'd' => "KeyD",
        'e' => "KeyE",
        'f' => "KeyF",
        'g' => "KeyG",
        'h' => "KeyH",
        'i' => "KeyI",
        'j' => "KeyJ",
        'k' => "KeyK",
        'l' => "KeyL",
        'm' => "KeyM",
        'n' => "KeyN",
        'o' => "KeyO",
        'p' => "KeyP",
        'q' => "KeyQ",
        'r' => "KeyR",
        's' => "KeyS",
        't' => "KeyT",
        'u' => "KeyU",
        'v' => "KeyV",
        'w' => "KeyW",
        'x' => "KeyX",
        'y' => "KeyY",
        'z' => "KeyZ",
        '1' | '!' => "Digit1",
        '2' | '@' => "Digit2",
        '3' | '#' => "Digit3",
        '4' | '$' => "Digit4",
        '5' | '%' => "Digit5",
        '6' | '^' => "Digit6",
        '7' | '&' => "Digit7",
        '8' | '*' => "Digit8",
        '9' | '(' => "Digit9",
        '0' | ')' => "Digit0",
        '`' | '~' => "Backquote",
        '-' | '_' => "Minus",
        '=' | '+' => "Equal",
        '[' | '{' => "BracketLeft",
        ']' | '}' => "BracketRight",
        '\\' | '|' => "Backslash",
        ';' | ':' => "Semicolon",
        '\'' | '"' => "Quote",
        ',' | '<' => "Comma",
        '.' | '>' => "Period",
        '/' | '?' => "Slash",
        ' ' => "Space",
        _ => return None,
    };
    Some(code)
}

/// Character the US-ANSI key for `ch` produces with Shift held. Characters
/// that are already shifted, or have no shifted form, come back unchanged.
pub fn shifted_char(ch: char) -> char {
    match ch {
        'a'..='z' => ch.to_ascii_uppercase(),
        '1' => '!',
        '2' => '@',
        '3' => '#',
        '4' => '$',
        '5' => '%',
        '6' => '^',
        '7' => '&',
        '8' => '*',
        '9' => '(',
        '0' => ')',
        '`' => '~',
        '-' => '_',
        '=' => '+',
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        ';' => ':',
        '\'' => '"',
        ',' => '<',
        '.' => '>',
        '/' => '?',
        _ => ch,
    }
}

fn keypad_code(ch: char) -> Option<&'static str> {
    let code = match ch {
        '0' => "Numpad0",
        '1' => "Numpad1",
        '2' => "Numpad2",
        '3' => "Numpad3",
        '4' => "Numpad4",
        '5' => "Numpad5",
        '6' => "Numpad6",
        '7' => "Numpad7",
        '8' => "Numpad8",
        '9' => "Numpad9",
        '/' => "NumpadDivide",
        '*' => "NumpadMultiply",
        '-' => "NumpadSubtract",
        '+' => "NumpadAdd",
        '.' | ',' => "NumpadDecimal",
        _ => return None,
    };
    Some(code)
}

fn modifier_code(modifier: ModifierKeyCode) -> (&'static str, &'static str) {
    use ModifierKeyCode::*;
    match modifier {
        LeftShift => ("ShiftLeft", "Shift"),
        RightShift => ("ShiftRight", "Shift"),
        LeftControl => ("ControlLeft", "Control"),
        RightControl => ("ControlRight", "Control"),
        LeftAlt => ("AltLeft", "Alt"),
        RightAlt | IsoLevel3Shift | IsoLevel5Shift => ("AltRight", "Alt"),
        LeftSuper | LeftHyper | LeftMeta => ("MetaLeft", "Meta"),
        RightSuper | RightHyper | RightMeta => ("MetaRight", "Meta"),
    }
}

/// Map a terminal key event to a physical key. `None` when the event has no
/// physical identity we can name.
pub fn from_key_event(event: &KeyEvent) -> Option<PhysicalKey> {
    let keypad = event.state.contains(KeyEventState::KEYPAD);
    let (code, key): (&'static str, String) = match event.code {
        KeyCode::Char(ch) => {
            let code = if keypad {
                keypad_code(ch).or_else(|| char_code(ch))
            } else {
                char_code(ch)
            };
            (code?, ch.to_string())
        }
        KeyCode::Enter if keypad => ("NumpadEnter", "Enter".into()),
        KeyCode::Enter => ("Enter", "Enter".into()),
        KeyCode::Tab | KeyCode::BackTab => ("Tab", "Tab".into()),
        KeyCode::Backspace => ("Backspace", "Backspace".into()),
        KeyCode::Esc => ("Escape", "Escape".into()),
        KeyCode::Delete => ("Delete", "Delete".into()),
        KeyCode::Insert => ("Insert", "Insert".into()),
        KeyCode::Home => ("Home", "Home".into()),
        KeyCode::End => ("End", "End".into()),
        KeyCode::PageUp => ("PageUp", "PageUp".into()),
        KeyCode::PageDown => ("PageDown", "PageDown".into()),
        KeyCode::Up => ("ArrowUp", "ArrowUp".into()),
        KeyCode::Down => ("ArrowDown", "ArrowDown".into()),
        KeyCode::Left => ("ArrowLeft", "ArrowLeft".into()),
        KeyCode::Right => ("ArrowRight", "ArrowRight".into()),
        KeyCode::F(n) => {
            let code = *F_KEYS.get(usize::from(n).checked_sub(1)?)?;
            (code, code.to_string())
        }
        KeyCode::CapsLock => ("CapsLock", "CapsLock".into()),
        KeyCode::ScrollLock => ("ScrollLock", "ScrollLock".into()),
        KeyCode::NumLock => ("NumLock", "NumLock".into()),
        KeyCode::PrintScreen => ("PrintScreen", "PrintScreen".into()),
        KeyCode::Pause => ("Pause", "Pause".into()),
        KeyCode::Menu => ("ContextMenu", "ContextMenu".into()),
        KeyCode::Modifier(modifier) => {
            let (code, key) = modifier_code(modifier);
            (code, key.to_string())
        }
        _ => return None,
    };
    Some(PhysicalKey { code, key })
}
