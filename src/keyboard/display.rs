//! Display adapter from physical key identifiers to keycap text.
//!
//! Identifiers follow the DOM `KeyboardEvent.code` naming (`KeyA`, `Digit1`,
//! `ShiftLeft`, `Numpad7`). Layout tables carry explicit labels; this module
//! derives one when a table leaves it out, and applies the per-OS naming of
//! the modifier keys.
use std::borrow::Cow;
use std::fmt;

use crate::keyboard::layout::KeyDef;

/// Derive a keycap label from an identifier.
pub fn label_for(code: &str) -> String {
    if let Some(rest) = code.strip_prefix("Key") {
        return rest.to_string();
    }
    if let Some(rest) = code.strip_prefix("Digit") {
        return rest.to_string();
    }
    if let Some(rest) = code.strip_prefix("Numpad") {
        return match rest {
            "Divide" => "/".to_string(),
            "Multiply" => "*".to_string(),
            "Subtract" => "-".to_string(),
            "Add" => "+".to_string(),
            "Decimal" => ".".to_string(),
            other => other.to_string(),
        };
    }
    if let Some(rest) = code.strip_prefix("Arrow") {
        return match rest {
            "Up" => "\u{2191}",
            "Down" => "\u{2193}",
            "Left" => "\u{2190}",
            "Right" => "\u{2192}",
            other => other,
        }
        .to_string();
    }
    for side in ["Left", "Right"] {
        if let Some(base) = code.strip_suffix(side) {
            return match base {
                "Control" => "Ctrl".to_string(),
                other => other.to_string(),
            };
        }
    }
    code.to_string()
}

/// Host operating system, used only for modifier key naming.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HostOs {
    #[default]
    Windows,
    Mac,
    Linux,
}

impl HostOs {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "windows" => Some(HostOs::Windows),
            "mac" => Some(HostOs::Mac),
            "linux" => Some(HostOs::Linux),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HostOs::Windows => "windows",
            HostOs::Mac => "mac",
            HostOs::Linux => "linux",
        }
    }

    pub fn next(self) -> Self {
        match self {
            HostOs::Windows => HostOs::Mac,
            HostOs::Mac => HostOs::Linux,
            HostOs::Linux => HostOs::Windows,
        }
    }

    fn meta_label(self) -> &'static str {
        match self {
            HostOs::Windows => "Win",
            HostOs::Mac => "Cmd",
            HostOs::Linux => "Super",
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keycap text for `key` as shown on a board for `os`.
pub fn keycap_label(key: &KeyDef, os: HostOs) -> Cow<'static, str> {
    match key.code {
        "MetaLeft" | "MetaRight" => Cow::Borrowed(os.meta_label()),
        "AltLeft" | "AltRight" if os == HostOs::Mac => Cow::Borrowed("Opt"),
        _ => key.label(),
    }
}
