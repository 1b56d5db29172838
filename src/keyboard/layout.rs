//! Canonical keyboard geometry for every supported form factor.
//!
//! Alignment comes only from key widths/heights (in "u" units, 1u = one
//! standard keycap) and explicit spacer slots. Nothing is inferred at render
//! time.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use crate::keyboard::display;

/// Separation between clusters.
const GAP: f32 = 0.5;
const TAB: f32 = 1.5;
const BACKSLASH: f32 = 1.5;
const CAPS: f32 = 1.75;
const BACKSPACE: f32 = 2.0;
const ENTER: f32 = 2.25;
const LEFT_SHIFT: f32 = 2.25;
const SPACE: f32 = 6.25;
const MOD_125: f32 = 1.25;

/// One physical key slot in a layout row.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyDef {
    /// Physical key identifier (`KeyA`, `ShiftLeft`, ...). Empty for spacers.
    pub code: &'static str,
    label: &'static str,
    pub width: f32,
    pub height: f32,
    pub spacer: bool,
}

impl KeyDef {
    pub const fn key(code: &'static str, label: &'static str, width: f32, height: f32) -> Self {
        Self {
            code,
            label,
            width,
            height,
            spacer: false,
        }
    }

    pub const fn gap(width: f32) -> Self {
        Self {
            code: "",
            label: "",
            width,
            height: 1.0,
            spacer: true,
        }
    }

    /// Keycap text. Falls back to a label derived from the identifier.
    pub fn label(&self) -> Cow<'static, str> {
        if self.label.is_empty() {
            Cow::Owned(display::label_for(self.code))
        } else {
            Cow::Borrowed(self.label)
        }
    }

    pub fn is_interactive(&self) -> bool {
        !self.spacer && !self.code.is_empty()
    }
}

fn k(code: &'static str, label: &'static str) -> KeyDef {
    KeyDef::key(code, label, 1.0, 1.0)
}

fn kw(code: &'static str, label: &'static str, width: f32) -> KeyDef {
    KeyDef::key(code, label, width, 1.0)
}

fn gap(width: f32) -> KeyDef {
    KeyDef::gap(width)
}

/// Supported keyboard form factors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FormFactor {
    #[default]
    Sixty,
    SixtyFive,
    SeventyFive,
    Tkl,
    Full,
}

impl FormFactor {
    pub const ALL: [FormFactor; 5] = [
        FormFactor::Sixty,
        FormFactor::SixtyFive,
        FormFactor::SeventyFive,
        FormFactor::Tkl,
        FormFactor::Full,
    ];

    /// Parse a selector string. Unknown selectors fall back to the 60% layout.
    pub fn from_selector(selector: &str) -> Self {
        Self::parse(selector).unwrap_or_default()
    }

    /// Strict parse, `None` for unknown selectors.
    pub fn parse(selector: &str) -> Option<Self> {
        match selector.trim().to_ascii_lowercase().as_str() {
            "60%" => Some(FormFactor::Sixty),
            "65%" => Some(FormFactor::SixtyFive),
            "75%" => Some(FormFactor::SeventyFive),
            "tkl" => Some(FormFactor::Tkl),
            "100%" => Some(FormFactor::Full),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormFactor::Sixty => "60%",
            FormFactor::SixtyFive => "65%",
            FormFactor::SeventyFive => "75%",
            FormFactor::Tkl => "tkl",
            FormFactor::Full => "100%",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FormFactor::Tkl => "TKL",
            other => other.as_str(),
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn layout(self) -> &'static Layout {
        match self {
            FormFactor::Sixty => &LAYOUT_60,
            FormFactor::SixtyFive => &LAYOUT_65,
            FormFactor::SeventyFive => &LAYOUT_75,
            FormFactor::Tkl => &LAYOUT_TKL,
            FormFactor::Full => &LAYOUT_100,
        }
    }
}

impl fmt::Display for FormFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Ordered rows of key slots. Immutable and shared.
#[derive(Clone, Debug)]
pub struct Layout {
    pub rows: Vec<Vec<KeyDef>>,
}

impl Layout {
    pub fn keys(&self) -> impl Iterator<Item = &KeyDef> {
        self.rows.iter().flatten()
    }

    /// De-duplicated interactive identifiers in first-occurrence order.
    pub fn expected_keys(&self) -> Vec<&'static str> {
        let mut seen = HashSet::new();
        self.keys()
            .filter(|key| key.is_interactive())
            .map(|key| key.code)
            .filter(|code| seen.insert(*code))
            .collect()
    }

    pub fn find(&self, code: &str) -> Option<&KeyDef> {
        self.keys().find(|key| key.is_interactive() && key.code == code)
    }

    /// Width of the widest row, in units.
    pub fn width_units(&self) -> f32 {
        self.rows
            .iter()
            .map(|row| row.iter().map(|key| key.width).sum::<f32>())
            .fold(0.0, f32::max)
    }

    pub fn height_units(&self) -> f32 {
        self.rows.len() as f32
    }

    /// Absolute placement of every interactive key, in layout units.
    /// Spacers advance the cursor but produce no placement.
    pub fn place(&self) -> Vec<PlacedKey<'_>> {
        let mut out = Vec::new();
        for (row_idx, row) in self.rows.iter().enumerate() {
            let mut x = 0.0;
            for key in row {
                if key.is_interactive() {
                    out.push(PlacedKey {
                        key,
                        x,
                        y: row_idx as f32,
                    });
                }
                x += key.width;
            }
        }
        out
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PlacedKey<'a> {
    pub key: &'a KeyDef,
    pub x: f32,
    pub y: f32,
}

/// Layout for a selector string; unknown selectors yield the 60% layout.
pub fn get_layout(selector: &str) -> &'static Layout {
    FormFactor::from_selector(selector).layout()
}

pub fn get_expected_keys(selector: &str) -> Vec<&'static str> {
    get_layout(selector).expected_keys()
}

fn digits_row() -> Vec<KeyDef> {
    vec![
        k("Digit1", "1"),
        k("Digit2", "2"),
        k("Digit3", "3"),
        k("Digit4", "4"),
        k("Digit5", "5"),
        k("Digit6", "6"),
        k("Digit7", "7"),
        k("Digit8", "8"),
        k("Digit9", "9"),
        k("Digit0", "0"),
    ]
}

fn letters(codes: &[(&'static str, &'static str)]) -> Vec<KeyDef> {
    codes.iter().map(|&(code, label)| k(code, label)).collect()
}

fn qwerty_row() -> Vec<KeyDef> {
    letters(&[
        ("KeyQ", "Q"),
        ("KeyW", "W"),
        ("KeyE", "E"),
        ("KeyR", "R"),
        ("KeyT", "T"),
        ("KeyY", "Y"),
        ("KeyU", "U"),
        ("KeyI", "I"),
        ("KeyO", "O"),
        ("KeyP", "P"),
    ])
}

fn home_row() -> Vec<KeyDef> {
    letters(&[
        ("KeyA", "A"),
        ("KeyS", "S"),
        ("KeyD", "D"),
        ("KeyF", "F"),
        ("KeyG", "G"),
        ("KeyH", "H"),
        ("KeyJ", "J"),
        ("KeyK", "K"),
        ("KeyL", "L"),
    ])
}

fn bottom_row() -> Vec<KeyDef> {
    letters(&[
        ("KeyZ", "Z"),
        ("KeyX", "X"),
        ("KeyC", "C"),
        ("KeyV", "V"),
        ("KeyB", "B"),
        ("KeyN", "N"),
        ("KeyM", "M"),
    ])
}

fn f_row_grouped() -> Vec<KeyDef> {
    vec![
        k("F1", "F1"),
        k("F2", "F2"),
        k("F3", "F3"),
        k("F4", "F4"),
        gap(GAP),
        k("F5", "F5"),
        k("F6", "F6"),
        k("F7", "F7"),
        k("F8", "F8"),
        gap(GAP),
        k("F9", "F9"),
        k("F10", "F10"),
        k("F11", "F11"),
        k("F12", "F12"),
    ]
}

/// Rows shared by every layout: number row through the bottom alpha row.
/// `tails` are appended to each row in order.
fn alpha_block(right_shift: f32, tails: [Vec<KeyDef>; 4]) -> Vec<Vec<KeyDef>> {
    let [t1, t2, t3, t4] = tails;

    let mut number = vec![k("Backquote", "`")];
    number.extend(digits_row());
    number.extend([
        k("Minus", "-"),
        k("Equal", "="),
        kw("Backspace", "Backspace", BACKSPACE),
    ]);
    number.extend(t1);

    let mut top = vec![kw("Tab", "Tab", TAB)];
    top.extend(qwerty_row());
    top.extend([
        k("BracketLeft", "["),
        k("BracketRight", "]"),
        kw("Backslash", "\\", BACKSLASH),
    ]);
    top.extend(t2);

    let mut home = vec![kw("CapsLock", "Caps", CAPS)];
    home.extend(home_row());
    home.extend([
        k("Semicolon", ";"),
        k("Quote", "'"),
        kw("Enter", "Enter", ENTER),
    ]);
    home.extend(t3);

    let mut bottom = vec![kw("ShiftLeft", "Shift", LEFT_SHIFT)];
    bottom.extend(bottom_row());
    bottom.extend([
        k("Comma", ","),
        k("Period", "."),
        k("Slash", "/"),
        kw("ShiftRight", "Shift", right_shift),
    ]);
    bottom.extend(t4);

    vec![number, top, home, bottom]
}

fn arrows() -> [KeyDef; 3] {
    [
        k("ArrowLeft", "\u{2190}"),
        k("ArrowDown", "\u{2193}"),
        k("ArrowRight", "\u{2192}"),
    ]
}

/// Bottom row of the compact boards: three 1.25u mods, space, three 1u mods.
/// Totals 13u so the arrow cluster lines up under the right-hand column.
fn compact_mods(right: [KeyDef; 3]) -> Vec<KeyDef> {
    let mut row = vec![
        kw("ControlLeft", "Ctrl", MOD_125),
        kw("MetaLeft", "Meta", MOD_125),
        kw("AltLeft", "Alt", MOD_125),
        kw("Space", "Space", SPACE),
    ];
    row.extend(right);
    row.push(gap(GAP));
    row
}

static LAYOUT_60: LazyLock<Layout> = LazyLock::new(|| {
    let mut rows = alpha_block(2.75, [vec![], vec![], vec![], vec![]]);
    rows.push(vec![
        kw("ControlLeft", "Ctrl", MOD_125),
        kw("MetaLeft", "Meta", MOD_125),
        kw("AltLeft", "Alt", MOD_125),
        kw("Space", "Space", SPACE),
        kw("AltRight", "Alt", MOD_125),
        kw("MetaRight", "Meta", MOD_125),
        kw("ContextMenu", "Menu", MOD_125),
        kw("ControlRight", "Ctrl", MOD_125),
    ]);
    Layout { rows }
});

static LAYOUT_65: LazyLock<Layout> = LazyLock::new(|| {
    let mut rows = alpha_block(
        1.75,
        [
            vec![gap(GAP), k("Delete", "Del")],
            vec![gap(GAP), k("PageUp", "PgUp")],
            vec![gap(GAP), k("PageDown", "PgDn")],
            vec![gap(GAP), k("ArrowUp", "\u{2191}"), k("End", "End")],
        ],
    );
    let mut bottom = compact_mods([
        k("AltRight", "Alt"),
        k("ControlRight", "Ctrl"),
        k("MetaRight", "Meta"),
    ]);
    bottom.extend(arrows());
    rows.push(bottom);
    Layout { rows }
});

static LAYOUT_75: LazyLock<Layout> = LazyLock::new(|| {
    let mut f_row = vec![k("Escape", "Esc"), gap(1.0)];
    f_row.extend(f_row_grouped());
    f_row.extend([gap(GAP), k("Delete", "Del")]);

    let mut rows = vec![f_row];
    rows.extend(alpha_block(
        1.75,
        [
            vec![gap(GAP), k("PageUp", "PgUp")],
            vec![gap(GAP), k("PageDown", "PgDn")],
            vec![gap(GAP), k("End", "End")],
            vec![gap(GAP), k("ArrowUp", "\u{2191}"), gap(1.0)],
        ],
    ));
    let mut bottom = compact_mods([
        k("AltRight", "Alt"),
        k("ControlRight", "Ctrl"),
        k("ContextMenu", "Menu"),
    ]);
    bottom.extend(arrows());
    rows.push(bottom);
    Layout { rows }
});

fn tkl_rows() -> Vec<Vec<KeyDef>> {
    let mut f_row = vec![k("Escape", "Esc"), gap(1.0)];
    f_row.extend(f_row_grouped());
    f_row.extend([
        gap(GAP),
        k("PrintScreen", "PrtSc"),
        k("ScrollLock", "ScrLk"),
        k("Pause", "Pause"),
    ]);

    let mut rows = vec![f_row];
    rows.extend(alpha_block(
        2.75,
        [
            vec![
                gap(GAP),
                k("Insert", "Ins"),
                k("Home", "Home"),
                k("PageUp", "PgUp"),
            ],
            vec![
                gap(GAP),
                k("Delete", "Del"),
                k("End", "End"),
                k("PageDown", "PgDn"),
            ],
            vec![gap(GAP), gap(3.0)],
            vec![gap(GAP), gap(1.0), k("ArrowUp", "\u{2191}"), gap(1.0)],
        ],
    ));
    let mut bottom = vec![
        kw("ControlLeft", "Ctrl", MOD_125),
        kw("MetaLeft", "Meta", MOD_125),
        kw("AltLeft", "Alt", MOD_125),
        kw("Space", "Space", SPACE),
        kw("AltRight", "Alt", MOD_125),
        kw("MetaRight", "Meta", MOD_125),
        kw("ContextMenu", "Menu", MOD_125),
        kw("ControlRight", "Ctrl", MOD_125),
        gap(GAP),
    ];
    bottom.extend(arrows());
    rows.push(bottom);
    rows
}

static LAYOUT_TKL: LazyLock<Layout> = LazyLock::new(|| Layout { rows: tkl_rows() });

static LAYOUT_100: LazyLock<Layout> = LazyLock::new(|| {
    let mut rows = tkl_rows();
    let numpad: [Vec<KeyDef>; 6] = [
        vec![
            gap(GAP),
            k("NumLock", "Num"),
            k("NumpadDivide", "/"),
            k("NumpadMultiply", "*"),
            k("NumpadSubtract", "-"),
        ],
        vec![
            gap(GAP),
            k("Numpad7", "7"),
            k("Numpad8", "8"),
            k("Numpad9", "9"),
            k("NumpadAdd", "+"),
        ],
        vec![
            gap(GAP),
            k("Numpad4", "4"),
            k("Numpad5", "5"),
            k("Numpad6", "6"),
            gap(1.0),
        ],
        vec![
            gap(GAP),
            k("Numpad1", "1"),
            k("Numpad2", "2"),
            k("Numpad3", "3"),
            KeyDef::key("NumpadEnter", "Enter", 1.0, 2.0),
        ],
        vec![
            gap(GAP),
            kw("Numpad0", "0", 2.0),
            k("NumpadDecimal", "."),
        ],
        vec![gap(GAP), gap(1.0), gap(1.0), gap(1.0), gap(1.0)],
    ];
    for (row, tail) in rows.iter_mut().zip(numpad) {
        row.extend(tail);
    }
    Layout { rows }
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_selector_falls_back_to_sixty() {
        assert_eq!(FormFactor::from_selector("40%"), FormFactor::Sixty);
        assert_eq!(FormFactor::from_selector(""), FormFactor::Sixty);
        assert_eq!(
            get_expected_keys("nonsense"),
            FormFactor::Sixty.layout().expected_keys()
        );
    }

    #[test]
    fn test_selector_is_case_insensitive() {
        assert_eq!(FormFactor::from_selector("TKL"), FormFactor::Tkl);
        assert_eq!(FormFactor::from_selector(" 100% "), FormFactor::Full);
    }

    #[test]
    fn test_expected_keys_unique_and_no_spacers() {
        for ff in FormFactor::ALL {
            let expected = ff.layout().expected_keys();
            let unique: HashSet<_> = expected.iter().collect();
            assert_eq!(unique.len(), expected.len(), "{ff} has duplicates");
            assert!(expected.iter().all(|code| !code.is_empty()));
        }
    }

    #[test]
    fn test_all_dimensions_positive() {
        for ff in FormFactor::ALL {
            for key in ff.layout().keys() {
                assert!(key.width > 0.0, "{ff}: {:?}", key);
                assert!(key.height > 0.0, "{ff}: {:?}", key);
            }
        }
    }

    #[test]
    fn test_expected_key_counts() {
        assert_eq!(get_expected_keys("60%").len(), 61);
        assert_eq!(get_expected_keys("65%").len(), 68);
        assert_eq!(get_expected_keys("75%").len(), 81);
        assert_eq!(get_expected_keys("tkl").len(), 87);
        assert_eq!(get_expected_keys("100%").len(), 104);
    }

    #[test]
    fn test_larger_layouts_extend_sixty() {
        let base = get_expected_keys("60%");
        for ff in [FormFactor::Tkl, FormFactor::Full] {
            let keys = ff.layout().expected_keys();
            for code in &base {
                assert!(keys.contains(code), "{ff} missing {code}");
            }
        }
    }

    #[test]
    fn test_first_occurrence_order() {
        let keys = get_expected_keys("60%");
        assert_eq!(keys[0], "Backquote");
        assert_eq!(keys[1], "Digit1");
        assert_eq!(*keys.last().unwrap(), "ControlRight");
    }

    #[test]
    fn test_numpad_irregular_keys() {
        let layout = FormFactor::Full.layout();
        let enter = layout.find("NumpadEnter").unwrap();
        assert_eq!(enter.height, 2.0);
        let zero = layout.find("Numpad0").unwrap();
        assert_eq!(zero.width, 2.0);
    }

    #[test]
    fn test_place_skips_spacers_but_advances() {
        let layout = FormFactor::SixtyFive.layout();
        let placed = layout.place();
        let del = placed.iter().find(|p| p.key.code == "Delete").unwrap();
        // 15u of alpha row plus a half-unit gap
        assert!((del.x - 15.5).abs() < f32::EPSILON);
        assert_eq!(del.y, 0.0);
        assert_eq!(placed.len(), layout.expected_keys().len());
    }

    #[test]
    fn test_numpad_aligned_with_top_rows() {
        let placed = FormFactor::Full.layout().place();
        let x_of = |code: &str| placed.iter().find(|p| p.key.code == code).unwrap().x;
        assert_eq!(x_of("NumLock"), x_of("Numpad7"));
        assert_eq!(x_of("Numpad7"), x_of("Numpad4"));
        assert_eq!(x_of("Numpad1"), x_of("Numpad0"));
    }

    #[test]
    fn test_arrow_up_sits_over_arrow_down() {
        for ff in [FormFactor::SixtyFive, FormFactor::SeventyFive, FormFactor::Tkl] {
            let placed = ff.layout().place();
            let x_of = |code: &str| placed.iter().find(|p| p.key.code == code).unwrap().x;
            assert_eq!(x_of("ArrowUp"), x_of("ArrowDown"), "{ff}");
        }
    }

    #[test]
    fn test_form_factor_cycle_wraps() {
        let mut ff = FormFactor::Sixty;
        for _ in 0..FormFactor::ALL.len() {
            ff = ff.next();
        }
        assert_eq!(ff, FormFactor::Sixty);
    }

    #[test]
    fn test_label_falls_back_to_derived() {
        let key = KeyDef::key("KeyQ", "", 1.0, 1.0);
        assert_eq!(key.label(), "Q");
    }
}
