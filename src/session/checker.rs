use std::collections::HashSet;

use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::keyboard::display::HostOs;
use crate::keyboard::layout::{FormFactor, KeyDef, Layout};
use crate::keyboard::physical::PhysicalKey;
use crate::session::result::CheckerOutcome;
use crate::store::prefs::{PreferenceStore, keys};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

impl KeyDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyDirection::Down => "keydown",
            KeyDirection::Up => "keyup",
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub direction: KeyDirection,
    pub code: &'static str,
    pub key: String,
}

impl LogEntry {
    pub fn line(&self) -> String {
        format!(
            "[{}] {:<7} key=\"{}\" code={}",
            self.at.format("%H:%M:%S"),
            self.direction.as_str(),
            self.key,
            self.code
        )
    }
}

/// Per-attempt checker state. Created on init, on restart and whenever the
/// layout changes.
#[derive(Clone, Debug, Default)]
pub struct CheckerSession {
    pub form_factor: FormFactor,
    pub held: HashSet<&'static str>,
    /// Append-only: a released key still counts as covered.
    pub ever_pressed: HashSet<&'static str>,
    pub log: Vec<LogEntry>,
    pub started: bool,
    pub finished: bool,
}

impl CheckerSession {
    pub fn new(form_factor: FormFactor) -> Self {
        Self {
            form_factor,
            ..Self::default()
        }
    }

    pub fn layout(&self) -> &'static Layout {
        self.form_factor.layout()
    }

    /// Expected keys never pressed, in layout order.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        self.layout()
            .expected_keys()
            .into_iter()
            .filter(|code| !self.ever_pressed.contains(code))
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyVisual {
    Idle,
    Seen,
    Held,
}

/// Declarative view of the board: one entry per interactive key.
pub fn key_states<'a>(
    layout: &'a Layout,
    session: &CheckerSession,
) -> Vec<(&'a KeyDef, KeyVisual)> {
    layout
        .keys()
        .filter(|key| key.is_interactive())
        .map(|key| {
            let visual = if session.held.contains(key.code) {
                KeyVisual::Held
            } else if session.ever_pressed.contains(key.code) {
                KeyVisual::Seen
            } else {
                KeyVisual::Idle
            };
            (key, visual)
        })
        .collect()
}

/// Keyboard tester. Owns its session; the host routes raw key events here.
pub struct KeyChecker {
    pub session: CheckerSession,
    pub os: HostOs,
    pub outcome: Option<CheckerOutcome>,
    pub confirm_open: bool,
    pub hint: Option<&'static str>,
    active: bool,
}

impl KeyChecker {
    /// Restore the last layout and OS from preferences, falling back to the
    /// given defaults.
    pub fn initialize(prefs: &dyn PreferenceStore, default_ff: FormFactor, default_os: HostOs) -> Self {
        let form_factor = prefs
            .get(keys::CHECKER_LAYOUT)
            .and_then(|v| FormFactor::parse(&v))
            .unwrap_or(default_ff);
        let os = prefs
            .get(keys::CHECKER_OS)
            .and_then(|v| HostOs::parse(&v))
            .unwrap_or(default_os);
        debug!(layout = form_factor.as_str(), os = os.as_str(), "checker initialized");
        Self {
            session: CheckerSession::new(form_factor),
            os,
            outcome: None,
            confirm_open: false,
            hint: None,
            active: true,
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn form_factor(&self) -> FormFactor {
        self.session.form_factor
    }

    pub fn on_key_down(&mut self, key: &PhysicalKey) {
        if self.session.finished || !self.active || key.code.is_empty() {
            return;
        }
        if !self.session.started {
            debug!("checker session started");
            self.session.started = true;
        }
        self.session.held.insert(key.code);
        self.session.ever_pressed.insert(key.code);
        self.push_log(KeyDirection::Down, key);
    }

    /// Releases are honored for any held key, even while inactive or
    /// finished, so nothing stays stuck down across a tab switch.
    pub fn on_key_up(&mut self, key: &PhysicalKey) {
        if !self.session.held.remove(key.code) {
            return;
        }
        self.push_log(KeyDirection::Up, key);
    }

    /// Release everything still held. Used when the terminal cannot report
    /// key releases.
    pub fn release_all(&mut self) {
        let mut held: Vec<&'static str> = self.session.held.iter().copied().collect();
        held.sort_unstable();
        for code in held {
            self.on_key_up(&PhysicalKey::new(code, ""));
        }
    }

    fn push_log(&mut self, direction: KeyDirection, key: &PhysicalKey) {
        self.session.log.push(LogEntry {
            at: Local::now(),
            direction,
            code: key.code,
            key: key.key.clone(),
        });
    }

    /// Open the "did you press every key?" prompt. Only available once the
    /// session has started.
    pub fn request_finish(&mut self) -> bool {
        if !self.session.started || self.session.finished {
            return false;
        }
        self.confirm_open = true;
        self.hint = None;
        true
    }

    pub fn answer_finish(&mut self, yes: bool) {
        if !self.confirm_open {
            return;
        }
        self.confirm_open = false;
        if yes {
            self.finish();
        } else {
            self.hint = Some("continue testing");
        }
    }

    pub fn finish(&mut self) -> &CheckerOutcome {
        self.session.finished = true;
        self.confirm_open = false;
        let missing = self.session.missing_keys();
        info!(
            layout = self.session.form_factor.as_str(),
            missing = missing.len(),
            "checker session finished"
        );
        self.outcome.insert(CheckerOutcome::from_missing(missing))
    }

    pub fn reset(&mut self) {
        self.session = CheckerSession::new(self.session.form_factor);
        self.outcome = None;
        self.confirm_open = false;
        self.hint = None;
        debug!(layout = self.session.form_factor.as_str(), "checker reset");
    }

    pub fn set_layout(&mut self, form_factor: FormFactor, prefs: &mut dyn PreferenceStore, reset: bool) {
        self.session.form_factor = form_factor;
        prefs.set(keys::CHECKER_LAYOUT, form_factor.as_str());
        if reset {
            self.reset();
        }
    }

    pub fn set_os(&mut self, os: HostOs, prefs: &mut dyn PreferenceStore) {
        self.os = os;
        prefs.set(keys::CHECKER_OS, os.as_str());
    }

    pub fn key_states(&self) -> Vec<(&'static KeyDef, KeyVisual)> {
        key_states(self.session.layout(), &self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::prefs::MemoryPrefStore;

    fn checker() -> KeyChecker {
        KeyChecker::initialize(&MemoryPrefStore::default(), FormFactor::Sixty, HostOs::Windows)
    }

    fn key(code: &'static str) -> PhysicalKey {
        PhysicalKey::new(code, code)
    }

    #[test]
    fn test_release_keeps_ever_pressed() {
        let mut c = checker();
        c.on_key_down(&key("KeyA"));
        c.on_key_down(&key("KeyB"));
        c.on_key_up(&key("KeyA"));
        assert_eq!(c.session.held, HashSet::from(["KeyB"]));
        assert_eq!(c.session.ever_pressed, HashSet::from(["KeyA", "KeyB"]));
        assert_eq!(c.session.log.len(), 3);
        assert_eq!(c.session.log[2].direction, KeyDirection::Up);
    }

    #[test]
    fn test_first_key_down_starts_session() {
        let mut c = checker();
        assert!(!c.request_finish());
        c.on_key_down(&key("Space"));
        assert!(c.session.started);
        assert!(c.request_finish());
        assert!(c.confirm_open);
    }

    #[test]
    fn test_empty_code_ignored() {
        let mut c = checker();
        c.on_key_down(&PhysicalKey::new("", "?"));
        assert!(!c.session.started);
        assert!(c.session.log.is_empty());
    }

    #[test]
    fn test_inactive_ignores_down_but_honors_release() {
        let mut c = checker();
        c.on_key_down(&key("KeyQ"));
        c.set_active(false);
        c.on_key_down(&key("KeyW"));
        c.on_key_up(&key("KeyQ"));
        assert!(c.session.held.is_empty());
        assert!(!c.session.ever_pressed.contains("KeyW"));
    }

    #[test]
    fn test_finish_reports_missing_in_layout_order() {
        let mut c = checker();
        for code in FormFactor::Sixty.layout().expected_keys() {
            if code != "KeyZ" && code != "Backquote" {
                c.on_key_down(&key(code));
            }
        }
        let outcome = c.finish().clone();
        assert_eq!(outcome, CheckerOutcome::Missing(vec!["Backquote", "KeyZ"]));
    }

    #[test]
    fn test_finish_all_pressed_is_complete() {
        let mut c = checker();
        for code in FormFactor::Sixty.layout().expected_keys() {
            c.on_key_down(&key(code));
            c.on_key_up(&key(code));
        }
        assert_eq!(*c.finish(), CheckerOutcome::Complete);
    }

    #[test]
    fn test_finished_session_ignores_key_down() {
        let mut c = checker();
        c.on_key_down(&key("KeyA"));
        c.finish();
        c.on_key_down(&key("KeyB"));
        assert!(!c.session.ever_pressed.contains("KeyB"));
    }

    #[test]
    fn test_answer_no_keeps_testing() {
        let mut c = checker();
        c.on_key_down(&key("KeyA"));
        c.request_finish();
        c.answer_finish(false);
        assert!(!c.session.finished);
        assert_eq!(c.hint, Some("continue testing"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut c = checker();
        c.on_key_down(&key("KeyA"));
        c.on_key_down(&key("KeyS"));
        c.finish();
        c.reset();
        assert!(c.session.held.is_empty());
        assert!(c.session.ever_pressed.is_empty());
        assert!(c.session.log.is_empty());
        assert!(c.outcome.is_none());
        assert!(!c.session.started);
    }

    #[test]
    fn test_set_layout_persists_and_changes_criteria() {
        let mut prefs = MemoryPrefStore::default();
        let mut c = KeyChecker::initialize(&prefs, FormFactor::Sixty, HostOs::Windows);
        for code in FormFactor::Sixty.layout().expected_keys() {
            c.on_key_down(&key(code));
        }
        c.set_layout(FormFactor::SixtyFive, &mut prefs, false);
        assert_eq!(prefs.get(keys::CHECKER_LAYOUT).as_deref(), Some("65%"));
        let CheckerOutcome::Missing(missing) = c.finish().clone() else {
            panic!("65% adds keys the 60% board lacks");
        };
        assert!(missing.contains(&"Delete"));
        assert!(!missing.contains(&"KeyA"));
    }

    #[test]
    fn test_initialize_restores_persisted_layout() {
        let mut prefs = MemoryPrefStore::default();
        prefs.set(keys::CHECKER_LAYOUT, "tkl");
        prefs.set(keys::CHECKER_OS, "mac");
        let c = KeyChecker::initialize(&prefs, FormFactor::Sixty, HostOs::Windows);
        assert_eq!(c.form_factor(), FormFactor::Tkl);
        assert_eq!(c.os, HostOs::Mac);
    }

    #[test]
    fn test_initialize_ignores_invalid_pref() {
        let mut prefs = MemoryPrefStore::default();
        prefs.set(keys::CHECKER_LAYOUT, "40%");
        let c = KeyChecker::initialize(&prefs, FormFactor::Full, HostOs::Windows);
        assert_eq!(c.form_factor(), FormFactor::Full);
    }

    #[test]
    fn test_key_states_reflect_session() {
        let mut c = checker();
        c.on_key_down(&key("KeyA"));
        c.on_key_down(&key("KeyB"));
        c.on_key_up(&key("KeyB"));
        let states = c.key_states();
        let visual = |code: &str| states.iter().find(|(k, _)| k.code == code).unwrap().1;
        assert_eq!(visual("KeyA"), KeyVisual::Held);
        assert_eq!(visual("KeyB"), KeyVisual::Seen);
        assert_eq!(visual("KeyC"), KeyVisual::Idle);
        assert_eq!(states.len(), FormFactor::Sixty.layout().expected_keys().len());
    }

    #[test]
    fn test_release_all_clears_held() {
        let mut c = checker();
        c.on_key_down(&key("KeyA"));
        c.on_key_down(&key("ShiftLeft"));
        c.release_all();
        assert!(c.session.held.is_empty());
        assert_eq!(c.session.ever_pressed.len(), 2);
    }

    #[test]
    fn test_log_line_format() {
        let entry = LogEntry {
            at: Local::now(),
            direction: KeyDirection::Up,
            code: "KeyA",
            key: "a".to_string(),
        };
        let line = entry.line();
        assert!(line.ends_with("keyup   key=\"a\" code=KeyA"), "{line}");
    }
}
