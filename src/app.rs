use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use tracing::{debug, info};

use crate::config::Config;
use crate::keyboard::layout::FormFactor;
use crate::keyboard::physical;
use crate::prompts::picker::PromptPicker;
use crate::prompts::{Corpus, LengthTier};
use crate::session::checker::{CheckerSession, KeyChecker};
use crate::session::typing::{Stage, TypingDefaults, TypingTest};
use crate::store::prefs::{PreferenceStore, keys};
use crate::ui::theme::Theme;

/// Held keys are released after this much silence when the terminal cannot
/// report key releases.
pub const RELEASE_FALLBACK: Duration = Duration::from_millis(150);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Checker,
    Typing,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Checker, Tab::Typing];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "checker" => Some(Tab::Checker),
            "typing" => Some(Tab::Typing),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Checker => "checker",
            Tab::Typing => "typing",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Checker => "Key Checker",
            Tab::Typing => "Typing Test",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Checker => Tab::Typing,
            Tab::Typing => Tab::Checker,
        }
    }
}

/// Command-line selections. They beat both preferences and config for this
/// run and are not persisted.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub theme: Option<String>,
    pub layout: Option<FormFactor>,
    pub tab: Option<Tab>,
    pub pack: Option<String>,
    pub length: Option<LengthTier>,
}

pub struct App {
    pub tab: Tab,
    pub checker: KeyChecker,
    pub typing: TypingTest,
    pub theme: Theme,
    pub config: Config,
    pub should_quit: bool,
    pub last_key_time: Option<Instant>,
    /// Whether the terminal reports key releases.
    pub keyboard_enhanced: bool,
    prefs: Box<dyn PreferenceStore>,
}

impl App {
    pub fn new(
        config: Config,
        mut prefs: Box<dyn PreferenceStore>,
        corpus: Corpus,
        overrides: Overrides,
    ) -> Self {
        let theme_name = overrides
            .theme
            .clone()
            .or_else(|| prefs.get(keys::THEME))
            .unwrap_or_else(|| config.theme.clone());
        let theme = Theme::load(&theme_name).unwrap_or_default();

        let mut checker = KeyChecker::initialize(prefs.as_ref(), config.form_factor(), config.os());
        if let Some(form_factor) = overrides.layout {
            checker.session = CheckerSession::new(form_factor);
        }

        let mut typing = TypingTest::initialize(
            prefs.as_mut(),
            corpus,
            TypingDefaults {
                pack: config.default_pack.clone(),
                tier: config.length_tier(),
            },
            PromptPicker::new(config.prompt_repeat_attempts),
        );
        if overrides.pack.is_some() || overrides.length.is_some() {
            let pack = overrides
                .pack
                .clone()
                .unwrap_or_else(|| typing.session.pack.clone());
            let tier = overrides.length.unwrap_or(typing.session.tier);
            typing.select(&pack, tier, prefs.as_mut());
        }

        let tab = overrides
            .tab
            .or_else(|| prefs.get(keys::LAST_TAB).and_then(|v| Tab::parse(&v)))
            .unwrap_or_default();

        let mut app = Self {
            tab,
            checker,
            typing,
            theme,
            config,
            should_quit: false,
            last_key_time: None,
            keyboard_enhanced: false,
            prefs,
        };
        app.apply_tab();
        info!(
            tab = tab.as_str(),
            layout = app.checker.form_factor().as_str(),
            pack = %app.typing.session.pack,
            "app started"
        );
        app
    }

    pub fn prefs(&self) -> &dyn PreferenceStore {
        self.prefs.as_ref()
    }

    fn apply_tab(&mut self) {
        self.checker.set_active(self.tab == Tab::Checker);
        self.typing.set_active(self.tab == Tab::Typing);
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.apply_tab();
        self.prefs.set(keys::LAST_TAB, tab.as_str());
        debug!(tab = tab.as_str(), "tab switched");
    }

    pub fn toggle_theme(&mut self) {
        let name = self.theme.toggled_name();
        if let Some(theme) = Theme::load(name) {
            self.theme = theme;
            self.prefs.set(keys::THEME, name);
            info!(theme = name, "theme changed");
        }
    }

    /// Route one terminal key event. Releases go to the checker whatever the
    /// active tab; presses go only to the active tool unless they are an app
    /// command.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        match key.kind {
            KeyEventKind::Repeat => return,
            KeyEventKind::Release => {
                self.last_key_time = Some(now);
                if let Some(physical) = physical::from_key_event(&key) {
                    self.checker.on_key_up(&physical);
                }
                return;
            }
            KeyEventKind::Press => {}
        }
        self.last_key_time = Some(now);

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if let KeyCode::Char(ch) = key.code {
                if self.handle_command(ch.to_ascii_lowercase()) {
                    return;
                }
            }
        }

        match self.tab {
            Tab::Checker => self.handle_checker_key(key),
            Tab::Typing => self.handle_typing_key(key, now),
        }
    }

    /// Ctrl-chord commands. Returns whether the chord was consumed.
    fn handle_command(&mut self, ch: char) -> bool {
        match ch {
            'c' | 'q' => self.should_quit = true,
            't' => self.set_tab(self.tab.next()),
            'd' => self.toggle_theme(),
            'r' => match self.tab {
                Tab::Checker => self.checker.reset(),
                Tab::Typing => self.typing.reset(self.prefs.as_mut()),
            },
            'l' => match self.tab {
                Tab::Checker => {
                    let next = self.checker.form_factor().next();
                    self.checker.set_layout(next, self.prefs.as_mut(), true);
                }
                Tab::Typing => {
                    let next = self.typing.session.tier.next();
                    self.typing.set_tier(next, self.prefs.as_mut());
                }
            },
            'f' if self.tab == Tab::Checker => {
                self.checker.request_finish();
            }
            'o' if self.tab == Tab::Checker => {
                let next = self.checker.os.next();
                self.checker.set_os(next, self.prefs.as_mut());
            }
            'p' if self.tab == Tab::Typing => self.typing.next_pack(self.prefs.as_mut()),
            _ => return false,
        }
        true
    }

    fn handle_checker_key(&mut self, key: KeyEvent) {
        if self.checker.confirm_open {
            match key.code {
                KeyCode::Char('y' | 'Y') | KeyCode::Enter => self.checker.answer_finish(true),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => self.checker.answer_finish(false),
                _ => {}
            }
            return;
        }
        if let Some(physical) = physical::from_key_event(&key) {
            self.checker.on_key_down(&physical);
        }
    }

    fn handle_typing_key(&mut self, key: KeyEvent, now: Instant) {
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match (self.typing.stage(), key.code) {
            (_, KeyCode::Esc) => self.typing.reset(self.prefs.as_mut()),
            (Stage::Idle, KeyCode::Enter) => self.typing.start(now),
            (Stage::Done, KeyCode::Enter) => self.typing.retry(self.prefs.as_mut()),
            (Stage::Running, KeyCode::Backspace) => self.typing.backspace(now),
            (Stage::Idle | Stage::Running, KeyCode::Char(ch)) if plain => {
                self.typing.type_char(typed_char(&key, ch), now)
            }
            _ => {}
        }
    }

    /// Release fallback for terminals without key release events.
    pub fn on_tick(&mut self, now: Instant) {
        if self.keyboard_enhanced || self.checker.session.held.is_empty() {
            return;
        }
        if let Some(last) = self.last_key_time {
            if now.saturating_duration_since(last) > RELEASE_FALLBACK {
                self.checker.release_all();
                self.last_key_time = None;
            }
        }
    }
}

/// Terminals that report every key as an escape code may send the base key
/// with a Shift flag instead of the shifted character.
fn typed_char(key: &KeyEvent, ch: char) -> char {
    if key.modifiers.contains(KeyModifiers::SHIFT) && !key.state.contains(KeyEventState::KEYPAD) {
        physical::shifted_char(ch)
    } else {
        ch
    }
}
