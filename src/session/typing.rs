use std::time::Instant;

use tracing::{debug, info};

use crate::prompts::picker::PromptPicker;
use crate::prompts::{Corpus, DEFAULT_PACK, LengthTier, Prompt};
use crate::session::result::TypingResult;
use crate::store::prefs::{PreferenceStore, keys};

pub const NO_FOCUS: &str = "—";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Idle,
    Running,
    Done,
}

/// Per-attempt typing state. Rebuilt on every reset.
#[derive(Clone, Debug)]
pub struct TypingSession {
    pub pack: String,
    pub tier: LengthTier,
    pub prompt: Prompt,
    pub typed: String,
    pub stage: Stage,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
}

impl TypingSession {
    pub fn new(pack: String, tier: LengthTier, prompt: Prompt) -> Self {
        Self {
            pack,
            tier,
            prompt,
            typed: String::new(),
            stage: Stage::Idle,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn target(&self) -> &str {
        &self.prompt.text
    }

    pub fn target_len(&self) -> usize {
        self.prompt.text.chars().count()
    }

    pub fn typed_len(&self) -> usize {
        self.typed.chars().count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    Matched,
    Mismatched,
    /// First character not reached yet.
    Cursor,
    Pending,
}

/// Classify every target character against the typed buffer by position.
pub fn classify(target: &str, typed: &str) -> Vec<(char, CharClass)> {
    let mut typed_chars = typed.chars();
    let mut cursor_placed = false;
    target
        .chars()
        .map(|ch| {
            let class = match typed_chars.next() {
                Some(actual) if actual == ch => CharClass::Matched,
                Some(_) => CharClass::Mismatched,
                None if !cursor_placed => {
                    cursor_placed = true;
                    CharClass::Cursor
                }
                None => CharClass::Pending,
            };
            (ch, class)
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Focus {
    pub word: String,
    pub letter: String,
}

/// The space-delimited word around char index `idx` and the letter at `idx`.
/// Either is `—` when there is nothing to show.
pub fn focus(target: &str, idx: usize) -> Focus {
    let chars: Vec<char> = target.chars().collect();
    let idx = idx.min(chars.len());

    let start = chars[..idx]
        .iter()
        .rposition(|c| *c == ' ')
        .map_or(0, |i| i + 1);
    let end = chars[idx..]
        .iter()
        .position(|c| *c == ' ')
        .map_or(chars.len(), |i| idx + i);
    let word: String = chars[start..end].iter().collect();

    Focus {
        word: if word.is_empty() {
            NO_FOCUS.to_string()
        } else {
            word
        },
        letter: chars
            .get(idx)
            .map_or_else(|| NO_FOCUS.to_string(), char::to_string),
    }
}

pub struct TypingDefaults {
    pub pack: String,
    pub tier: LengthTier,
}

impl Default for TypingDefaults {
    fn default() -> Self {
        Self {
            pack: DEFAULT_PACK.to_string(),
            tier: LengthTier::default(),
        }
    }
}

/// Typing speed test. Owns the corpus and its session; the host feeds it
/// buffer edits and reads back the classification and results.
pub struct TypingTest {
    pub session: TypingSession,
    pub result: Option<TypingResult>,
    corpus: Corpus,
    picker: PromptPicker,
    active: bool,
}

impl TypingTest {
    /// Restore pack and tier from preferences, then draw the first prompt.
    pub fn initialize(
        prefs: &mut dyn PreferenceStore,
        corpus: Corpus,
        defaults: TypingDefaults,
        picker: PromptPicker,
    ) -> Self {
        let pack = prefs
            .get(keys::TYPING_PACK)
            .filter(|p| corpus.contains(p))
            .or_else(|| corpus.contains(&defaults.pack).then_some(defaults.pack))
            .or_else(|| corpus.pack(DEFAULT_PACK).map(|p| p.id.clone()))
            .unwrap_or_default();
        let tier = prefs
            .get(keys::TYPING_LENGTH)
            .and_then(|v| LengthTier::parse(&v))
            .unwrap_or(defaults.tier);

        let mut test = Self {
            session: TypingSession::new(pack, tier, empty_prompt()),
            result: None,
            corpus,
            picker,
            active: true,
        };
        test.reset(prefs);
        test
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn stage(&self) -> Stage {
        self.session.stage
    }

    /// Draw a fresh prompt and return to idle.
    pub fn reset(&mut self, prefs: &mut dyn PreferenceStore) {
        let pack = self.session.pack.clone();
        let tier = self.session.tier;
        let last_key = keys::last_prompt(&pack, tier.as_str());
        let last = prefs.get(&last_key);
        let prompt = self.picker.pick(&self.corpus, &pack, tier, last.as_deref());
        if !prompt.text.is_empty() {
            prefs.set(&last_key, &prompt.text);
        }
        debug!(pack = %pack, tier = tier.as_str(), chars = prompt.text.len(), "typing prompt selected");
        self.session = TypingSession::new(pack, tier, prompt);
        self.result = None;
    }

    pub fn start(&mut self, now: Instant) {
        if !self.active || self.session.stage != Stage::Idle || self.session.target().is_empty() {
            return;
        }
        self.session.stage = Stage::Running;
        self.session.started_at = Some(now);
        debug!("typing run started");
    }

    /// Replace the buffer with `value`. The first character of an idle run
    /// starts it; reaching the target length finishes it.
    pub fn on_input(&mut self, value: &str, now: Instant) {
        if !self.active {
            return;
        }
        match self.session.stage {
            Stage::Done => return,
            Stage::Idle if value.is_empty() => return,
            Stage::Idle => self.start(now),
            Stage::Running => {}
        }
        if self.session.stage != Stage::Running {
            return;
        }
        self.session.typed = value.to_string();
        if self.session.typed_len() >= self.session.target_len() {
            self.complete(now);
        }
    }

    pub fn type_char(&mut self, ch: char, now: Instant) {
        let mut value = self.session.typed.clone();
        value.push(ch);
        self.on_input(&value, now);
    }

    pub fn backspace(&mut self, now: Instant) {
        if !self.active || self.session.stage != Stage::Running {
            return;
        }
        let mut value = self.session.typed.clone();
        value.pop();
        self.on_input(&value, now);
    }

    fn complete(&mut self, now: Instant) {
        self.session.stage = Stage::Done;
        self.session.finished_at = Some(now);
        let result = TypingResult::compute(
            self.session.target(),
            &self.session.typed,
            self.session.started_at,
            self.session.finished_at,
        );
        info!(
            pack = %self.session.pack,
            tier = self.session.tier.as_str(),
            accuracy = result.accuracy,
            wpm = result.wpm,
            "typing run finished"
        );
        self.result = Some(result);
    }

    pub fn retry(&mut self, prefs: &mut dyn PreferenceStore) {
        self.reset(prefs);
    }

    /// Switch pack and tier for this run without remembering the choice.
    pub fn select(&mut self, pack: &str, tier: LengthTier, prefs: &mut dyn PreferenceStore) {
        if let Some(id) = self.corpus.pack(pack).map(|p| p.id.clone()) {
            self.session.pack = id;
        }
        self.session.tier = tier;
        self.reset(prefs);
    }

    pub fn set_pack(&mut self, pack: &str, prefs: &mut dyn PreferenceStore) {
        let Some(id) = self.corpus.pack(pack).map(|p| p.id.clone()) else {
            return;
        };
        prefs.set(keys::TYPING_PACK, &id);
        info!(pack = %id, "typing pack changed");
        self.session.pack = id;
        self.reset(prefs);
    }

    pub fn next_pack(&mut self, prefs: &mut dyn PreferenceStore) {
        if let Some(next) = self.corpus.next_pack_id(&self.session.pack).map(str::to_string) {
            self.set_pack(&next, prefs);
        }
    }

    pub fn set_tier(&mut self, tier: LengthTier, prefs: &mut dyn PreferenceStore) {
        prefs.set(keys::TYPING_LENGTH, tier.as_str());
        info!(tier = tier.as_str(), "typing length changed");
        self.session.tier = tier;
        self.reset(prefs);
    }

    pub fn classify(&self) -> Vec<(char, CharClass)> {
        classify(self.session.target(), &self.session.typed)
    }

    pub fn focus(&self) -> Focus {
        focus(self.session.target(), self.session.typed_len())
    }

    pub fn pack_title(&self) -> &str {
        self.corpus
            .pack(&self.session.pack)
            .map_or("", |p| p.title.as_str())
    }
}

fn empty_prompt() -> Prompt {
    Prompt {
        text: String::new(),
        source: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::prefs::MemoryPrefStore;

    const PACK: &str = r#"
title = "Test"
subtitle = "Tester"

[texts]
short = ["one two three four five"]
medium = ["a b", "c d"]
"#;

    fn test_corpus() -> Corpus {
        Corpus::from_sources([("test", PACK)]).unwrap()
    }

    fn typing(prefs: &mut MemoryPrefStore) -> TypingTest {
        TypingTest::initialize(
            prefs,
            test_corpus(),
            TypingDefaults {
                pack: "test".to_string(),
                tier: LengthTier::Short,
            },
            PromptPicker::new(5),
        )
    }

    #[test]
    fn test_classify_marks_cursor_once() {
        let classes: Vec<CharClass> = classify("cat", "cb").into_iter().map(|(_, c)| c).collect();
        assert_eq!(
            classes,
            vec![CharClass::Matched, CharClass::Mismatched, CharClass::Cursor]
        );
        let classes: Vec<CharClass> = classify("abc", "").into_iter().map(|(_, c)| c).collect();
        assert_eq!(
            classes,
            vec![CharClass::Cursor, CharClass::Pending, CharClass::Pending]
        );
    }

    #[test]
    fn test_focus_word_and_letter() {
        let f = focus("hello brave world", 8);
        assert_eq!(f.word, "brave");
        assert_eq!(f.letter, "a");
        // On a space the word just finished is still in focus.
        let f = focus("hello brave", 5);
        assert_eq!(f.word, "hello");
        assert_eq!(f.letter, " ");
        let f = focus("hi", 2);
        assert_eq!(f.word, "hi");
        assert_eq!(f.letter, NO_FOCUS);
        let f = focus("", 0);
        assert_eq!(f.word, NO_FOCUS);
        assert_eq!(f.letter, NO_FOCUS);
    }

    #[test]
    fn test_first_char_starts_run() {
        let mut prefs = MemoryPrefStore::default();
        let mut t = typing(&mut prefs);
        assert_eq!(t.stage(), Stage::Idle);
        let now = Instant::now();
        t.type_char('o', now);
        assert_eq!(t.stage(), Stage::Running);
        assert_eq!(t.session.started_at, Some(now));
        assert_eq!(t.session.typed, "o");
    }

    #[test]
    fn test_empty_input_does_not_start() {
        let mut prefs = MemoryPrefStore::default();
        let mut t = typing(&mut prefs);
        t.on_input("", Instant::now());
        assert_eq!(t.stage(), Stage::Idle);
    }

    #[test]
    fn test_reaching_target_length_finishes() {
        let mut prefs = MemoryPrefStore::default();
        let mut t = typing(&mut prefs);
        let start = Instant::now();
        t.on_input("o", start);
        t.on_input("one two three four five", start + Duration::from_secs(30));
        assert_eq!(t.stage(), Stage::Done);
        let result = t.result.clone().unwrap();
        assert_eq!(result.wpm, 10);
        assert_eq!(result.accuracy, 100);
    }

    #[test]
    fn test_done_ignores_further_input() {
        let mut prefs = MemoryPrefStore::default();
        let mut t = typing(&mut prefs);
        let now = Instant::now();
        t.on_input("one two three four five", now);
        let before = t.result.clone();
        t.on_input("something else entirely here", now + Duration::from_secs(5));
        t.backspace(now + Duration::from_secs(6));
        assert_eq!(t.session.typed, "one two three four five");
        assert_eq!(t.result, before);
    }

    #[test]
    fn test_inactive_ignores_input() {
        let mut prefs = MemoryPrefStore::default();
        let mut t = typing(&mut prefs);
        let now = Instant::now();
        t.type_char('o', now);
        t.set_active(false);
        t.type_char('n', now);
        t.backspace(now);
        assert_eq!(t.session.typed, "o");

        t.reset(&mut prefs);
        t.start(now);
        t.on_input("o", now);
        assert_eq!(t.stage(), Stage::Idle);
        assert!(t.session.typed.is_empty());

        t.set_active(true);
        t.type_char('o', now);
        assert_eq!(t.stage(), Stage::Running);
    }

    #[test]
    fn test_backspace_edits_while_running() {
        let mut prefs = MemoryPrefStore::default();
        let mut t = typing(&mut prefs);
        let now = Instant::now();
        t.type_char('o', now);
        t.type_char('x', now);
        t.backspace(now);
        assert_eq!(t.session.typed, "o");
        assert_eq!(t.stage(), Stage::Running);
    }

    #[test]
    fn test_set_tier_persists_and_resets() {
        let mut prefs = MemoryPrefStore::default();
        let mut t = typing(&mut prefs);
        t.type_char('o', Instant::now());
        t.set_tier(LengthTier::Medium, &mut prefs);
        assert_eq!(prefs.get(keys::TYPING_LENGTH).as_deref(), Some("medium"));
        assert_eq!(t.stage(), Stage::Idle);
        assert!(t.session.typed.is_empty());
        assert!(["a b", "c d"].contains(&t.session.target()));
    }

    #[test]
    fn test_reset_records_last_prompt() {
        let mut prefs = MemoryPrefStore::default();
        let t = typing(&mut prefs);
        assert_eq!(
            prefs.get(&keys::last_prompt("test", "short")).as_deref(),
            Some(t.session.target())
        );
    }

    #[test]
    fn test_initialize_restores_persisted_selection() {
        let mut prefs = MemoryPrefStore::default();
        prefs.set(keys::TYPING_PACK, "test");
        prefs.set(keys::TYPING_LENGTH, "medium");
        let t = typing(&mut prefs);
        assert_eq!(t.session.tier, LengthTier::Medium);
        assert_eq!(t.pack_title(), "Test");
    }

    #[test]
    fn test_unknown_persisted_pack_falls_back() {
        let mut prefs = MemoryPrefStore::default();
        prefs.set(keys::TYPING_PACK, "gone");
        let t = typing(&mut prefs);
        assert_eq!(t.session.pack, "test");
    }

    #[test]
    fn test_retry_returns_to_idle() {
        let mut prefs = MemoryPrefStore::default();
        let mut t = typing(&mut prefs);
        t.on_input("one two three four five", Instant::now());
        t.retry(&mut prefs);
        assert_eq!(t.stage(), Stage::Idle);
        assert!(t.result.is_none());
        assert!(t.session.started_at.is_none());
    }
}
