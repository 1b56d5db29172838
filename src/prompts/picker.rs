use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::debug;

use super::{Corpus, LengthTier, Prompt};

pub const DEFAULT_REPEAT_ATTEMPTS: u32 = 5;

/// Uniform prompt selection that tries not to show the same prompt twice in a
/// row. Rejection is bounded, so a repeat is still possible.
pub struct PromptPicker {
    rng: SmallRng,
    attempts: u32,
}

impl PromptPicker {
    pub fn new(attempts: u32) -> Self {
        Self::with_rng(SmallRng::from_entropy(), attempts)
    }

    pub fn with_rng(rng: SmallRng, attempts: u32) -> Self {
        Self {
            rng,
            attempts: attempts.max(1),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Pick a prompt from `pack`/`tier`, avoiding `last` when the tier has more
    /// than one entry. An empty tier yields an empty prompt.
    pub fn pick(
        &mut self,
        corpus: &Corpus,
        pack: &str,
        tier: LengthTier,
        last: Option<&str>,
    ) -> Prompt {
        let prompts = corpus.prompts(pack, tier);
        self.pick_from(prompts, last)
    }

    pub fn pick_from(&mut self, prompts: &[Prompt], last: Option<&str>) -> Prompt {
        let Some(first) = prompts.first() else {
            return Prompt {
                text: String::new(),
                source: String::new(),
            };
        };
        if prompts.len() == 1 {
            return first.clone();
        }

        let mut choice = &prompts[self.rng.gen_range(0..prompts.len())];
        for _ in 1..self.attempts {
            if last != Some(choice.text.as_str()) {
                break;
            }
            choice = &prompts[self.rng.gen_range(0..prompts.len())];
        }
        if last == Some(choice.text.as_str()) {
            debug!(attempts = self.attempts, "prompt repeated after bounded retries");
        }
        choice.clone()
    }
}

impl Default for PromptPicker {
    fn default() -> Self {
        Self::new(DEFAULT_REPEAT_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(text: &str) -> Prompt {
        Prompt {
            text: text.to_string(),
            source: String::new(),
        }
    }

    #[test]
    fn test_empty_list_gives_empty_prompt() {
        let mut picker = PromptPicker::with_rng(SmallRng::seed_from_u64(1), 5);
        assert!(picker.pick_from(&[], None).text.is_empty());
    }

    #[test]
    fn test_single_entry_is_always_returned() {
        let mut picker = PromptPicker::with_rng(SmallRng::seed_from_u64(1), 5);
        let only = [prompt("only")];
        assert_eq!(picker.pick_from(&only, Some("only")).text, "only");
    }

    #[test]
    fn test_two_entries_rarely_repeat() {
        let prompts = [prompt("first"), prompt("second")];
        let mut repeats = 0;
        for seed in 0..200 {
            let mut picker = PromptPicker::with_rng(SmallRng::seed_from_u64(seed), 5);
            if picker.pick_from(&prompts, Some("first")).text == "first" {
                repeats += 1;
            }
        }
        // Five draws all landing on the last prompt is a 1-in-32 event.
        assert!(repeats < 30, "{repeats} repeats");
    }

    #[test]
    fn test_single_attempt_is_plain_uniform_draw() {
        let prompts = [prompt("first"), prompt("second")];
        let mut seen_first = false;
        for seed in 0..50 {
            let mut picker = PromptPicker::with_rng(SmallRng::seed_from_u64(seed), 1);
            seen_first |= picker.pick_from(&prompts, Some("first")).text == "first";
        }
        assert!(seen_first);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let picker = PromptPicker::with_rng(SmallRng::seed_from_u64(1), 0);
        assert_eq!(picker.attempts(), 1);
    }

    #[test]
    fn test_pick_from_bundled_corpus_is_non_empty() {
        let corpus = Corpus::load();
        let mut picker = PromptPicker::default();
        for tier in LengthTier::ALL {
            let p = picker.pick(&corpus, "bourdain", tier, None);
            assert!(!p.text.is_empty());
        }
    }
}
