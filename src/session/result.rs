use std::time::Instant;

/// Result of a finished checker session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckerOutcome {
    /// Every expected key was pressed at least once.
    Complete,
    /// Expected keys never pressed, in layout order.
    Missing(Vec<&'static str>),
}

impl CheckerOutcome {
    pub fn from_missing(missing: Vec<&'static str>) -> Self {
        if missing.is_empty() {
            CheckerOutcome::Complete
        } else {
            CheckerOutcome::Missing(missing)
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, CheckerOutcome::Complete)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypingResult {
    pub correct: usize,
    pub expected: usize,
    pub accuracy: u32,
    pub elapsed_minutes: f64,
    pub wpm: u32,
}

impl TypingResult {
    pub fn compute(
        target: &str,
        typed: &str,
        started_at: Option<Instant>,
        finished_at: Option<Instant>,
    ) -> Self {
        let correct = count_correct_chars(target, typed);
        let expected = target.chars().count();
        let minutes = elapsed_minutes(started_at, finished_at);
        Self {
            correct,
            expected,
            accuracy: accuracy(correct, expected),
            elapsed_minutes: minutes,
            wpm: wpm(count_words(typed), minutes),
        }
    }

    pub fn accuracy_line(&self) -> String {
        format!(
            "{}/{} characters = {}% accuracy",
            self.correct, self.expected, self.accuracy
        )
    }

    pub fn wpm_line(&self) -> String {
        format!(
            "Took {:.2} minute(s) = {} WPM",
            self.elapsed_minutes, self.wpm
        )
    }
}

/// Position-aligned equal characters over the shorter of the two strings.
pub fn count_correct_chars(target: &str, typed: &str) -> usize {
    target
        .chars()
        .zip(typed.chars())
        .filter(|(expected, actual)| expected == actual)
        .count()
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn accuracy(correct: usize, expected: usize) -> u32 {
    if expected == 0 {
        return 100;
    }
    (correct as f64 / expected as f64 * 100.0).round() as u32
}

pub fn elapsed_minutes(started_at: Option<Instant>, finished_at: Option<Instant>) -> f64 {
    match (started_at, finished_at) {
        (Some(start), Some(end)) => end
            .checked_duration_since(start)
            .map_or(0.0, |d| d.as_secs_f64() / 60.0),
        _ => 0.0,
    }
}

pub fn wpm(words: usize, minutes: f64) -> u32 {
    if minutes <= 0.0 || !minutes.is_finite() {
        return 0;
    }
    (words as f64 / minutes).round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_positional_match_count() {
        assert_eq!(count_correct_chars("cat", "cbt"), 2);
        assert_eq!(accuracy(2, 3), 67);
    }

    #[test]
    fn test_typed_longer_than_target_counts_overlap_only() {
        assert_eq!(count_correct_chars("ab", "abcdef"), 2);
        assert_eq!(count_correct_chars("abc", ""), 0);
    }

    #[test]
    fn test_empty_target_is_full_accuracy() {
        let result = TypingResult::compute("", "whatever", None, None);
        assert_eq!(result.accuracy, 100);
    }

    #[test]
    fn test_thirty_seconds_five_words() {
        let t = Instant::now();
        let result = TypingResult::compute(
            "one two three four five",
            "one two three four five",
            Some(t),
            Some(t + Duration::from_secs(30)),
        );
        assert!((result.elapsed_minutes - 0.5).abs() < 1e-9);
        assert_eq!(result.wpm, 10);
        assert_eq!(result.accuracy, 100);
    }

    #[test]
    fn test_wpm_zero_for_non_positive_elapsed() {
        let t = Instant::now();
        assert_eq!(elapsed_minutes(Some(t), Some(t)), 0.0);
        assert_eq!(elapsed_minutes(Some(t + Duration::from_secs(5)), Some(t)), 0.0);
        assert_eq!(elapsed_minutes(None, Some(t)), 0.0);
        assert_eq!(wpm(12, 0.0), 0);
        assert_eq!(wpm(12, -1.0), 0);
    }

    #[test]
    fn test_word_count_splits_on_whitespace_runs() {
        assert_eq!(count_words("  hello \t world\n"), 2);
        assert_eq!(count_words("   "), 0);
    }

    #[test]
    fn test_result_lines() {
        let result = TypingResult {
            correct: 2,
            expected: 3,
            accuracy: 67,
            elapsed_minutes: 0.5,
            wpm: 10,
        };
        assert_eq!(result.accuracy_line(), "2/3 characters = 67% accuracy");
        assert_eq!(result.wpm_line(), "Took 0.50 minute(s) = 10 WPM");
    }

    #[test]
    fn test_outcome_from_missing() {
        assert!(CheckerOutcome::from_missing(vec![]).is_complete());
        assert_eq!(
            CheckerOutcome::from_missing(vec!["KeyZ"]),
            CheckerOutcome::Missing(vec!["KeyZ"])
        );
    }
}
