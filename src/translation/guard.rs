/*!
 * Degenerate output detection.
 *
 * Translation models occasionally fall into a loop and emit the same phrase
 * over and over. The guard looks for a substring drawn from either half of
 * the text that recurs too often, and the caller falls back to the source
 * text when it fires.
 */

use serde::{Deserialize, Serialize};

/// How candidate substrings are matched against the text
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Occurrences must start and end on a word boundary
    #[default]
    WholeWord,
    /// Plain occurrences; parentheses are removed from the text first
    Substring,
}

/// Thresholds for the repeated-substring check
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GuardConfig {
    /// Minimum candidate length in characters
    #[serde(default = "default_min_pattern_len")]
    pub min_pattern_len: usize,

    /// Occurrences at which a candidate makes the text degenerate
    #[serde(default = "default_min_occurrences")]
    pub min_occurrences: usize,

    /// Matching mode
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            min_pattern_len: default_min_pattern_len(),
            min_occurrences: default_min_occurrences(),
            match_mode: MatchMode::default(),
        }
    }
}

fn default_min_pattern_len() -> usize {
    10
}

fn default_min_occurrences() -> usize {
    15
}

/// Detects pathological repetition in translated text
#[derive(Debug, Clone, Default)]
pub struct DegeneracyGuard {
    config: GuardConfig,
}

impl DegeneracyGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Whether `text` repeats a substring from its first or second half often
    /// enough to be considered a model failure.
    pub fn is_degenerate(&self, text: &str) -> bool {
        let text = match self.config.match_mode {
            MatchMode::WholeWord => text.to_string(),
            MatchMode::Substring => text.replace(['(', ')'], ""),
        };
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();
        let min_len = self.config.min_pattern_len.max(1);
        let half = n / 2;

        // Prefixes drawn from the first half
        for end in min_len..=half {
            if self.occurs_enough(&chars, &chars[..end]) {
                return true;
            }
        }

        // Substrings starting just past the middle
        let start = half + 1;
        for end in (start + min_len)..n {
            if self.occurs_enough(&chars, &chars[start..end]) {
                return true;
            }
        }

        false
    }

    /// Counts non-overlapping, leftmost-first occurrences of `pattern`,
    /// stopping as soon as the threshold is reached.
    fn occurs_enough(&self, text: &[char], pattern: &[char]) -> bool {
        let needed = self.config.min_occurrences.max(1);
        let whole_word = self.config.match_mode == MatchMode::WholeWord;
        let len = pattern.len();
        if len == 0 || len > text.len() {
            return false;
        }

        let mut count = 0;
        let mut pos = 0;
        while pos + len <= text.len() {
            if text[pos..pos + len] == *pattern
                && (!whole_word || on_word_boundaries(text, pos, pos + len))
            {
                count += 1;
                if count >= needed {
                    return true;
                }
                pos += len;
            } else {
                pos += 1;
            }
        }

        false
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether a word boundary sits at `at` (between `text[at-1]` and `text[at]`)
fn is_boundary(text: &[char], at: usize) -> bool {
    let before = at.checked_sub(1).and_then(|i| text.get(i)).is_some_and(|c| is_word_char(*c));
    let after = text.get(at).is_some_and(|c| is_word_char(*c));
    before != after
}

fn on_word_boundaries(text: &[char], start: usize, end: usize) -> bool {
    is_boundary(text, start) && is_boundary(text, end)
}
