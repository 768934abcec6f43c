//! Emoji detection over plain text.
//!
//! Detection is a single character class over the Unicode blocks that hold
//! pictographs, plus the joiners and selectors used to compose sequences.
//! Every matched code point counts on its own, so a ZWJ family or a skin-tone
//! modified hand counts as several emojis.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const EMOJI_CLASS: &str = concat!(
    "[",
    "\u{1F600}-\u{1F64F}", // emoticons
    "\u{1F300}-\u{1F5FF}", // symbols & pictographs
    "\u{1F680}-\u{1F6FF}", // transport & map
    "\u{1F1E0}-\u{1F1FF}", // regional indicators
    "\u{2600}-\u{26FF}",   // misc symbols
    "\u{2700}-\u{27BF}",   // dingbats
    "\u{1F900}-\u{1F9FF}", // supplemental symbols
    "\u{1FA00}-\u{1FA6F}", // chess
    "\u{1FA70}-\u{1FAFF}", // extended-A
    "\u{1F004}",
    "\u{1F0CF}",
    "\u{1F170}-\u{1F251}", // enclosed alphanumerics
    "\u{E0020}-\u{E007F}", // tags
    "\u{200D}",
    "\u{FE0F}",
    "]",
);

fn emoji_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(EMOJI_CLASS).expect("emoji character class is valid"))
}

/// Result of scanning a text for emojis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmojiAnalysis {
    /// Number of matched code points.
    pub count: usize,
    /// Distinct matches in first-seen order.
    pub unique: Vec<String>,
    pub has_emojis: bool,
    /// Input with every match removed and the ends trimmed.
    pub clean_text: String,
}

impl EmojiAnalysis {
    /// Distinct emojis not covered by `allowed`.
    pub fn disallowed(&self, allowed: &[String]) -> Vec<String> {
        self.unique
            .iter()
            .filter(|emoji| !is_emoji_allowed(emoji, allowed))
            .cloned()
            .collect()
    }
}

/// Scan `text` and summarize its emojis.
///
/// # Returns
/// Counts, distinct matches, and the cleaned text. Empty input yields an
/// empty analysis.
pub fn analyze(text: &str) -> EmojiAnalysis {
    let all = extract_emojis(text);
    let mut seen = HashSet::new();
    let unique = all
        .iter()
        .filter(|emoji| seen.insert(emoji.as_str()))
        .cloned()
        .collect();
    EmojiAnalysis {
        count: all.len(),
        unique,
        has_emojis: !all.is_empty(),
        clean_text: remove_emojis(text),
    }
}

pub fn contains_emoji(text: &str) -> bool {
    emoji_regex().is_match(text)
}

/// Every match in order of appearance, duplicates included.
pub fn extract_emojis(text: &str) -> Vec<String> {
    emoji_regex()
        .find_iter(text)
        .map(|found| found.as_str().to_string())
        .collect()
}

pub fn count_emojis(text: &str) -> usize {
    emoji_regex().find_iter(text).count()
}

/// Strip all matches, then trim leading and trailing whitespace only.
pub fn remove_emojis(text: &str) -> String {
    emoji_regex().replace_all(text, "").trim().to_string()
}

pub fn is_emoji_allowed(emoji: &str, allowed: &[String]) -> bool {
    allowed.iter().any(|candidate| candidate == emoji)
}
