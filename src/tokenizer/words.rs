// Word candidate extraction.
//
// A word is a run of word characters, or several runs joined by hyphens
// ("kansan-edustaja", "EU-maa"). A colon followed by word characters is an
// annotation suffix ("EU:n", "10:ssä") and is skipped rather than emitted.
// Text is case-folded before matching, so every candidate is lowercase.

use std::sync::LazyLock;

use regex::Regex;

static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Group 1 captures real words; the bare `:\w*` alternative consumes
    // annotations so their tail is never matched as a word.
    Regex::new(r"(\w+(?:-\w+)+|\w+)|:\w*").expect("word pattern is valid")
});

/// Extract lowercase word candidates from a paragraph, in order.
pub fn extract_words(paragraph: &str) -> Vec<String> {
    let lowered = paragraph.to_lowercase();
    WORD_PATTERN
        .captures_iter(&lowered)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|w| !w.is_empty())
        .collect()
}
