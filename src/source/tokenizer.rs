use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

lazy_static! {
    // URLs, emails and long hex hashes are never words
    static ref NOT_PROSE: Regex = Regex::new(
        r"https?://\S+|[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}|\b[a-fA-F0-9]{32,}\b"
    )
    .unwrap();
}

/// Extract checkable words from `text` as `(byte offset, word)` pairs, in
/// order of appearance.
pub fn words(text: &str) -> Vec<(usize, &str)> {
    let skipped: Vec<Range<usize>> = NOT_PROSE.find_iter(text).map(|m| m.range()).collect();
    let in_skipped = |offset: usize| skipped.iter().any(|r| r.contains(&offset));

    let mut result = Vec::new();
    for (offset, segment) in text.split_word_bound_indices() {
        if !segment.chars().any(char::is_alphabetic) || in_skipped(offset) {
            continue;
        }
        for (inner, part) in split_compound_word(segment) {
            if part.chars().count() <= 1 || is_acronym(part) {
                continue;
            }
            result.push((offset + inner, part));
        }
    }
    result
}

/// Split `camelCase`, `snake_case` and `kebab-case` words into their parts,
/// keeping each part's byte offset inside `word`.
pub fn split_compound_word(word: &str) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut prev_lower = false;

    for (i, ch) in word.char_indices() {
        let is_word_char = ch.is_alphabetic() || ch == '\'';
        if !is_word_char {
            if let Some(s) = start.take() {
                parts.push((s, &word[s..i]));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower {
            if let Some(s) = start {
                parts.push((s, &word[s..i]));
            }
            start = Some(i);
        } else if start.is_none() {
            start = Some(i);
        }
        prev_lower = ch.is_lowercase();
    }
    if let Some(s) = start {
        parts.push((s, &word[s..]));
    }

    parts
        .into_iter()
        .map(|(s, part)| {
            let trimmed = part.trim_matches('\'');
            let lead = part.len() - part.trim_start_matches('\'').len();
            (s + lead, trimmed)
        })
        .filter(|(_, part)| !part.is_empty())
        .collect()
}

fn is_acronym(word: &str) -> bool {
    word.chars().all(|c| c.is_uppercase() || !c.is_alphabetic())
}
