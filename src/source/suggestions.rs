use crate::source::dictionary::Dictionary;

/// Rank replacement candidates for `word` by edit distance, best first.
pub fn generate(word: &str, dictionary: &Dictionary, max_suggestions: usize) -> Vec<String> {
    let lower = word.to_lowercase();
    let chars: Vec<char> = lower.chars().collect();
    let mut suggestions: Vec<(usize, String)> = Vec::new();

    let push = |candidate: String, distance: usize, suggestions: &mut Vec<(usize, String)>| {
        if candidate != lower && !suggestions.iter().any(|(_, s)| *s == candidate) {
            suggestions.push((distance, candidate));
        }
    };

    // 1. Words sharing a three letter prefix (cheap with an FST)
    if chars.len() >= 3 {
        let prefix: String = chars[..3].iter().collect();
        for candidate in dictionary.words_with_prefix(&prefix) {
            let distance = edit_distance(&lower, &candidate);
            if distance <= 2 {
                push(candidate, distance, &mut suggestions);
            }
        }
    }

    // 2. Single edits: deletions, transpositions and common typos
    for transform in generate_transformations(&lower) {
        if dictionary.contains(&transform) {
            let distance = edit_distance(&lower, &transform);
            push(transform, distance, &mut suggestions);
        }
    }

    // 3. Shorter prefix, looser distance
    if suggestions.len() < max_suggestions && chars.len() >= 2 {
        let prefix: String = chars[..2].iter().collect();
        for candidate in dictionary.words_with_prefix(&prefix) {
            let distance = edit_distance(&lower, &candidate);
            if distance <= 3 {
                push(candidate, distance, &mut suggestions);
            }
        }
    }

    // 4. Full scan, only for very short words
    if suggestions.len() < max_suggestions && chars.len() <= 3 {
        for candidate in dictionary.all_words() {
            let len_diff = candidate.chars().count().abs_diff(chars.len());
            if len_diff > 1 {
                continue;
            }
            let distance = edit_distance(&lower, &candidate);
            if distance <= 2 {
                push(candidate, distance, &mut suggestions);
            }
        }
    }

    suggestions.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.cmp(b)));
    suggestions
        .into_iter()
        .take(max_suggestions)
        .map(|(_, s)| match_case(word, s))
        .collect()
}

/// Keep a leading capital from the misspelled word.
fn match_case(original: &str, suggestion: String) -> String {
    let starts_upper = original.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return suggestion;
    }
    let mut chars = suggestion.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => suggestion,
    }
}

/// Levenshtein distance over chars
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = if a_char == b_char { 0 } else { 1 };
            current[j + 1] = (prev[j + 1] + 1) // deletion
                .min(current[j] + 1) // insertion
                .min(prev[j] + cost); // substitution
        }
        std::mem::swap(&mut prev, &mut current);
    }

    prev[b_chars.len()]
}

fn generate_transformations(word: &str) -> Vec<String> {
    let mut transformations = Vec::new();
    let chars: Vec<char> = word.chars().collect();

    // Deletions
    for i in 0..chars.len() {
        let mut new_word = chars.clone();
        new_word.remove(i);
        transformations.push(new_word.iter().collect());
    }

    // Transpositions (swap adjacent)
    for i in 0..chars.len().saturating_sub(1) {
        let mut new_word = chars.clone();
        new_word.swap(i, i + 1);
        transformations.push(new_word.iter().collect());
    }

    // Replacements (common typos)
    let common_replacements = [
        ('a', 'e'),
        ('e', 'i'),
        ('i', 'o'),
        ('o', 'u'),
        ('b', 'v'),
        ('c', 'k'),
        ('f', 'v'),
        ('g', 'j'),
        ('m', 'n'),
        ('s', 'z'),
        ('t', 'd'),
    ];

    for (i, &ch) in chars.iter().enumerate() {
        for &(from, to) in &common_replacements {
            if ch == from {
                let mut new_word = chars.clone();
                new_word[i] = to;
                transformations.push(new_word.iter().collect());
            }
        }
    }

    transformations
}
