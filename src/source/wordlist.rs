use crate::error::Result;
use crate::source::dictionary::Dictionary;
use crate::source::{suggestions, tokenizer, SpellSource, Token};
use std::path::Path;

/// A SpellSource backed by a single word list. The language argument is
/// accepted but not used: one list serves every language.
pub struct WordListSource {
    dictionary: Dictionary,
    max_suggestions: usize,
}

impl WordListSource {
    pub fn new(dictionary: Dictionary) -> Self {
        Self {
            dictionary,
            max_suggestions: 5,
        }
    }

    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(Dictionary::from_words(words)?))
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(Dictionary::load_from_path(path)?))
    }

    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self
    }
}

impl SpellSource for WordListSource {
    fn tokenize(&self, text: &str, _language: &str) -> Vec<Token> {
        tokenizer::words(text)
            .into_iter()
            .map(|(start, word)| Token::new(word, start, self.dictionary.contains(word)))
            .collect()
    }

    fn suggest(&self, word: &str, _language: &str) -> Vec<String> {
        suggestions::generate(word, &self.dictionary, self.max_suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_carry_validity() {
        let source = WordListSource::from_words(["there", "is", "here"]).unwrap();
        let tokens = source.tokenize("There is a missstake here", "en_US");
        let invalid: Vec<_> = tokens.iter().filter(|t| !t.valid).collect();
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].word, "missstake");
        assert_eq!((invalid[0].start, invalid[0].end), (11, 20));
    }
}
