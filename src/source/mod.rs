pub mod dictionary;
pub mod suggestions;
pub mod tokenizer;
pub mod wordlist;

pub use wordlist::WordListSource;

/// One word of a buffer as seen by the spell checker. Offsets are byte
/// offsets into the buffer text, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub word: String,
    pub start: usize,
    pub end: usize,
    pub valid: bool,
}

impl Token {
    pub fn new(word: impl Into<String>, start: usize, valid: bool) -> Self {
        let word = word.into();
        let end = start + word.len();
        Self {
            word,
            start,
            end,
            valid,
        }
    }
}

/// The dictionary side of spell checking. Implementations hold no state
/// that depends on previous calls.
pub trait SpellSource {
    /// Tokenize `text` and flag each word as valid or not for `language`.
    fn tokenize(&self, text: &str, language: &str) -> Vec<Token>;

    /// Candidate replacements for `word`, best match first.
    fn suggest(&self, word: &str, language: &str) -> Vec<String>;
}

impl<S: SpellSource + ?Sized> SpellSource for Box<S> {
    fn tokenize(&self, text: &str, language: &str) -> Vec<Token> {
        (**self).tokenize(text, language)
    }

    fn suggest(&self, word: &str, language: &str) -> Vec<String> {
        (**self).suggest(word, language)
    }
}
