//! English word list used by the `is-english` lookup.
//!
//! The lexicon file holds one word per line. Blank lines and lines starting
//! with `#` are skipped. Lookups are case-insensitive and ignore surrounding
//! whitespace.

use crate::error::{Result, StoreError};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

/// Set of known English words.
#[derive(Debug, Default, Clone)]
pub struct EnglishLexicon {
    words: HashSet<String>,
}

impl EnglishLexicon {
    /// Creates an empty lexicon. Every lookup against it returns `false`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a lexicon from a newline-separated word list.
    ///
    /// A missing file yields an empty lexicon and a warning.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(
                    "No English lexicon at {}, is-english lookups will return false",
                    path.display()
                );
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let lexicon: Self = text.lines().collect();
        tracing::info!(
            "Loaded English lexicon from {} ({} words)",
            path.display(),
            lexicon.len()
        );
        Ok(lexicon)
    }

    /// Adds a word. Returns `false` for blank and `#` comment lines.
    pub fn insert(&mut self, word: &str) -> bool {
        let word = word.trim();
        if word.is_empty() || word.starts_with('#') {
            return false;
        }
        self.words.insert(word.to_lowercase());
        true
    }

    /// Whether `word` is a known English word.
    pub fn contains(&self, word: &str) -> bool {
        let word = word.trim();
        !word.is_empty() && self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for EnglishLexicon {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut lexicon = Self::new();
        for word in iter {
            lexicon.insert(word);
        }
        lexicon
    }
}
