//! Sentence tokenization.
//!
//! A sentence is split on Unicode whitespace into words. Indices are
//! zero-based and follow input order; the token list never changes once
//! built.

use serde::{Deserialize, Serialize};

use crate::error::TrialError;

/// One whitespace-delimited token of a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// Zero-based position in the sentence.
    pub index: usize,
    /// Token text, punctuation included.
    pub text: String,
}

/// An immutable, ordered sequence of words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    text: String,
    words: Vec<Word>,
}

impl Sentence {
    /// Tokenizes `text` on whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`TrialError::EmptySentence`] if `text` contains no words.
    pub fn parse(text: &str) -> Result<Self, TrialError> {
        let words: Vec<Word> = text
            .split_whitespace()
            .enumerate()
            .map(|(index, token)| Word {
                index,
                text: token.to_owned(),
            })
            .collect();

        if words.is_empty() {
            return Err(TrialError::EmptySentence);
        }

        Ok(Self {
            text: text.trim().to_owned(),
            words,
        })
    }

    /// Returns the trimmed source text, shown as continuous text on the
    /// upper layer.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the words in order.
    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Returns the number of words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false`; a parsed sentence has at least one word.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns the word at `index`.
    #[must_use]
    pub fn word(&self, index: usize) -> Option<&Word> {
        self.words.get(index)
    }
}
