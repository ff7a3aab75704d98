//! Bionic reading
//!
//! Clipboard text handed to the reader is shown with the leading half of each
//! word emphasised. This module only splits text; the desktop backend draws
//! the heads in bold.

use tracing::debug;

/// A word cut into its emphasised head and the remainder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BionicWord<'a> {
    pub head: &'a str,
    pub tail: &'a str,
}

/// Number of letters emphasised at the start of a word
pub fn head_letters(letters: usize) -> usize {
    match letters {
        0 => 0,
        1..=3 => 1,
        n => (n + 1) / 2,
    }
}

/// Split one whitespace-free word; punctuation rides along but is not counted
pub fn split_word(word: &str) -> BionicWord<'_> {
    let letters = word.chars().filter(|c| c.is_alphanumeric()).count();
    let mut wanted = head_letters(letters);
    let mut split = word.len();
    for (index, ch) in word.char_indices() {
        if wanted == 0 {
            split = index;
            break;
        }
        if ch.is_alphanumeric() {
            wanted -= 1;
        }
    }
    let (head, tail) = word.split_at(split);
    BionicWord { head, tail }
}

/// Text currently shown by a reader view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BionicReader {
    text: Option<String>,
}

impl BionicReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Replace the shown text; returns false when nothing changed
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text.as_deref() == Some(text) {
            return false;
        }
        debug!("Reader received {} characters", text.chars().count());
        self.text = Some(text.to_string());
        true
    }

    /// Paragraphs of split words, blank lines kept as empty paragraphs
    pub fn paragraphs(&self) -> Vec<Vec<BionicWord<'_>>> {
        let Some(ref text) = self.text else {
            return Vec::new();
        };
        text.lines()
            .map(|line| line.split_whitespace().map(split_word).collect())
            .collect()
    }
}
