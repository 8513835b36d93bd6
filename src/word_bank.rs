use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::samples::read_corpus_file;

#[derive(Deserialize, Clone, Debug)]
struct WordFile {
    words: Vec<String>,
}

/// Static list of words the arcade spawns from
#[derive(Debug, Clone)]
pub struct WordBank {
    words: Vec<String>,
}

impl WordBank {
    pub fn embedded() -> Result<Self> {
        let file: WordFile = read_corpus_file("arcade.json")?;
        Self::new(file.words)
    }

    /// Blank entries are dropped; at least one word must remain.
    pub fn new<S: Into<String>>(words: impl IntoIterator<Item = S>) -> Result<Self> {
        let words: Vec<String> = words
            .into_iter()
            .map(Into::into)
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Err(Error::Corpus {
                message: "word bank is empty".to_string(),
            });
        }

        Ok(Self { words })
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        self.words
            .choose(rng)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }
}
