use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;
use tracing::warn;

static WORDLIST_DIR: Dir = include_dir!("src/wordlists");

/// Difficulty tier of an embedded word population.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ValueEnum, Display, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Wire code used by the word-feed request body.
    pub fn code(self) -> i64 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    /// Map a wire code onto a tier; anything unknown falls back to easy.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Difficulty::Easy,
            1 => Difficulty::Medium,
            2 => Difficulty::Hard,
            _ => {
                warn!("unknown difficulty {}, defaulting to easy", code);
                Difficulty::Easy
            }
        }
    }
}

/// Failure to produce a word list from the embedded assets.
#[derive(Error, Debug)]
pub enum WordListError {
    #[error("word list asset {0} is missing")]
    Missing(String),
    #[error("word list asset {0} is not valid utf-8")]
    Encoding(String),
    #[error("word list asset failed to parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An embedded word population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordList {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl WordList {
    /// Load the embedded list for a difficulty tier.
    pub fn load(difficulty: Difficulty) -> Result<WordList, WordListError> {
        let file_name = format!("{}.json", difficulty.to_string().to_lowercase());
        let file = WORDLIST_DIR
            .get_file(&file_name)
            .ok_or_else(|| WordListError::Missing(file_name.clone()))?;
        let raw = file
            .contents_utf8()
            .ok_or(WordListError::Encoding(file_name))?;

        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tier_loads() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            let list = WordList::load(difficulty).unwrap();

            assert_eq!(list.name, difficulty.to_string().to_lowercase());
            assert_eq!(list.size as usize, list.words.len());
            assert!(!list.words.is_empty());
        }
    }

    #[test]
    fn embedded_words_are_usable_populations() {
        let list = WordList::load(Difficulty::Easy).unwrap();

        for word in &list.words {
            assert!(!word.trim().is_empty());
        }
    }

    #[test]
    fn tiers_round_trip_through_codes() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(Difficulty::from_code(difficulty.code()), difficulty);
        }
    }

    #[test]
    fn unknown_codes_fall_back_to_easy() {
        assert_eq!(Difficulty::from_code(7), Difficulty::Easy);
        assert_eq!(Difficulty::from_code(-1), Difficulty::Easy);
    }

    #[test]
    fn word_list_deserializes_from_json() {
        let raw = r#"{ "name": "tiny", "size": 2, "words": ["cat", "dog"] }"#;

        let list: WordList = serde_json::from_str(raw).unwrap();

        assert_eq!(list.name, "tiny");
        assert_eq!(list.size, 2);
        assert_eq!(list.words, vec!["cat", "dog"]);
    }
}
