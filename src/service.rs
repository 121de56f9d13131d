use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::sampler::{self, SamplerParams};
use crate::wordlist::{Difficulty, WordList, WordListError};

/// Body of a word-feed request, as posted by a practice client.
///
/// Every field stays untyped here so that validation can follow the
/// boundary contract instead of serde's: wrong-typed tunables coerce to
/// their defaults, and only an unparseable body or an `errorRates` that
/// is an array or scalar is the 400 case.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WordFeedRequest {
    pub difficulty: Option<Value>,
    pub error_rates: Option<Value>,
    pub count: Option<Value>,
    pub base_weight: Option<Value>,
    pub scale: Option<Value>,
}

/// Body of a word-feed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFeedResponse {
    pub words: Vec<String>,
}

/// Boundary failures, tagged with the status code a transport should
/// surface.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid JSON data in request body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("invalid format for errorRates, expected an object")]
    InvalidErrorRates,
    #[error("word list for difficulty {0} is unavailable")]
    Unavailable(Difficulty, #[source] WordListError),
    #[error("word list for difficulty {0} is empty")]
    EmptyWordList(Difficulty),
}

impl ServiceError {
    /// Status code a transport layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::InvalidBody(_) | ServiceError::InvalidErrorRates => 400,
            ServiceError::Unavailable(..) | ServiceError::EmptyWordList(_) => 500,
        }
    }
}

/// In-process handler behind the word-feed endpoint contract.
///
/// Holds the three difficulty populations and the configured defaults;
/// hosts construct one up front and serve every request through it.
pub struct WordFeed {
    lists: [WordList; 3],
    defaults: Config,
}

impl WordFeed {
    /// Load the embedded word lists with default tunables.
    pub fn load() -> Result<Self, ServiceError> {
        Self::with_config(Config::default())
    }

    /// Load the embedded word lists with host-supplied tunables.
    pub fn with_config(config: Config) -> Result<Self, ServiceError> {
        let load = |difficulty: Difficulty| {
            WordList::load(difficulty).map_err(|e| ServiceError::Unavailable(difficulty, e))
        };

        Ok(Self {
            lists: [
                load(Difficulty::Easy)?,
                load(Difficulty::Medium)?,
                load(Difficulty::Hard)?,
            ],
            defaults: config,
        })
    }

    /// Handler over caller-supplied populations, for hosts with their own
    /// corpora and for tests.
    pub fn from_lists(easy: WordList, medium: WordList, hard: WordList, config: Config) -> Self {
        Self {
            lists: [easy, medium, hard],
            defaults: config,
        }
    }

    fn list(&self, difficulty: Difficulty) -> &WordList {
        &self.lists[difficulty.code() as usize]
    }

    /// Serve one raw request body with the thread-local random source.
    pub fn handle(&self, body: &str) -> Result<WordFeedResponse, ServiceError> {
        self.handle_with(body, &mut rand::thread_rng())
    }

    /// Deterministic variant of [`WordFeed::handle`] for seeded draws.
    pub fn handle_with<R: Rng + ?Sized>(
        &self,
        body: &str,
        rng: &mut R,
    ) -> Result<WordFeedResponse, ServiceError> {
        let request: WordFeedRequest = serde_json::from_str(body)?;

        let difficulty = coerce_difficulty(request.difficulty.as_ref());
        let list = self.list(difficulty);
        if list.words.is_empty() {
            return Err(ServiceError::EmptyWordList(difficulty));
        }

        let rates = parse_error_rates(request.error_rates.as_ref())?;
        let count = coerce_count(request.count.as_ref(), self.defaults.default_count);
        let params = SamplerParams {
            base_weight: coerce_number(
                request.base_weight.as_ref(),
                self.defaults.base_weight,
                "baseWeight",
            ),
            error_scale: coerce_number(request.scale.as_ref(), self.defaults.error_scale, "scale"),
        };

        info!(
            "feeding {} {} words from a population of {}",
            count,
            difficulty,
            list.words.len()
        );
        let words = sampler::sample_words_with(&list.words, &rates, count, params, rng);
        debug!("sampled {:?}", words);

        Ok(WordFeedResponse { words })
    }
}

/// Pull a per-letter rate map out of the raw request value.
///
/// Missing and null maps are empty. Arrays and scalars are the boundary's
/// 400 case. Within an object, keys longer than one character and values
/// that are not positive finite numbers are dropped.
fn parse_error_rates(raw: Option<&Value>) -> Result<HashMap<char, f64>, ServiceError> {
    let Some(value) = raw else {
        return Ok(HashMap::new());
    };

    match value {
        Value::Null => Ok(HashMap::new()),
        Value::Object(entries) => {
            let mut rates = HashMap::new();
            for (key, value) in entries {
                let Ok(letter) = key.chars().exactly_one() else {
                    continue;
                };
                let Some(rate) = value.as_f64() else {
                    continue;
                };
                if !rate.is_finite() || rate <= 0.0 {
                    continue;
                }
                let lower = letter.to_lowercase().next().unwrap_or(letter);
                let entry = rates.entry(lower).or_insert(rate);
                if rate > *entry {
                    *entry = rate;
                }
            }
            Ok(rates)
        }
        _ => Err(ServiceError::InvalidErrorRates),
    }
}

/// Pull a difficulty tier out of the raw request value.
///
/// A missing or null code means easy. Whole numbers go through the usual
/// code mapping; anything else is logged and served the easy tier, like
/// an unknown code.
fn coerce_difficulty(raw: Option<&Value>) -> Difficulty {
    match raw {
        None | Some(Value::Null) => Difficulty::Easy,
        Some(value) => match value.as_f64() {
            Some(code) if code.fract() == 0.0 => Difficulty::from_code(code as i64),
            _ => {
                warn!("non-integer difficulty {}, defaulting to easy", value);
                Difficulty::Easy
            }
        },
    }
}

/// Pull a sample count out of the raw request value.
///
/// Fractional counts truncate and negative counts clamp to zero draws.
/// Anything non-numeric is logged and falls back to `fallback`.
fn coerce_count(raw: Option<&Value>, fallback: usize) -> usize {
    match raw {
        None | Some(Value::Null) => fallback,
        Some(value) => match value.as_f64() {
            Some(count) => count.max(0.0) as usize,
            None => {
                warn!("non-numeric count {}, using {}", value, fallback);
                fallback
            }
        },
    }
}

/// Pull a sampler tunable out of the raw request value, falling back to
/// the configured default when it is not a number.
fn coerce_number(raw: Option<&Value>, fallback: f64, field: &str) -> f64 {
    match raw {
        None | Some(Value::Null) => fallback,
        Some(value) => match value.as_f64() {
            Some(number) => number,
            None => {
                warn!("non-numeric {} {}, using {}", field, value, fallback);
                fallback
            }
        },
    }
}
