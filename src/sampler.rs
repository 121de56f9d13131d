use rand::Rng;
use std::collections::HashMap;
use tracing::warn;

/// Tunables for error-weighted sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerParams {
    /// Weight every valid word starts from.
    pub base_weight: f64,
    /// Multiplier applied to the summed per-character error rates.
    pub error_scale: f64,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            base_weight: 1.0,
            error_scale: 10.0,
        }
    }
}

/// How draws are made once the population has been weighed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Cumulative-weight selection over a positive, finite total weight.
    Weighted,
    /// Every valid word equally likely. Entered whenever the total weight
    /// comes out zero, negative or non-finite, so a draw always succeeds.
    Uniform,
}

/// A weighed population ready to be drawn from.
///
/// Building the plan is total: degenerate inputs land in the uniform mode
/// instead of failing, and blank population entries are dropped up front.
#[derive(Debug, Clone)]
pub struct SamplePlan {
    words: Vec<String>,
    cumulative: Vec<f64>,
    total_weight: f64,
    mode: SamplingMode,
}

impl SamplePlan {
    /// Weigh `population` against `rates`.
    pub fn build(population: &[String], rates: &HashMap<char, f64>, params: SamplerParams) -> Self {
        let base = if params.base_weight < 0.0 {
            warn!(
                "negative base weight {} treated as zero",
                params.base_weight
            );
            0.0
        } else {
            params.base_weight
        };
        let rates = normalize_rates(rates);

        let mut words = Vec::new();
        let mut cumulative = Vec::new();
        let mut total_weight = 0.0;

        for word in population {
            if word.trim().is_empty() {
                continue;
            }
            total_weight += weigh(word, &rates, base, params.error_scale);
            words.push(word.clone());
            cumulative.push(total_weight);
        }

        let mode = if total_weight.is_finite() && total_weight > 0.0 {
            SamplingMode::Weighted
        } else {
            if !words.is_empty() {
                warn!(
                    "total weight {} is not positive, falling back to uniform sampling",
                    total_weight
                );
            }
            SamplingMode::Uniform
        };

        Self {
            words,
            cumulative,
            total_weight,
            mode,
        }
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Number of valid words in the plan.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Draw up to `count` words with replacement using the supplied random
    /// source. The same word may appear several times in one call.
    pub fn draw_with<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<String> {
        if self.words.is_empty() {
            return Vec::new();
        }

        let draws = count.min(self.words.len());
        let mut picked = Vec::with_capacity(draws);

        for _ in 0..draws {
            let index = match self.mode {
                SamplingMode::Weighted => {
                    let target = rng.gen_range(0.0..self.total_weight);
                    // First cumulative entry >= target; the clamp covers the
                    // edge where float error pushes the scan past the end.
                    self.cumulative
                        .partition_point(|&bound| bound < target)
                        .min(self.words.len() - 1)
                }
                SamplingMode::Uniform => rng.gen_range(0..self.words.len()),
            };
            picked.push(self.words[index].clone());
        }

        picked
    }

    /// Draw with the thread-local random source.
    pub fn draw(&self, count: usize) -> Vec<String> {
        self.draw_with(count, &mut rand::thread_rng())
    }
}

/// Weight of a single word under the given rates and tunables.
///
/// Additive over every character of the lowercased word and clamped to
/// zero at the word level, never per character.
pub fn word_weight(word: &str, rates: &HashMap<char, f64>, params: SamplerParams) -> f64 {
    weigh(
        word,
        &normalize_rates(rates),
        params.base_weight.max(0.0),
        params.error_scale,
    )
}

/// Sample `count` practice words from `population`, biased toward the
/// characters with the highest error rates. Degenerate inputs yield an
/// empty or uniformly drawn result, never an error.
pub fn sample_words(
    population: &[String],
    rates: &HashMap<char, f64>,
    count: usize,
    params: SamplerParams,
) -> Vec<String> {
    SamplePlan::build(population, rates, params).draw(count)
}

/// Deterministic variant of [`sample_words`] taking a caller-owned random
/// source, for seeded draws.
pub fn sample_words_with<R: Rng + ?Sized>(
    population: &[String],
    rates: &HashMap<char, f64>,
    count: usize,
    params: SamplerParams,
    rng: &mut R,
) -> Vec<String> {
    SamplePlan::build(population, rates, params).draw_with(count, rng)
}

fn weigh(word: &str, rates: &HashMap<char, f64>, base: f64, scale: f64) -> f64 {
    let mut rate_sum = 0.0;
    for ch in word.chars() {
        let lower = ch.to_lowercase().next().unwrap_or(ch);
        if let Some(rate) = rates.get(&lower) {
            rate_sum += rate;
        }
    }
    (base + scale * rate_sum).max(0.0)
}

/// Lowercase the rate keys and drop entries that cannot contribute.
fn normalize_rates(rates: &HashMap<char, f64>) -> HashMap<char, f64> {
    let mut normalized = HashMap::with_capacity(rates.len());
    for (&letter, &rate) in rates {
        if !rate.is_finite() || rate <= 0.0 {
            continue;
        }
        let lower = letter.to_lowercase().next().unwrap_or(letter);
        let entry = normalized.entry(lower).or_insert(rate);
        if rate > *entry {
            *entry = rate;
        }
    }
    normalized
}
