use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Letters tracked by the per-letter accuracy aggregation.
pub const ALPHABET: [char; 26] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Attempt counters for a single letter. `correct` never exceeds `total`
/// as long as folded deltas are well-formed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterStat {
    pub total: u64,
    pub correct: u64,
}

impl LetterStat {
    pub fn new(total: u64, correct: u64) -> Self {
        Self { total, correct }
    }

    /// Accuracy percentage for this letter, `None` before any attempt.
    pub fn accuracy(&self) -> Option<f64> {
        match self.total {
            0 => None,
            total => Some(self.correct as f64 / total as f64 * 100.0),
        }
    }
}

/// Running per-letter totals across a practice session.
///
/// Every tracked letter starts at zero so hosts can render the full
/// alphabet before the first keystroke arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterTotals {
    counts: HashMap<char, LetterStat>,
}

impl LetterTotals {
    pub fn new() -> Self {
        let counts = ALPHABET
            .iter()
            .map(|&letter| (letter, LetterStat::default()))
            .collect();
        Self { counts }
    }

    /// Merge a per-letter delta additively into the running totals.
    pub fn fold(&mut self, delta: &HashMap<char, LetterStat>) {
        for (&letter, stat) in delta {
            let entry = self.counts.entry(letter.to_ascii_lowercase()).or_default();
            entry.total += stat.total;
            entry.correct += stat.correct;
        }
    }

    pub fn get(&self, letter: char) -> Option<&LetterStat> {
        self.counts.get(&letter.to_ascii_lowercase())
    }

    /// Session-wide accuracy percentage; 100 before any attempt.
    pub fn overall_accuracy(&self) -> f64 {
        let total: u64 = self.counts.values().map(|stat| stat.total).sum();
        if total == 0 {
            return 100.0;
        }
        let correct: u64 = self.counts.values().map(|stat| stat.correct).sum();
        correct as f64 / total as f64 * 100.0
    }

    /// Miss frequency per attempted letter, shaped for the word sampler.
    pub fn error_rates(&self) -> HashMap<char, f64> {
        self.counts
            .iter()
            .filter(|(_, stat)| stat.total > 0)
            .map(|(&letter, stat)| {
                (letter, 1.0 - stat.correct as f64 / stat.total as f64)
            })
            .collect()
    }

    /// Letters and counters in alphabetical order.
    pub fn summary(&self) -> Vec<(char, LetterStat)> {
        self.counts
            .iter()
            .map(|(&letter, &stat)| (letter, stat))
            .sorted_by_key(|(letter, _)| *letter)
            .collect()
    }

    pub fn reset(&mut self) {
        for stat in self.counts.values_mut() {
            *stat = LetterStat::default();
        }
    }
}

impl Default for LetterTotals {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a letter's counters onto an `hsla` heat color for host UIs.
///
/// Fewer than six attempts stays a neutral gray. Above that, accuracy is
/// clamped to `[0, 100]`, floored at 80% and mapped linearly onto a
/// red-to-green hue range of `[0, 120]`.
pub fn heat_color(stat: &LetterStat) -> String {
    if stat.total <= 5 {
        return String::from("hsla(0, 0%, 55%, 0.8)");
    }

    let ratio = (stat.correct as f64 / stat.total as f64 * 100.0).clamp(0.0, 100.0);
    let effective = ratio.max(80.0);
    let hue = ((effective - 80.0) / 20.0 * 120.0).clamp(0.0, 120.0);

    format!("hsla({hue}, 70%, 75%, 0.8)")
}
