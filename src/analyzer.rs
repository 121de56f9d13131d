use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::letters::{LetterStat, LetterTotals};
use crate::trace::{KeystrokeTrace, Outcome};
use crate::util;

/// Cursor positions delimiting a chunk of typed text, end at or after start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkBounds {
    pub start: usize,
    pub end: usize,
}

/// Cumulative key counts bracketing a chunk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyCounters {
    pub total_keys: u64,
    pub keys_at_last_chunk: u64,
}

/// Elapsed-seconds timestamps bracketing a chunk.
///
/// The WPM division is kept literal, so the caller guards against handing
/// in equal timestamps (see `PracticeSession::complete_chunk`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkTiming {
    pub now_secs: f64,
    pub last_chunk_secs: f64,
}

/// Integer accuracy/WPM summary for one chunk. Accuracy can exceed 100 or
/// go negative when the host's counters are out of step with the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkReport {
    pub accuracy: i64,
    pub wpm: i64,
}

/// A chunk report plus the per-letter attempt deltas behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkAnalysis {
    pub report: ChunkReport,
    pub letter_delta: HashMap<char, LetterStat>,
}

/// Knobs for chunk analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Extra keys charged for a position whose most recent mark is wrong,
    /// approximating the backspace-and-retype cost still owed.
    pub miss_penalty_keys: i64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            miss_penalty_keys: 4,
        }
    }
}

/// Compute accuracy, WPM and per-letter deltas for one chunk.
///
/// Pure over its inputs. Scans the trace across `[start, end]` inclusive,
/// clamped so no index reaches past the last character of `text`; absent
/// trace entries are skipped. With no keys typed since the last chunk the
/// report short-circuits to zero and the delta stays empty.
pub fn analyze_chunk(
    trace: &KeystrokeTrace,
    text: &str,
    bounds: ChunkBounds,
    keys: KeyCounters,
    timing: ChunkTiming,
    config: &AnalyzerConfig,
) -> ChunkAnalysis {
    let mut key_delta = keys.total_keys as i64 - keys.keys_at_last_chunk as i64;
    let cursor_movement = bounds.end.saturating_sub(bounds.start) as i64;

    if key_delta == 0 {
        return ChunkAnalysis {
            report: ChunkReport { accuracy: 0, wpm: 0 },
            letter_delta: HashMap::new(),
        };
    }

    let chars: Vec<char> = text.chars().collect();
    let mut letter_delta: HashMap<char, LetterStat> = HashMap::new();

    if !chars.is_empty() {
        let hi = bounds.end.min(chars.len() - 1);
        for index in bounds.start..=hi {
            let Some(marks) = trace.at(index) else {
                continue;
            };
            if marks.is_empty() {
                continue;
            }

            let letter = chars[index].to_lowercase().next().unwrap_or(chars[index]);
            if letter.is_ascii_lowercase() {
                let entry = letter_delta.entry(letter).or_default();
                entry.total += marks.len() as u64;
                entry.correct += marks
                    .iter()
                    .filter(|mark| **mark == Outcome::Correct)
                    .count() as u64;
            }
            if marks.last() == Some(&Outcome::Incorrect) {
                key_delta += config.miss_penalty_keys;
            }
        }
    }

    let accuracy = (cursor_movement as f64 / key_delta as f64 * 100.0).floor() as i64;

    let span_end = bounds.end.min(chars.len());
    let span_start = bounds.start.min(span_end);
    let span: String = chars[span_start..span_end].iter().collect();
    let elapsed = timing.now_secs - timing.last_chunk_secs;
    let wpm = (util::word_count(&span) as f64 / elapsed * 60.0).floor() as i64;

    ChunkAnalysis {
        report: ChunkReport { accuracy, wpm },
        letter_delta,
    }
}

/// One computed chunk kept in session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub index: u64,
    pub bounds: ChunkBounds,
    pub report: ChunkReport,
    pub recorded_at: DateTime<Local>,
}

/// Owned per-session analytics: the running per-letter accumulator plus
/// the chunk history it was built from.
///
/// Hosts create one at session start and drop or reset it at session end;
/// chunk observations must be serialized by the single owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Analytics {
    totals: LetterTotals,
    chunks: Vec<ChunkRecord>,
}

impl Analytics {
    pub fn new() -> Self {
        Self {
            totals: LetterTotals::new(),
            chunks: Vec::new(),
        }
    }

    /// Fold a computed chunk into the running totals and history.
    pub fn observe(
        &mut self,
        bounds: ChunkBounds,
        analysis: &ChunkAnalysis,
        recorded_at: DateTime<Local>,
    ) {
        self.totals.fold(&analysis.letter_delta);
        self.chunks.push(ChunkRecord {
            index: self.chunks.len() as u64,
            bounds,
            report: analysis.report,
            recorded_at,
        });
    }

    pub fn totals(&self) -> &LetterTotals {
        &self.totals
    }

    pub fn chunks(&self) -> &[ChunkRecord] {
        &self.chunks
    }

    /// Session-wide accuracy percentage; 100 before any keystroke.
    pub fn overall_accuracy(&self) -> f64 {
        self.totals.overall_accuracy()
    }

    /// Per-letter miss rates, ready to bias the next sampling request.
    pub fn error_rates(&self) -> HashMap<char, f64> {
        self.totals.error_rates()
    }

    /// Chunk-over-chunk WPM values for host charts.
    pub fn wpm_series(&self) -> Vec<(u64, i64)> {
        self.chunks
            .iter()
            .map(|chunk| (chunk.index, chunk.report.wpm))
            .collect()
    }

    /// Spread of the chunk WPM values; `None` without history.
    pub fn wpm_std_dev(&self) -> Option<f64> {
        let wpms: Vec<f64> = self
            .chunks
            .iter()
            .map(|chunk| chunk.report.wpm as f64)
            .collect();
        util::std_dev(&wpms)
    }

    pub fn reset(&mut self) {
        self.totals.reset();
        self.chunks.clear();
    }
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace_from(entries: &[(usize, &[Outcome])]) -> KeystrokeTrace {
        let mut trace = KeystrokeTrace::new();
        for (index, marks) in entries {
            for mark in *marks {
                trace.record(*index, *mark);
            }
        }
        trace
    }

    fn timing(now: f64, last: f64) -> ChunkTiming {
        ChunkTiming {
            now_secs: now,
            last_chunk_secs: last,
        }
    }

    #[test]
    fn chunk_over_cat_matches_by_hand_arithmetic() {
        use Outcome::{Correct, Incorrect};
        let trace = trace_from(&[
            (0, &[Correct][..]),
            (1, &[Incorrect, Correct][..]),
            (2, &[Correct][..]),
        ]);
        let analysis = analyze_chunk(
            &trace,
            "cat",
            ChunkBounds { start: 0, end: 2 },
            KeyCounters {
                total_keys: 4,
                keys_at_last_chunk: 0,
            },
            timing(60.0, 0.0),
            &AnalyzerConfig::default(),
        );

        // Index 1 ends on a correct mark, so the key delta stays at 4.
        assert_eq!(analysis.report.accuracy, 50);
        assert_eq!(analysis.letter_delta[&'c'], LetterStat::new(1, 1));
        assert_eq!(analysis.letter_delta[&'a'], LetterStat::new(2, 1));
        assert_eq!(analysis.letter_delta[&'t'], LetterStat::new(1, 1));
    }

    #[test]
    fn zero_key_delta_short_circuits() {
        let trace = trace_from(&[(0, &[Outcome::Correct][..])]);
        let analysis = analyze_chunk(
            &trace,
            "cat",
            ChunkBounds { start: 0, end: 2 },
            KeyCounters {
                total_keys: 7,
                keys_at_last_chunk: 7,
            },
            timing(10.0, 5.0),
            &AnalyzerConfig::default(),
        );

        assert_eq!(analysis.report, ChunkReport { accuracy: 0, wpm: 0 });
        assert!(analysis.letter_delta.is_empty());
    }

    #[test]
    fn trailing_wrong_mark_inflates_the_key_delta() {
        use Outcome::{Correct, Incorrect};
        let trace = trace_from(&[(0, &[Correct][..]), (1, &[Incorrect][..])]);
        let analysis = analyze_chunk(
            &trace,
            "ca",
            ChunkBounds { start: 0, end: 2 },
            KeyCounters {
                total_keys: 2,
                keys_at_last_chunk: 0,
            },
            timing(2.0, 0.0),
            &AnalyzerConfig::default(),
        );

        // key delta 2 + 4 penalty -> floor(2/6*100)
        assert_eq!(analysis.report.accuracy, 33);
    }

    #[test]
    fn penalty_is_configurable() {
        use Outcome::Incorrect;
        let trace = trace_from(&[(0, &[Incorrect][..])]);
        let config = AnalyzerConfig {
            miss_penalty_keys: 0,
        };
        let analysis = analyze_chunk(
            &trace,
            "a",
            ChunkBounds { start: 0, end: 1 },
            KeyCounters {
                total_keys: 1,
                keys_at_last_chunk: 0,
            },
            timing(1.0, 0.0),
            &config,
        );

        assert_eq!(analysis.report.accuracy, 100);
    }

    #[test]
    fn penalty_applies_to_non_letter_positions_too() {
        use Outcome::{Correct, Incorrect};
        let trace = trace_from(&[(0, &[Correct][..]), (1, &[Incorrect][..])]);
        let analysis = analyze_chunk(
            &trace,
            "a b",
            ChunkBounds { start: 0, end: 2 },
            KeyCounters {
                total_keys: 2,
                keys_at_last_chunk: 0,
            },
            timing(3.0, 0.0),
            &AnalyzerConfig::default(),
        );

        // The space at index 1 contributes no letter stats but its trailing
        // wrong mark still costs the penalty.
        assert_eq!(analysis.report.accuracy, 33);
        assert_eq!(analysis.letter_delta.len(), 1);
        assert_eq!(analysis.letter_delta[&'a'], LetterStat::new(1, 1));
    }

    #[test]
    fn wpm_counts_words_over_elapsed_minutes() {
        use Outcome::Correct;
        let text = "the quick brown fox";
        let mut trace = KeystrokeTrace::new();
        for index in 0..text.len() {
            trace.record(index, Correct);
        }
        let analysis = analyze_chunk(
            &trace,
            text,
            ChunkBounds {
                start: 0,
                end: text.len(),
            },
            KeyCounters {
                total_keys: text.len() as u64,
                keys_at_last_chunk: 0,
            },
            timing(30.0, 0.0),
            &AnalyzerConfig::default(),
        );

        // 4 words in 30 seconds -> 8 wpm
        assert_eq!(analysis.report.wpm, 8);
        assert_eq!(analysis.report.accuracy, 100);
    }

    #[test]
    fn scan_clamps_to_the_text_end() {
        use Outcome::Correct;
        let trace = trace_from(&[(0, &[Correct][..]), (9, &[Correct][..])]);
        let analysis = analyze_chunk(
            &trace,
            "ab",
            ChunkBounds { start: 0, end: 9 },
            KeyCounters {
                total_keys: 2,
                keys_at_last_chunk: 0,
            },
            timing(1.0, 0.0),
            &AnalyzerConfig::default(),
        );

        // The mark at index 9 lies beyond "ab" and is never dereferenced.
        assert_eq!(analysis.letter_delta.len(), 1);
        assert_eq!(analysis.letter_delta[&'a'], LetterStat::new(1, 1));
    }

    #[test]
    fn accuracy_can_exceed_one_hundred() {
        use Outcome::Correct;
        let trace = trace_from(&[(0, &[Correct][..])]);
        let analysis = analyze_chunk(
            &trace,
            "abcde",
            ChunkBounds { start: 0, end: 5 },
            KeyCounters {
                total_keys: 2,
                keys_at_last_chunk: 0,
            },
            timing(1.0, 0.0),
            &AnalyzerConfig::default(),
        );

        assert_eq!(analysis.report.accuracy, 250);
    }

    #[test]
    fn empty_text_produces_no_letter_deltas() {
        let trace = trace_from(&[(0, &[Outcome::Correct][..])]);
        let analysis = analyze_chunk(
            &trace,
            "",
            ChunkBounds { start: 0, end: 0 },
            KeyCounters {
                total_keys: 1,
                keys_at_last_chunk: 0,
            },
            timing(1.0, 0.0),
            &AnalyzerConfig::default(),
        );

        assert!(analysis.letter_delta.is_empty());
        assert_eq!(analysis.report.accuracy, 0);
    }

    #[test]
    fn observe_folds_deltas_and_keeps_history() {
        let mut analytics = Analytics::new();
        let mut delta = HashMap::new();
        delta.insert('a', LetterStat::new(3, 2));
        let analysis = ChunkAnalysis {
            report: ChunkReport {
                accuracy: 66,
                wpm: 12,
            },
            letter_delta: delta,
        };

        let bounds = ChunkBounds { start: 0, end: 3 };
        analytics.observe(bounds, &analysis, Local::now());
        analytics.observe(bounds, &analysis, Local::now());

        assert_eq!(analytics.totals().get('a'), Some(&LetterStat::new(6, 4)));
        assert_eq!(analytics.chunks().len(), 2);
        assert_eq!(analytics.chunks()[1].index, 1);
        assert_eq!(analytics.wpm_series(), vec![(0, 12), (1, 12)]);
    }

    #[test]
    fn fold_order_does_not_matter() {
        let mut first = HashMap::new();
        first.insert('a', LetterStat::new(3, 1));
        first.insert('b', LetterStat::new(2, 2));
        let mut second = HashMap::new();
        second.insert('a', LetterStat::new(1, 1));
        second.insert('c', LetterStat::new(5, 4));

        let analysis_a = ChunkAnalysis {
            report: ChunkReport { accuracy: 0, wpm: 0 },
            letter_delta: first,
        };
        let analysis_b = ChunkAnalysis {
            report: ChunkReport { accuracy: 0, wpm: 0 },
            letter_delta: second,
        };
        let bounds = ChunkBounds { start: 0, end: 0 };

        let mut forward = Analytics::new();
        forward.observe(bounds, &analysis_a, Local::now());
        forward.observe(bounds, &analysis_b, Local::now());

        let mut backward = Analytics::new();
        backward.observe(bounds, &analysis_b, Local::now());
        backward.observe(bounds, &analysis_a, Local::now());

        assert_eq!(forward.totals(), backward.totals());
    }

    #[test]
    fn error_rates_feed_back_from_totals() {
        let mut analytics = Analytics::new();
        let mut delta = HashMap::new();
        delta.insert('z', LetterStat::new(4, 1));
        analytics.observe(
            ChunkBounds { start: 0, end: 4 },
            &ChunkAnalysis {
                report: ChunkReport {
                    accuracy: 100,
                    wpm: 30,
                },
                letter_delta: delta,
            },
            Local::now(),
        );

        let rates = analytics.error_rates();
        assert!((rates[&'z'] - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn wpm_std_dev_needs_history() {
        let mut analytics = Analytics::new();
        assert_eq!(analytics.wpm_std_dev(), None);

        for wpm in [10, 10, 10] {
            analytics.observe(
                ChunkBounds { start: 0, end: 0 },
                &ChunkAnalysis {
                    report: ChunkReport { accuracy: 0, wpm },
                    letter_delta: HashMap::new(),
                },
                Local::now(),
            );
        }

        assert_eq!(analytics.wpm_std_dev(), Some(0.0));
    }

    #[test]
    fn reset_clears_totals_and_history() {
        let mut analytics = Analytics::new();
        let mut delta = HashMap::new();
        delta.insert('q', LetterStat::new(2, 0));
        analytics.observe(
            ChunkBounds { start: 0, end: 2 },
            &ChunkAnalysis {
                report: ChunkReport { accuracy: 0, wpm: 0 },
                letter_delta: delta,
            },
            Local::now(),
        );

        analytics.reset();

        assert!(analytics.chunks().is_empty());
        assert_eq!(analytics.overall_accuracy(), 100.0);
    }
}
