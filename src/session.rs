use std::time::{Duration, SystemTime};

use chrono::Local;

use crate::analyzer::{
    self, Analytics, AnalyzerConfig, ChunkAnalysis, ChunkBounds, ChunkTiming, KeyCounters,
};
use crate::runtime::SessionEvent;
use crate::trace::{KeystrokeTrace, Outcome};

/// Seconds counter that stands still while the user is idle.
///
/// Driven by 1 Hz host ticks; a tick only counts when the last interaction
/// happened within the idle cutoff, so WPM reflects active typing time.
#[derive(Debug, Clone)]
pub struct SessionClock {
    elapsed_secs: u64,
    last_interaction: Option<SystemTime>,
    idle_cutoff: Duration,
}

impl SessionClock {
    pub fn new(idle_cutoff: Duration) -> Self {
        Self {
            elapsed_secs: 0,
            last_interaction: None,
            idle_cutoff,
        }
    }

    /// Note user activity at `now`.
    pub fn touch_at(&mut self, now: SystemTime) {
        self.last_interaction = Some(now);
    }

    pub fn touch(&mut self) {
        self.touch_at(SystemTime::now());
    }

    /// One 1 Hz tick; counts only while the user is active.
    pub fn tick_at(&mut self, now: SystemTime) {
        let Some(last) = self.last_interaction else {
            return;
        };
        match now.duration_since(last) {
            Ok(idle) if idle > self.idle_cutoff => {}
            _ => self.elapsed_secs += 1,
        }
    }

    pub fn tick(&mut self) {
        self.tick_at(SystemTime::now());
    }

    pub fn seconds(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn reset(&mut self) {
        self.elapsed_secs = 0;
        self.last_interaction = None;
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

/// Live state for one practice round: the text being typed, the keystroke
/// trace, chunk bookkeeping, the idle-aware clock and the owned analytics.
///
/// The session is the single writer of all of these; chunk completion and
/// keystrokes must come from one caller at a time.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    pub text: String,
    pub cursor: usize,
    pub trace: KeystrokeTrace,
    pub total_keys: u64,
    pub chunk: u64,
    pub last_chunk_cursor: usize,
    pub last_chunk_keys: u64,
    pub last_chunk_secs: u64,
    pub clock: SessionClock,
    pub analytics: Analytics,
    pub config: AnalyzerConfig,
    char_len: usize,
}

impl PracticeSession {
    pub fn new(text: String) -> Self {
        Self::with_config(text, AnalyzerConfig::default(), Duration::from_secs(3))
    }

    pub fn with_config(text: String, config: AnalyzerConfig, idle_cutoff: Duration) -> Self {
        let char_len = text.chars().count();
        Self {
            text,
            cursor: 0,
            trace: KeystrokeTrace::new(),
            total_keys: 0,
            chunk: 0,
            last_chunk_cursor: 0,
            last_chunk_keys: 0,
            last_chunk_secs: 0,
            clock: SessionClock::new(idle_cutoff),
            analytics: Analytics::new(),
            config,
            char_len,
        }
    }

    /// Character the next keystroke is measured against; `None` once the
    /// text is fully typed.
    pub fn expected_char(&self) -> Option<char> {
        self.text.chars().nth(self.cursor)
    }

    pub fn char_count(&self) -> usize {
        self.char_len
    }

    pub fn finished(&self) -> bool {
        self.cursor >= self.char_len
    }

    /// Record one keystroke against the expected character and advance the
    /// cursor. Returns `None` once the text is fully typed.
    pub fn type_char(&mut self, typed: char) -> Option<Outcome> {
        self.clock.touch();
        let expected = self.expected_char()?;
        let outcome = if typed == expected {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        };
        self.trace.record(self.cursor, outcome);
        self.total_keys += 1;
        self.advance();
        Some(outcome)
    }

    /// Move the cursor back one position. Recorded marks stay put; a
    /// retype pushes another mark at the same position.
    pub fn backspace(&mut self) {
        self.clock.touch();
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    fn advance(&mut self) {
        if self.cursor == self.char_len {
            return;
        }
        self.cursor += 1;
        self.skip_tabs();
    }

    // Tabs render as indentation and are never typed.
    fn skip_tabs(&mut self) {
        while self.expected_char() == Some('\t') {
            self.cursor += 1;
        }
    }

    /// 1 Hz host tick; advances the idle-aware clock.
    pub fn on_tick(&mut self) {
        self.clock.tick();
    }

    /// Close the current chunk: analyze it, fold the per-letter delta into
    /// the owned analytics and advance the last-chunk markers.
    ///
    /// Returns `None` and leaves the markers untouched when the clock has
    /// not moved since the last chunk, so the WPM division never sees a
    /// zero elapsed time.
    pub fn complete_chunk(&mut self) -> Option<ChunkAnalysis> {
        let now_secs = self.clock.seconds();
        if now_secs <= self.last_chunk_secs {
            return None;
        }

        let bounds = ChunkBounds {
            start: self.last_chunk_cursor,
            end: self.cursor,
        };
        let keys = KeyCounters {
            total_keys: self.total_keys,
            keys_at_last_chunk: self.last_chunk_keys,
        };
        let timing = ChunkTiming {
            now_secs: now_secs as f64,
            last_chunk_secs: self.last_chunk_secs as f64,
        };

        let analysis = analyzer::analyze_chunk(
            &self.trace,
            &self.text,
            bounds,
            keys,
            timing,
            &self.config,
        );
        self.analytics.observe(bounds, &analysis, Local::now());

        self.last_chunk_cursor = self.cursor;
        self.last_chunk_keys = self.total_keys;
        self.last_chunk_secs = now_secs;
        self.chunk += 1;

        Some(analysis)
    }

    /// Per-letter miss rates from the owned analytics, ready to bias the
    /// next word-feed request.
    pub fn error_rates(&self) -> std::collections::HashMap<char, f64> {
        self.analytics.error_rates()
    }

    /// Swap in new text and clear the typing bookkeeping. The analytics
    /// carry across texts; reset them separately at true session end.
    pub fn set_text(&mut self, text: String) {
        self.char_len = text.chars().count();
        self.text = text;
        self.clear_progress();
    }

    /// Restart the current text from scratch.
    pub fn reset(&mut self) {
        self.clear_progress();
    }

    fn clear_progress(&mut self) {
        self.cursor = 0;
        self.trace.clear();
        self.total_keys = 0;
        self.chunk = 0;
        self.last_chunk_cursor = 0;
        self.last_chunk_keys = 0;
        self.last_chunk_secs = 0;
        self.clock.reset();
    }

    /// Apply one runtime event: keystrokes type, ticks advance the clock.
    pub fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Key(c) => {
                self.type_char(c);
            }
            SessionEvent::Backspace => self.backspace(),
            SessionEvent::Tick => self.on_tick(),
        }
    }
}
