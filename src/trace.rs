use std::collections::HashMap;

/// Correctness of a single keystroke at one text position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Per-position record of keystroke correctness marks, keyed by absolute
/// character index into the source text.
///
/// Untouched positions have no entry. A position that was mistyped,
/// corrected and retyped carries its marks in keystroke order, so the last
/// mark always reflects the current state of the position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeystrokeTrace {
    marks: HashMap<usize, Vec<Outcome>>,
}

impl KeystrokeTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a correctness mark at `index`.
    pub fn record(&mut self, index: usize, outcome: Outcome) {
        self.marks.entry(index).or_default().push(outcome);
    }

    /// Marks recorded at `index`, `None` for untouched positions.
    pub fn at(&self, index: usize) -> Option<&[Outcome]> {
        self.marks.get(&index).map(|marks| marks.as_slice())
    }

    /// Number of positions with at least one mark.
    pub fn touched(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }
}
