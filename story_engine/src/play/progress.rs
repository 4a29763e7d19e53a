//! Progress and transcript views of a play session.

use std::fmt;

/// How far into the story the reader is, by part position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based position of the current part.
    pub position: usize,
    /// Number of parts in the story.
    pub total: usize,
}

impl Progress {
    pub fn new(position: usize, total: usize) -> Self {
        Self { position, total }
    }

    /// Position over total, clamped to 0.0..=1.0.
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.position as f32 / self.total as f32).clamp(0.0, 1.0)
    }

    /// Whole-number percentage for a progress bar.
    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).round() as u8
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Part {} of {}", self.position, self.total)
    }
}

/// A visited part and the choice taken from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    /// 1-based step number.
    pub step: usize,
    pub part_text: String,
    pub choice_text: String,
}

impl fmt::Display for TranscriptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Part {}: {}\n  Choice: {}",
            self.step, self.part_text, self.choice_text
        )
    }
}
