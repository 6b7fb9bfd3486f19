//! Pronunciation scoring for submitted recordings.
//!
//! There is no speech model behind this yet. `RandomScorer` stands in for
//! one during development; `FixedScorer` makes runs reproducible.

use rand::Rng;

use lesson_core::scoring::PronunciationScore;

use crate::lessons::RecordingRef;

/// Turns a recording into a 0..=100 pronunciation score.
///
/// `None` means no score could be produced; the lesson carries on without
/// the pronunciation star.
pub trait PronunciationScorer: Send + Sync {
    fn score(&self, recording: &RecordingRef) -> Option<PronunciationScore>;
}

/// Uniform score in `min..=100`.
#[derive(Debug, Clone, Copy)]
pub struct RandomScorer {
    min: u8,
}

impl RandomScorer {
    pub const DEFAULT_MIN: u8 = 70;

    #[must_use]
    pub fn new(min: u8) -> Self {
        Self { min: min.min(100) }
    }
}

impl Default for RandomScorer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN)
    }
}

impl PronunciationScorer for RandomScorer {
    fn score(&self, recording: &RecordingRef) -> Option<PronunciationScore> {
        let value = rand::rng().random_range(self.min..=100);
        tracing::debug!(recording = recording.as_str(), value, "random pronunciation score");
        PronunciationScore::new(value).ok()
    }
}

/// Always returns the same result.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedScorer(Option<PronunciationScore>);

impl FixedScorer {
    #[must_use]
    pub fn new(score: Option<PronunciationScore>) -> Self {
        Self(score)
    }
}

impl PronunciationScorer for FixedScorer {
    fn score(&self, _recording: &RecordingRef) -> Option<PronunciationScore> {
        self.0
    }
}
