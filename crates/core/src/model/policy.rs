use thiserror::Error;

use crate::scoring::{DEFAULT_BONUS_THRESHOLD, Stars};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PolicyError {
    #[error("bonus score threshold must be in 0..=100, got {0}")]
    InvalidThreshold(u8),

    #[error("word bank lookahead must be > 0")]
    InvalidLookahead,
}

/// How a repeated completion of the same verse combines with the stored stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StarMerge {
    /// The latest attempt replaces the stored value, even when it is lower.
    #[default]
    Overwrite,
    /// Keep the best value ever recorded.
    KeepBest,
}

impl StarMerge {
    #[must_use]
    pub fn merge(self, stored: Option<Stars>, incoming: Stars) -> Stars {
        match (self, stored) {
            (StarMerge::KeepBest, Some(stored)) => stored.max(incoming),
            _ => incoming,
        }
    }
}

/// Tunables for a verse lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonPolicy {
    recording_required: bool,
    bonus_score_threshold: u8,
    word_bank_lookahead: usize,
    star_merge: StarMerge,
}

impl Default for LessonPolicy {
    /// Recording may be skipped, 90+ earns the pronunciation star, four
    /// upcoming words are offered at a time, stars are overwritten.
    fn default() -> Self {
        Self {
            recording_required: false,
            bonus_score_threshold: DEFAULT_BONUS_THRESHOLD,
            word_bank_lookahead: 4,
            star_merge: StarMerge::Overwrite,
        }
    }
}

impl LessonPolicy {
    /// # Errors
    ///
    /// Returns `PolicyError` when the threshold exceeds 100 or the lookahead is zero.
    pub fn new(
        recording_required: bool,
        bonus_score_threshold: u8,
        word_bank_lookahead: usize,
        star_merge: StarMerge,
    ) -> Result<Self, PolicyError> {
        if bonus_score_threshold > 100 {
            return Err(PolicyError::InvalidThreshold(bonus_score_threshold));
        }
        if word_bank_lookahead == 0 {
            return Err(PolicyError::InvalidLookahead);
        }
        Ok(Self {
            recording_required,
            bonus_score_threshold,
            word_bank_lookahead,
            star_merge,
        })
    }

    #[must_use]
    pub fn with_recording_required(mut self, required: bool) -> Self {
        self.recording_required = required;
        self
    }

    #[must_use]
    pub fn with_star_merge(mut self, merge: StarMerge) -> Self {
        self.star_merge = merge;
        self
    }

    #[must_use]
    pub fn recording_required(&self) -> bool {
        self.recording_required
    }

    #[must_use]
    pub fn bonus_score_threshold(&self) -> u8 {
        self.bonus_score_threshold
    }

    #[must_use]
    pub fn word_bank_lookahead(&self) -> usize {
        self.word_bank_lookahead
    }

    #[must_use]
    pub fn star_merge(&self) -> StarMerge {
        self.star_merge
    }
}
