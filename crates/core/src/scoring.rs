use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pronunciation score at or above which the third star is awarded.
pub const DEFAULT_BONUS_THRESHOLD: u8 = 90;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("pronunciation score must be in 0..=100, got {0}")]
    ScoreOutOfRange(u8),

    #[error("stars must be in 1..=3, got {0}")]
    StarsOutOfRange(u8),
}

//
// ─── PRONUNCIATION SCORE ───────────────────────────────────────────────────────
//

/// Externally supplied 0-100 estimate of recitation quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PronunciationScore(u8);

impl PronunciationScore {
    /// # Errors
    ///
    /// Returns `ScoreError::ScoreOutOfRange` above 100.
    pub fn new(value: u8) -> Result<Self, ScoreError> {
        if value > 100 {
            return Err(ScoreError::ScoreOutOfRange(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

//
// ─── STARS ─────────────────────────────────────────────────────────────────────
//

/// Reward for a finished lesson, always 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Stars(u8);

impl Stars {
    pub const MIN: Stars = Stars(1);
    pub const MAX: Stars = Stars(3);

    /// # Errors
    ///
    /// Returns `ScoreError::StarsOutOfRange` outside `1..=3`.
    pub fn new(value: u8) -> Result<Self, ScoreError> {
        if (1..=3).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScoreError::StarsOutOfRange(value))
        }
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Stars {
    type Error = ScoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Stars::new(value)
    }
}

impl From<Stars> for u8 {
    fn from(stars: Stars) -> Self {
        stars.0
    }
}

impl fmt::Display for Stars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── COMPUTATION ───────────────────────────────────────────────────────────────
//

/// What a lesson attempt achieved, as far as scoring is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StarInputs {
    pub word_order_correct: bool,
    pub comprehension_correct: bool,
    pub pronunciation: Option<PronunciationScore>,
}

/// One star for finishing, one for both quizzes, one for a pronunciation
/// score at or above `bonus_threshold`.
#[must_use]
pub fn compute_stars(inputs: &StarInputs, bonus_threshold: u8) -> Stars {
    let mut stars = 1;
    if inputs.word_order_correct && inputs.comprehension_correct {
        stars += 1;
    }
    if inputs
        .pronunciation
        .is_some_and(|score| score.value() >= bonus_threshold)
    {
        stars += 1;
    }
    Stars(stars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(word: bool, comp: bool, score: Option<u8>) -> StarInputs {
        StarInputs {
            word_order_correct: word,
            comprehension_correct: comp,
            pronunciation: score.map(|s| PronunciationScore::new(s).unwrap()),
        }
    }

    #[test]
    fn stars_always_in_range() {
        for word in [false, true] {
            for comp in [false, true] {
                for score in [None, Some(0), Some(89), Some(90), Some(100)] {
                    let stars = compute_stars(&inputs(word, comp, score), 90);
                    assert!((1..=3).contains(&stars.value()));
                }
            }
        }
    }

    #[test]
    fn three_stars_needs_quizzes_and_score() {
        assert_eq!(compute_stars(&inputs(true, true, Some(95)), 90).value(), 3);
        assert_eq!(compute_stars(&inputs(true, true, Some(90)), 90).value(), 3);
        assert_eq!(compute_stars(&inputs(true, false, Some(95)), 90).value(), 2);
        assert_eq!(compute_stars(&inputs(true, true, Some(89)), 90).value(), 2);
    }

    #[test]
    fn one_star_without_quizzes_or_score() {
        assert_eq!(compute_stars(&inputs(false, true, None), 90).value(), 1);
        assert_eq!(compute_stars(&inputs(true, false, Some(40)), 90).value(), 1);
        assert_eq!(compute_stars(&StarInputs::default(), 90).value(), 1);
    }

    #[test]
    fn score_out_of_range_is_rejected() {
        assert_eq!(
            PronunciationScore::new(101),
            Err(ScoreError::ScoreOutOfRange(101))
        );
    }

    #[test]
    fn stars_deserialize_with_validation() {
        let ok: Stars = serde_json::from_str("2").unwrap();
        assert_eq!(ok.value(), 2);
        assert!(serde_json::from_str::<Stars>("4").is_err());
        assert!(serde_json::from_str::<Stars>("0").is_err());
    }
}
