use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;

use lesson_core::model::{
    Chapter, ChapterId, CompletionEntry, LearnerId, LessonPolicy, Step, StepEvent, Verse,
    VerseNumber,
};
use lesson_core::quiz::{ComprehensionQuiz, Placement, WordOrderQuiz};
use lesson_core::scoring::{PronunciationScore, StarInputs, Stars, compute_stars};

use super::progress::LessonProgress;
use crate::error::LessonError;

//
// ─── RECORDING ─────────────────────────────────────────────────────────────────
//

/// Opaque handle to a learner recording (a file path or upload key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingRef(String);

impl RecordingRef {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The latest recording submitted in a lesson, with its score if one was
/// produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub reference: RecordingRef,
    pub score: Option<PronunciationScore>,
}

//
// ─── NAVIGATION ────────────────────────────────────────────────────────────────
//

/// Result of asking the lesson to move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Moved { from: Step, to: Step },
    /// The current step's gate is closed; nothing changed.
    Blocked { step: Step },
    /// Already on the celebration step; the lesson can be completed.
    ReadyToComplete,
}

/// Stars fixed at the moment the lesson was finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonResult {
    pub stars: Stars,
    pub completed_at: DateTime<Utc>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One pass through the six lesson steps for a single verse.
///
/// All mutation here is synchronous; loading and persisting happen in
/// `LessonLoopService`.
pub struct LessonSession {
    learner: LearnerId,
    chapter: ChapterId,
    total_verses: u32,
    verse: Verse,
    policy: LessonPolicy,
    step: Step,
    recording: Option<Recording>,
    word_order: WordOrderQuiz,
    comprehension: ComprehensionQuiz,
    started_at: DateTime<Utc>,
    result: Option<LessonResult>,
    persisted: bool,
}

impl LessonSession {
    /// Start a lesson on `verse`, taken from `chapter`.
    ///
    /// `started_at` should come from the services layer clock.
    #[must_use]
    pub fn new(
        learner: LearnerId,
        chapter: &Chapter,
        verse: Verse,
        policy: LessonPolicy,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            learner,
            chapter: chapter.id(),
            total_verses: chapter.total_verses(),
            word_order: WordOrderQuiz::for_verse(&verse),
            comprehension: ComprehensionQuiz::for_verse(&verse),
            verse,
            policy,
            step: Step::FIRST,
            recording: None,
            started_at,
            result: None,
            persisted: false,
        }
    }

    #[must_use]
    pub fn learner(&self) -> LearnerId {
        self.learner
    }

    #[must_use]
    pub fn chapter_id(&self) -> ChapterId {
        self.chapter
    }

    #[must_use]
    pub fn total_verses(&self) -> u32 {
        self.total_verses
    }

    #[must_use]
    pub fn verse(&self) -> &Verse {
        &self.verse
    }

    #[must_use]
    pub fn verse_number(&self) -> VerseNumber {
        self.verse.number()
    }

    #[must_use]
    pub fn policy(&self) -> &LessonPolicy {
        &self.policy
    }

    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn recording(&self) -> Option<&Recording> {
        self.recording.as_ref()
    }

    #[must_use]
    pub fn word_order(&self) -> &WordOrderQuiz {
        &self.word_order
    }

    #[must_use]
    pub fn comprehension(&self) -> &ComprehensionQuiz {
        &self.comprehension
    }

    #[must_use]
    pub fn result(&self) -> Option<LessonResult> {
        self.result
    }

    #[must_use]
    pub fn stars(&self) -> Option<Stars> {
        self.result.map(|r| r.stars)
    }

    /// Whether the lesson has been finished and its stars fixed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Whether the finished lesson has reached the progress store.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Gate for the current step.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        match self.step {
            Step::Explanation | Step::Recitation | Step::Celebration => true,
            Step::Recording => !self.policy.recording_required() || self.recording.is_some(),
            Step::WordOrderQuiz => self.word_order.is_solved(),
            Step::ComprehensionQuiz => self.comprehension.is_solved(),
        }
    }

    #[must_use]
    pub fn can_retreat(&self) -> bool {
        !self.is_complete() && self.step.previous().is_some()
    }

    /// Move to the next step if the current gate allows it.
    pub fn advance(&mut self) -> Transition {
        if !self.can_advance() {
            return Transition::Blocked { step: self.step };
        }
        match self.step.transition(StepEvent::Next) {
            Some(to) => {
                let from = self.step;
                self.step = to;
                tracing::debug!(verse = %self.verse.number(), ?from, ?to, "lesson step advanced");
                Transition::Moved { from, to }
            }
            None => Transition::ReadyToComplete,
        }
    }

    /// Step back one step. Returns the new step, or `None` on the first step
    /// or once the lesson is complete.
    pub fn retreat(&mut self) -> Option<Step> {
        if self.is_complete() {
            return None;
        }
        let to = self.step.transition(StepEvent::Back)?;
        self.step = to;
        Some(to)
    }

    /// Offer one word to the active slot of the word-order quiz.
    pub fn submit_word(&mut self, token: &str) -> Placement {
        self.word_order.place(token)
    }

    /// Offer words in sequence, stopping at the first one rejected.
    /// Returns whether the quiz is solved.
    pub fn submit_word_order<I, S>(&mut self, tokens: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.word_order.place_all(tokens)
    }

    /// Candidate words for the active slot, shuffled with `rng`.
    pub fn word_bank<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        self.word_order
            .word_bank(self.policy.word_bank_lookahead(), rng)
    }

    /// Answer the comprehension question by option index.
    pub fn submit_comprehension(&mut self, index: usize) -> bool {
        self.comprehension.select(index)
    }

    /// Answer the comprehension question by option text.
    pub fn submit_comprehension_text(&mut self, option: &str) -> bool {
        self.comprehension.select_text(option)
    }

    /// Store a recording, replacing any earlier one.
    pub fn submit_recording(&mut self, reference: RecordingRef, score: Option<PronunciationScore>) {
        tracing::debug!(
            verse = %self.verse.number(),
            score = ?score.map(|s| s.value()),
            "recording submitted"
        );
        self.recording = Some(Recording { reference, score });
    }

    #[must_use]
    pub fn pronunciation_score(&self) -> Option<PronunciationScore> {
        self.recording.as_ref().and_then(|r| r.score)
    }

    #[must_use]
    pub fn star_inputs(&self) -> StarInputs {
        StarInputs {
            word_order_correct: self.word_order.is_solved(),
            comprehension_correct: self.comprehension.is_solved(),
            pronunciation: self.pronunciation_score(),
        }
    }

    #[must_use]
    pub fn progress(&self) -> LessonProgress {
        LessonProgress {
            step: self.step,
            step_index: self.step.index(),
            total_steps: Step::ALL.len(),
            can_advance: self.can_advance(),
            can_retreat: self.can_retreat(),
            is_complete: self.is_complete(),
        }
    }

    /// Fix the lesson's stars. Calling again returns the stars already fixed.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::NotAtCelebration` unless the lesson is on the
    /// celebration step.
    pub(crate) fn finalize(&mut self, completed_at: DateTime<Utc>) -> Result<Stars, LessonError> {
        if let Some(result) = self.result {
            return Ok(result.stars);
        }
        if !self.step.is_terminal() {
            return Err(LessonError::NotAtCelebration { step: self.step });
        }
        let stars = compute_stars(&self.star_inputs(), self.policy.bonus_score_threshold());
        self.result = Some(LessonResult {
            stars,
            completed_at,
        });
        Ok(stars)
    }

    pub(crate) fn completion_entry(&self) -> Result<CompletionEntry, LessonError> {
        let result = self.result.ok_or(LessonError::NotCompleted)?;
        Ok(CompletionEntry {
            chapter: self.chapter,
            verse: self.verse.number(),
            total_verses: self.total_verses,
            stars: result.stars,
            completed_at: result.completed_at,
        })
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = true;
    }
}

impl fmt::Debug for LessonSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LessonSession")
            .field("learner", &self.learner)
            .field("chapter", &self.chapter)
            .field("verse", &self.verse.number())
            .field("step", &self.step)
            .field("recorded", &self.recording.is_some())
            .field("result", &self.result)
            .field("persisted", &self.persisted)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
