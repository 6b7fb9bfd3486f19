//! Validation for the two lesson quizzes.
//!
//! Wrong answers are ordinary results here, never errors: they drive
//! "try again" feedback and leave the quiz open.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::model::content::{ComprehensionQuestion, Verse};

//
// ─── WORD ORDER ────────────────────────────────────────────────────────────────
//

/// Outcome of offering one word to the active slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The word filled `slot`; `solved` is true once every slot is filled.
    Accepted { slot: usize, solved: bool },
    /// Wrong word for the active slot. Nothing changed.
    TryAgain,
}

/// Rebuild a verse's word sequence, strictly left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordOrderQuiz {
    target: Vec<String>,
    active: usize,
}

impl WordOrderQuiz {
    #[must_use]
    pub fn new(target: Vec<String>) -> Self {
        Self { target, active: 0 }
    }

    #[must_use]
    pub fn for_verse(verse: &Verse) -> Self {
        Self::new(verse.canonical_words())
    }

    /// Index of the slot that accepts the next word.
    #[must_use]
    pub fn active_slot(&self) -> usize {
        self.active
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.target.len()
    }

    /// Words locked so far, in order.
    #[must_use]
    pub fn placed(&self) -> &[String] {
        &self.target[..self.active]
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.active >= self.target.len()
    }

    /// Offer a word for the active slot.
    pub fn place(&mut self, token: &str) -> Placement {
        match self.target.get(self.active) {
            Some(expected) if expected == token => {
                let slot = self.active;
                self.active += 1;
                Placement::Accepted {
                    slot,
                    solved: self.is_solved(),
                }
            }
            _ => Placement::TryAgain,
        }
    }

    /// Place tokens one at a time, stopping at the first rejected token.
    ///
    /// Returns whether the quiz is solved afterwards.
    pub fn place_all<I, S>(&mut self, tokens: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            if self.place(token.as_ref()) == Placement::TryAgain {
                break;
            }
        }
        self.is_solved()
    }

    /// Candidate words for the learner to pick from.
    ///
    /// Contains the correct word for each of the next `lookahead` slots plus
    /// one distractor taken from the words further along the verse (if any
    /// remain), shuffled.
    pub fn word_bank<R: Rng + ?Sized>(&self, lookahead: usize, rng: &mut R) -> Vec<String> {
        if self.is_solved() {
            return Vec::new();
        }
        let end = self.target.len().min(self.active + lookahead.max(1));
        let mut bank: Vec<String> = self.target[self.active..end].to_vec();

        let distractors: Vec<&String> = self.target[end..]
            .iter()
            .filter(|word| !bank.contains(*word))
            .collect();
        if let Some(extra) = distractors.choose(rng) {
            bank.push((*extra).clone());
        }

        bank.shuffle(rng);
        bank
    }
}

//
// ─── COMPREHENSION ─────────────────────────────────────────────────────────────
//

/// Single-select question about the verse meaning.
///
/// A correct answer is sticky: later wrong picks report `false` but do not
/// close the quiz again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComprehensionQuiz {
    options: Vec<String>,
    correct: usize,
    selected: Option<usize>,
    solved: bool,
}

impl ComprehensionQuiz {
    #[must_use]
    pub fn new(question: &ComprehensionQuestion) -> Self {
        Self {
            options: question.options().to_vec(),
            correct: question.correct_option(),
            selected: None,
            solved: false,
        }
    }

    #[must_use]
    pub fn for_verse(verse: &Verse) -> Self {
        Self::new(verse.comprehension())
    }

    /// Select an option by index. Wrong (or unknown) picks clear the selection.
    pub fn select(&mut self, index: usize) -> bool {
        if index == self.correct {
            self.selected = Some(index);
            self.solved = true;
            true
        } else {
            self.selected = None;
            false
        }
    }

    /// Select an option by its exact text.
    ///
    /// Any option whose text equals the correct option's text is correct,
    /// wherever it sits in the list.
    pub fn select_text(&mut self, option: &str) -> bool {
        if self.options.get(self.correct).is_some_and(|c| c == option) {
            self.select(self.correct)
        } else {
            self.selected = None;
            false
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }
}
