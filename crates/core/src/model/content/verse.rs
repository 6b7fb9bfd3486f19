use crate::model::ids::VerseNumber;

use super::ContentError;

//
// ─── CONTENT TYPES ─────────────────────────────────────────────────────────────
//

/// One word of a verse, as offered to the word-order quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub transliteration: String,
    pub meaning: String,
    pub position: u32,
}

/// Instructions shown with the word-order quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordOrderPrompt {
    pub instruction: String,
    pub hint: Option<String>,
}

/// Multiple-choice question about the verse meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComprehensionQuestion {
    question: String,
    options: Vec<String>,
    correct_option: usize,
    explanation: String,
    hint: Option<String>,
}

impl ComprehensionQuestion {
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_option(&self) -> usize {
        self.correct_option
    }

    #[must_use]
    pub fn correct_option_text(&self) -> &str {
        &self.options[self.correct_option]
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }
}

/// Unvalidated comprehension question as delivered by a content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComprehensionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub correct_option: usize,
    pub explanation: String,
    pub hint: Option<String>,
}

/// Unvalidated verse as delivered by a content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseDraft {
    pub number: u32,
    pub arabic_text: String,
    pub transliteration: String,
    pub translation: String,
    pub explanation: String,
    pub audio_url: String,
    pub words: Vec<Word>,
    pub word_order: WordOrderPrompt,
    pub comprehension: ComprehensionDraft,
}

/// A validated verse: the atomic unit taught by one lesson.
///
/// Words are kept sorted by `position`, so `words()` is the canonical order
/// the word-order quiz asks the learner to rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verse {
    number: VerseNumber,
    arabic_text: String,
    transliteration: String,
    translation: String,
    explanation: String,
    audio_url: String,
    words: Vec<Word>,
    word_order: WordOrderPrompt,
    comprehension: ComprehensionQuestion,
}

//
// ─── VALIDATION ────────────────────────────────────────────────────────────────
//

impl VerseDraft {
    /// Validate the draft into a `Verse`.
    ///
    /// Word positions may start at 0 or 1 but must be contiguous and unique.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` when the verse cannot be taught as delivered.
    pub fn validate(self) -> Result<Verse, ContentError> {
        if self.number == 0 {
            return Err(ContentError::ZeroVerseNumber);
        }
        let number = VerseNumber::new(self.number);

        if self.arabic_text.trim().is_empty() {
            return Err(ContentError::EmptyVerseText { verse: number });
        }

        let mut words = self.words;
        if words.is_empty() {
            return Err(ContentError::NoWords { verse: number });
        }
        words.sort_by_key(|w| w.position);

        let base = words[0].position;
        if base > 1 {
            return Err(ContentError::InvalidWordPositions { verse: number });
        }
        for (offset, word) in (0_u32..).zip(words.iter()) {
            if word.position != base + offset {
                return Err(ContentError::InvalidWordPositions { verse: number });
            }
            if word.text.trim().is_empty() {
                return Err(ContentError::EmptyWord {
                    verse: number,
                    position: word.position,
                });
            }
        }

        let quiz = self.comprehension;
        if quiz.options.len() < 2 {
            return Err(ContentError::TooFewOptions {
                verse: number,
                count: quiz.options.len(),
            });
        }
        if quiz.correct_option >= quiz.options.len() {
            return Err(ContentError::CorrectOptionOutOfRange {
                verse: number,
                index: quiz.correct_option,
                count: quiz.options.len(),
            });
        }

        Ok(Verse {
            number,
            arabic_text: self.arabic_text,
            transliteration: self.transliteration,
            translation: self.translation,
            explanation: self.explanation,
            audio_url: self.audio_url,
            words,
            word_order: self.word_order,
            comprehension: ComprehensionQuestion {
                question: quiz.question,
                options: quiz.options,
                correct_option: quiz.correct_option,
                explanation: quiz.explanation,
                hint: quiz.hint,
            },
        })
    }
}

//
// ─── ACCESSORS ─────────────────────────────────────────────────────────────────
//

impl Verse {
    #[must_use]
    pub fn number(&self) -> VerseNumber {
        self.number
    }

    #[must_use]
    pub fn arabic_text(&self) -> &str {
        &self.arabic_text
    }

    #[must_use]
    pub fn transliteration(&self) -> &str {
        &self.transliteration
    }

    #[must_use]
    pub fn translation(&self) -> &str {
        &self.translation
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn audio_url(&self) -> &str {
        &self.audio_url
    }

    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Word texts in canonical order.
    #[must_use]
    pub fn canonical_words(&self) -> Vec<String> {
        self.words.iter().map(|w| w.text.clone()).collect()
    }

    #[must_use]
    pub fn word_order(&self) -> &WordOrderPrompt {
        &self.word_order
    }

    #[must_use]
    pub fn comprehension(&self) -> &ComprehensionQuestion {
        &self.comprehension
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
