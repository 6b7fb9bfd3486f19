use thiserror::Error;

use crate::model::ids::{ChapterId, VerseNumber};

mod chapter;
pub(crate) mod verse;

pub use chapter::{Chapter, ChapterDraft};
pub use verse::{
    ComprehensionDraft, ComprehensionQuestion, Verse, VerseDraft, Word, WordOrderPrompt,
};

//
// ─── CONTENT VALIDATION ERRORS ─────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("chapter {chapter} has no name")]
    EmptyChapterName { chapter: ChapterId },

    #[error("chapter {chapter} declares zero verses")]
    ZeroTotalVerses { chapter: ChapterId },

    #[error("verse {verse} is outside chapter {chapter} (total {total})")]
    VerseOutOfRange {
        chapter: ChapterId,
        verse: VerseNumber,
        total: u32,
    },

    #[error("verse {verse} appears twice in chapter {chapter}")]
    DuplicateVerse {
        chapter: ChapterId,
        verse: VerseNumber,
    },

    #[error("verse numbers start at 1")]
    ZeroVerseNumber,

    #[error("verse {verse} has no text")]
    EmptyVerseText { verse: VerseNumber },

    #[error("verse {verse} has no words")]
    NoWords { verse: VerseNumber },

    #[error("verse {verse} word positions are not contiguous")]
    InvalidWordPositions { verse: VerseNumber },

    #[error("verse {verse} word at position {position} is empty")]
    EmptyWord { verse: VerseNumber, position: u32 },

    #[error("verse {verse} quiz needs at least two options, got {count}")]
    TooFewOptions { verse: VerseNumber, count: usize },

    #[error("verse {verse} correct option {index} is out of range ({count} options)")]
    CorrectOptionOutOfRange {
        verse: VerseNumber,
        index: usize,
        count: usize,
    },
}
