use std::collections::BTreeSet;

use crate::model::ids::{ChapterId, VerseNumber};

use super::{ContentError, Verse, VerseDraft};

/// Unvalidated chapter as delivered by a content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDraft {
    pub number: u32,
    pub name_native: String,
    pub name_localized: String,
    pub meaning: String,
    pub total_verses: u32,
    pub verses: Vec<VerseDraft>,
}

/// A validated chapter content record.
///
/// `total_verses` is the single source of truth for how many distinct verses
/// must be completed before the chapter counts as done. Content may ship
/// fewer verse bodies than that (e.g. while a chapter is being authored).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    id: ChapterId,
    name_native: String,
    name_localized: String,
    meaning: String,
    total_verses: u32,
    verses: Vec<Verse>,
}

impl ChapterDraft {
    /// Validate the chapter and every verse in it.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` for an empty verse count, verse numbers outside
    /// `1..=total_verses`, duplicates, or any invalid verse.
    pub fn validate(self) -> Result<Chapter, ContentError> {
        let id = ChapterId::new(self.number);
        if self.total_verses == 0 {
            return Err(ContentError::ZeroTotalVerses { chapter: id });
        }
        if self.name_localized.trim().is_empty() && self.name_native.trim().is_empty() {
            return Err(ContentError::EmptyChapterName { chapter: id });
        }

        let mut seen = BTreeSet::new();
        let mut verses = Vec::with_capacity(self.verses.len());
        for draft in self.verses {
            let verse = draft.validate()?;
            let number = verse.number();
            if number.value() > self.total_verses {
                return Err(ContentError::VerseOutOfRange {
                    chapter: id,
                    verse: number,
                    total: self.total_verses,
                });
            }
            if !seen.insert(number) {
                return Err(ContentError::DuplicateVerse {
                    chapter: id,
                    verse: number,
                });
            }
            verses.push(verse);
        }
        verses.sort_by_key(Verse::number);

        Ok(Chapter {
            id,
            name_native: self.name_native,
            name_localized: self.name_localized,
            meaning: self.meaning,
            total_verses: self.total_verses,
            verses,
        })
    }
}

impl Chapter {
    #[must_use]
    pub fn id(&self) -> ChapterId {
        self.id
    }

    #[must_use]
    pub fn name_native(&self) -> &str {
        &self.name_native
    }

    #[must_use]
    pub fn name_localized(&self) -> &str {
        &self.name_localized
    }

    #[must_use]
    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    #[must_use]
    pub fn total_verses(&self) -> u32 {
        self.total_verses
    }

    #[must_use]
    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    #[must_use]
    pub fn verse(&self, number: VerseNumber) -> Option<&Verse> {
        self.verses
            .binary_search_by_key(&number, Verse::number)
            .ok()
            .map(|idx| &self.verses[idx])
    }

    /// All verse numbers of the chapter, `1..=total_verses`.
    pub fn verse_numbers(&self) -> impl Iterator<Item = VerseNumber> {
        (1..=self.total_verses).map(VerseNumber::new)
    }
}
