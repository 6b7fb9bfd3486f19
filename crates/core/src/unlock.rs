//! Which verses and chapters a learner may open.
//!
//! Pure functions over `LearnerProgress`; nothing here writes.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{ChapterId, LearnerProgress, VerseNumber};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChapterOrderError {
    #[error("chapter order is empty")]
    Empty,

    #[error("chapter {0} appears twice in the chapter order")]
    Duplicate(ChapterId),
}

/// Configured learning sequence of chapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterOrder(Vec<ChapterId>);

impl ChapterOrder {
    /// # Errors
    ///
    /// Returns `ChapterOrderError` for an empty list or repeated chapters.
    pub fn new(chapters: impl IntoIterator<Item = ChapterId>) -> Result<Self, ChapterOrderError> {
        let chapters: Vec<ChapterId> = chapters.into_iter().collect();
        if chapters.is_empty() {
            return Err(ChapterOrderError::Empty);
        }
        let mut seen = HashSet::with_capacity(chapters.len());
        for id in &chapters {
            if !seen.insert(*id) {
                return Err(ChapterOrderError::Duplicate(*id));
            }
        }
        Ok(Self(chapters))
    }

    #[must_use]
    pub fn chapters(&self) -> &[ChapterId] {
        &self.0
    }

    #[must_use]
    pub fn contains(&self, chapter: ChapterId) -> bool {
        self.0.contains(&chapter)
    }

    /// Chapter that must be finished before `chapter` opens.
    ///
    /// `None` for the first chapter and for chapters outside the order.
    #[must_use]
    pub fn predecessor(&self, chapter: ChapterId) -> Option<ChapterId> {
        let idx = self.0.iter().position(|c| *c == chapter)?;
        idx.checked_sub(1).map(|prev| self.0[prev])
    }
}

/// Verse N is open when it is the first verse or verse N-1 is completed.
#[must_use]
pub fn is_verse_unlocked(progress: &LearnerProgress, chapter: ChapterId, verse: VerseNumber) -> bool {
    match verse.previous() {
        None => verse.is_first(),
        Some(prev) => progress.is_verse_completed(chapter, prev),
    }
}

/// A chapter is open when it leads the order or the chapter before it is
/// completed. Chapters outside the order stay locked.
#[must_use]
pub fn is_chapter_unlocked(
    progress: &LearnerProgress,
    order: &ChapterOrder,
    chapter: ChapterId,
) -> bool {
    if !order.contains(chapter) {
        return false;
    }
    match order.predecessor(chapter) {
        None => true,
        Some(prev) => progress.is_chapter_completed(prev),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompletionEntry, LearnerId, StarMerge};
    use crate::scoring::Stars;
    use crate::time::fixed_now;

    fn complete(progress: &mut LearnerProgress, chapter: u32, total: u32, verse: u32) {
        progress
            .record_completion(
                &CompletionEntry {
                    chapter: ChapterId::new(chapter),
                    verse: VerseNumber::new(verse),
                    total_verses: total,
                    stars: Stars::new(2).unwrap(),
                    completed_at: fixed_now(),
                },
                StarMerge::Overwrite,
            )
            .unwrap();
    }

    #[test]
    fn first_verse_is_always_open() {
        let progress = LearnerProgress::empty(LearnerId::generate());
        assert!(is_verse_unlocked(&progress, ChapterId::new(1), VerseNumber::new(1)));
        assert!(!is_verse_unlocked(&progress, ChapterId::new(1), VerseNumber::new(2)));
        assert!(!is_verse_unlocked(&progress, ChapterId::new(1), VerseNumber::new(0)));
    }

    #[test]
    fn verse_opens_iff_previous_completed() {
        let mut progress = LearnerProgress::empty(LearnerId::generate());
        complete(&mut progress, 1, 7, 1);
        complete(&mut progress, 1, 7, 3);

        let chapter = ChapterId::new(1);
        for n in 2..=7 {
            let verse = VerseNumber::new(n);
            let prev = VerseNumber::new(n - 1);
            assert_eq!(
                is_verse_unlocked(&progress, chapter, verse),
                progress.is_verse_completed(chapter, prev),
                "verse {n}"
            );
        }
        assert!(is_verse_unlocked(&progress, chapter, VerseNumber::new(4)));
        assert!(!is_verse_unlocked(&progress, chapter, VerseNumber::new(5)));
    }

    #[test]
    fn chapter_opens_after_predecessor_completes() {
        let order =
            ChapterOrder::new([ChapterId::new(1), ChapterId::new(114), ChapterId::new(113)])
                .unwrap();
        let mut progress = LearnerProgress::empty(LearnerId::generate());

        assert!(is_chapter_unlocked(&progress, &order, ChapterId::new(1)));
        assert!(!is_chapter_unlocked(&progress, &order, ChapterId::new(114)));

        complete(&mut progress, 1, 2, 1);
        assert!(!is_chapter_unlocked(&progress, &order, ChapterId::new(114)));
        complete(&mut progress, 1, 2, 2);
        assert!(is_chapter_unlocked(&progress, &order, ChapterId::new(114)));
        assert!(!is_chapter_unlocked(&progress, &order, ChapterId::new(113)));
    }

    #[test]
    fn chapters_outside_the_order_are_locked() {
        let order = ChapterOrder::new([ChapterId::new(1)]).unwrap();
        let progress = LearnerProgress::empty(LearnerId::generate());
        assert!(!is_chapter_unlocked(&progress, &order, ChapterId::new(2)));
    }

    #[test]
    fn order_rejects_duplicates_and_empty() {
        assert_eq!(
            ChapterOrder::new([ChapterId::new(1), ChapterId::new(1)]),
            Err(ChapterOrderError::Duplicate(ChapterId::new(1)))
        );
        assert_eq!(ChapterOrder::new([]), Err(ChapterOrderError::Empty));
    }
}
