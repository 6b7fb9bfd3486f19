use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ChapterId, LearnerId, VerseNumber};
use crate::model::policy::StarMerge;
use crate::scoring::Stars;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("chapter {chapter} declares zero verses")]
    ZeroTotalVerses { chapter: ChapterId },

    #[error("verse {verse} is outside chapter {chapter} (total {total})")]
    VerseOutOfRange {
        chapter: ChapterId,
        verse: VerseNumber,
        total: u32,
    },
}

//
// ─── COMPLETION INPUT ──────────────────────────────────────────────────────────
//

/// A single finished lesson, ready to be folded into the progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEntry {
    pub chapter: ChapterId,
    pub verse: VerseNumber,
    /// Verse count from the chapter content record.
    pub total_verses: u32,
    pub stars: Stars,
    pub completed_at: DateTime<Utc>,
}

//
// ─── VERSE VIEW ────────────────────────────────────────────────────────────────
//

/// Read view of one verse inside a chapter's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseCompletion {
    pub verse: VerseNumber,
    pub completed: bool,
    pub stars: Option<Stars>,
    pub completed_at: Option<DateTime<Utc>>,
}

//
// ─── CHAPTER PROGRESS ──────────────────────────────────────────────────────────
//

/// Completion record for one chapter. The chapter id is the key under which
/// it is stored in `LearnerProgress`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterProgress {
    #[serde(default)]
    completed_verses: BTreeSet<VerseNumber>,
    #[serde(default)]
    verse_stars: BTreeMap<VerseNumber, Stars>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    verse_completed_at: BTreeMap<VerseNumber, DateTime<Utc>>,
    #[serde(default)]
    is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl ChapterProgress {
    #[must_use]
    pub fn completed_verses(&self) -> &BTreeSet<VerseNumber> {
        &self.completed_verses
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed_verses.len()
    }

    #[must_use]
    pub fn is_verse_completed(&self, verse: VerseNumber) -> bool {
        self.completed_verses.contains(&verse)
    }

    #[must_use]
    pub fn stars_for(&self, verse: VerseNumber) -> Option<Stars> {
        self.verse_stars.get(&verse).copied()
    }

    #[must_use]
    pub fn verse(&self, verse: VerseNumber) -> VerseCompletion {
        VerseCompletion {
            verse,
            completed: self.is_verse_completed(verse),
            stars: self.stars_for(verse),
            completed_at: self.verse_completed_at.get(&verse).copied(),
        }
    }

    /// Sum of every stored per-verse star value.
    #[must_use]
    pub fn total_stars(&self) -> u32 {
        self.verse_stars.values().map(|s| u32::from(s.value())).sum()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    fn apply(&mut self, entry: &CompletionEntry, merge: StarMerge) {
        self.completed_verses.insert(entry.verse);
        let stars = merge.merge(self.stars_for(entry.verse), entry.stars);
        self.verse_stars.insert(entry.verse, stars);
        self.verse_completed_at
            .insert(entry.verse, entry.completed_at);
        self.started_at.get_or_insert(entry.completed_at);

        let in_range = self
            .completed_verses
            .iter()
            .filter(|v| (1..=entry.total_verses).contains(&v.value()))
            .count();
        self.is_completed = u32::try_from(in_range).is_ok_and(|n| n == entry.total_verses);
        if self.is_completed {
            self.completed_at.get_or_insert(entry.completed_at);
        }
    }
}

//
// ─── LEARNER PROGRESS ──────────────────────────────────────────────────────────
//

/// Root progress aggregate for a learner.
///
/// `streak`, `badges` and `total_study_minutes` are carried through untouched;
/// they are owned by other collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProgress {
    learner_id: LearnerId,
    #[serde(default)]
    chapters: BTreeMap<ChapterId, ChapterProgress>,
    #[serde(default)]
    streak: u32,
    #[serde(default)]
    badges: Vec<String>,
    #[serde(default)]
    total_study_minutes: u32,
}

impl LearnerProgress {
    #[must_use]
    pub fn empty(learner_id: LearnerId) -> Self {
        Self {
            learner_id,
            chapters: BTreeMap::new(),
            streak: 0,
            badges: Vec::new(),
            total_study_minutes: 0,
        }
    }

    #[must_use]
    pub fn learner_id(&self) -> LearnerId {
        self.learner_id
    }

    #[must_use]
    pub fn chapter(&self, chapter: ChapterId) -> Option<&ChapterProgress> {
        self.chapters.get(&chapter)
    }

    pub fn chapters(&self) -> impl Iterator<Item = (ChapterId, &ChapterProgress)> {
        self.chapters.iter().map(|(id, progress)| (*id, progress))
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub fn badges(&self) -> &[String] {
        &self.badges
    }

    #[must_use]
    pub fn total_study_minutes(&self) -> u32 {
        self.total_study_minutes
    }

    #[must_use]
    pub fn is_verse_completed(&self, chapter: ChapterId, verse: VerseNumber) -> bool {
        self.chapter(chapter)
            .is_some_and(|c| c.is_verse_completed(verse))
    }

    #[must_use]
    pub fn is_chapter_completed(&self, chapter: ChapterId) -> bool {
        self.chapter(chapter).is_some_and(ChapterProgress::is_completed)
    }

    #[must_use]
    pub fn chapter_total_stars(&self, chapter: ChapterId) -> u32 {
        self.chapter(chapter).map_or(0, ChapterProgress::total_stars)
    }

    /// Fold a finished lesson into the record.
    ///
    /// Membership in the completed set is idempotent. Stars combine according
    /// to `merge`; with `StarMerge::Overwrite` a second, weaker attempt lowers
    /// the stored value.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if `total_verses` is zero or the verse lies
    /// outside `1..=total_verses`. The record is left untouched on error.
    pub fn record_completion(
        &mut self,
        entry: &CompletionEntry,
        merge: StarMerge,
    ) -> Result<&ChapterProgress, ProgressError> {
        if entry.total_verses == 0 {
            return Err(ProgressError::ZeroTotalVerses {
                chapter: entry.chapter,
            });
        }
        if entry.verse.value() == 0 || entry.verse.value() > entry.total_verses {
            return Err(ProgressError::VerseOutOfRange {
                chapter: entry.chapter,
                verse: entry.verse,
                total: entry.total_verses,
            });
        }

        let chapter = self.chapters.entry(entry.chapter).or_default();
        chapter.apply(entry, merge);
        Ok(chapter)
    }
}
