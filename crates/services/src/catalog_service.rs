use lesson_core::model::{ChapterId, LearnerId, VerseNumber};
use lesson_core::scoring::Stars;
use lesson_core::unlock::{ChapterOrder, is_chapter_unlocked, is_verse_unlocked};
use storage::content::ContentSourceError;

use crate::content_service::ContentService;
use crate::error::{ContentLoadError, LessonError};
use crate::progress_service::ProgressService;

/// One row of a chapter's verse list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseListItem {
    pub number: VerseNumber,
    pub unlocked: bool,
    pub completed: bool,
    pub stars: Option<Stars>,
    /// Whether the content record ships a lesson body for this verse.
    pub has_content: bool,
}

/// One row of the chapter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterListItem {
    pub id: ChapterId,
    pub name_native: String,
    pub name_localized: String,
    pub unlocked: bool,
    pub completed_verses: usize,
    pub total_verses: u32,
    pub total_stars: u32,
    pub completed: bool,
}

impl ChapterListItem {
    fn without_content(id: ChapterId) -> Self {
        Self {
            id,
            name_native: String::new(),
            name_localized: String::new(),
            unlocked: false,
            completed_verses: 0,
            total_verses: 0,
            total_stars: 0,
            completed: false,
        }
    }
}

/// Read-only views joining content with the learner's progress.
#[derive(Clone)]
pub struct CatalogService {
    content: ContentService,
    progress: ProgressService,
    order: ChapterOrder,
}

impl CatalogService {
    #[must_use]
    pub fn new(content: ContentService, progress: ProgressService, order: ChapterOrder) -> Self {
        Self {
            content,
            progress,
            order,
        }
    }

    #[must_use]
    pub fn order(&self) -> &ChapterOrder {
        &self.order
    }

    /// Every verse of a chapter with its lock and completion state.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::ContentLoad` or `LessonError::Persistence` if
    /// either side cannot be read.
    pub async fn verse_list(
        &self,
        learner: LearnerId,
        chapter: ChapterId,
    ) -> Result<Vec<VerseListItem>, LessonError> {
        let loaded = self.content.chapter(chapter).await?;
        let progress = self.progress.load(learner).await?;
        let record = progress.chapter(chapter);

        Ok(loaded
            .verse_numbers()
            .map(|number| VerseListItem {
                number,
                unlocked: is_verse_unlocked(&progress, chapter, number),
                completed: record.is_some_and(|r| r.is_verse_completed(number)),
                stars: record.and_then(|r| r.stars_for(number)),
                has_content: loaded.verse(number).is_some(),
            })
            .collect())
    }

    /// Chapters in configured order with their lock and completion state.
    ///
    /// A chapter in the order with no content record is listed locked with
    /// no verses.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::ContentLoad` if a chapter's content exists but
    /// cannot be loaded, or `LessonError::Persistence` if progress cannot be
    /// read.
    pub async fn chapter_list(
        &self,
        learner: LearnerId,
    ) -> Result<Vec<ChapterListItem>, LessonError> {
        let progress = self.progress.load(learner).await?;
        let mut items = Vec::with_capacity(self.order.chapters().len());

        for &id in self.order.chapters() {
            let loaded = match self.content.chapter(id).await {
                Ok(loaded) => loaded,
                Err(ContentLoadError::Source(ContentSourceError::NotFound(_))) => {
                    tracing::warn!(chapter = %id, "chapter in order has no content");
                    items.push(ChapterListItem::without_content(id));
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let record = progress.chapter(id);
            items.push(ChapterListItem {
                id,
                name_native: loaded.name_native().to_owned(),
                name_localized: loaded.name_localized().to_owned(),
                unlocked: is_chapter_unlocked(&progress, &self.order, id),
                completed_verses: record.map_or(0, |r| r.completed_count()),
                total_verses: loaded.total_verses(),
                total_stars: record.map_or(0, |r| r.total_stars()),
                completed: record.is_some_and(|r| r.is_completed()),
            });
        }

        Ok(items)
    }
}
