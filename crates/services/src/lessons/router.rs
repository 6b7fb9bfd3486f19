use lesson_core::model::{ChapterId, LearnerId};

use crate::error::PersistenceError;
use crate::progress_service::ProgressService;

/// Where the learner goes after finishing a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The chapter just became (or already was) complete.
    ChapterComplete { chapter: ChapterId, total_stars: u32 },
    /// Back to the chapter's verse list.
    VerseList { chapter: ChapterId },
}

impl Route {
    #[must_use]
    pub fn chapter(&self) -> ChapterId {
        match self {
            Route::ChapterComplete { chapter, .. } | Route::VerseList { chapter } => *chapter,
        }
    }
}

/// Picks the post-lesson route from the stored progress.
///
/// Callers must await the completion write before routing; the router reads
/// the store fresh and never trusts in-memory state.
#[derive(Clone)]
pub struct CompletionRouter {
    progress: ProgressService,
}

impl CompletionRouter {
    #[must_use]
    pub fn new(progress: ProgressService) -> Self {
        Self { progress }
    }

    /// # Errors
    ///
    /// Returns `PersistenceError::Load` if progress cannot be read.
    pub async fn route(
        &self,
        learner: LearnerId,
        chapter: ChapterId,
    ) -> Result<Route, PersistenceError> {
        let progress = self.progress.load(learner).await?;
        let route = match progress.chapter(chapter) {
            Some(record) if record.is_completed() => Route::ChapterComplete {
                chapter,
                total_stars: record.total_stars(),
            },
            _ => Route::VerseList { chapter },
        };
        tracing::debug!(%learner, ?route, "completion routed");
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::{CompletionEntry, StarMerge, VerseNumber};
    use lesson_core::scoring::Stars;
    use lesson_core::time::fixed_now;
    use std::sync::Arc;
    use storage::repository::InMemoryRepository;

    async fn record(progress: &ProgressService, learner: LearnerId, verse: u32, stars: u8) {
        progress
            .record_completion(
                learner,
                &CompletionEntry {
                    chapter: ChapterId::new(2),
                    verse: VerseNumber::new(verse),
                    total_verses: 2,
                    stars: Stars::new(stars).unwrap(),
                    completed_at: fixed_now(),
                },
                StarMerge::Overwrite,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn routes_to_verse_list_until_chapter_complete() {
        let progress = ProgressService::new(Arc::new(InMemoryRepository::new()));
        let router = CompletionRouter::new(progress.clone());
        let learner = LearnerId::generate();

        assert_eq!(
            router.route(learner, ChapterId::new(2)).await.unwrap(),
            Route::VerseList {
                chapter: ChapterId::new(2)
            }
        );

        record(&progress, learner, 1, 3).await;
        assert!(matches!(
            router.route(learner, ChapterId::new(2)).await.unwrap(),
            Route::VerseList { .. }
        ));

        record(&progress, learner, 2, 1).await;
        assert_eq!(
            router.route(learner, ChapterId::new(2)).await.unwrap(),
            Route::ChapterComplete {
                chapter: ChapterId::new(2),
                total_stars: 4
            }
        );
    }
}
