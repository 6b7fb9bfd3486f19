use lesson_core::Clock;
use lesson_core::model::{ChapterId, LearnerId, LessonPolicy, VerseNumber};
use lesson_core::scoring::Stars;

use super::router::{CompletionRouter, Route};
use super::session::LessonSession;
use crate::content_service::ContentService;
use crate::error::LessonError;
use crate::progress_service::ProgressService;

/// Result of completing a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub stars: Stars,
    pub chapter_now_complete: bool,
    /// Present when the chapter is complete.
    pub chapter_total_stars: Option<u32>,
    pub route: Route,
}

/// Orchestrates lesson start and persisted completion.
#[derive(Clone)]
pub struct LessonLoopService {
    clock: Clock,
    policy: LessonPolicy,
    content: ContentService,
    progress: ProgressService,
    router: CompletionRouter,
}

impl LessonLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        policy: LessonPolicy,
        content: ContentService,
        progress: ProgressService,
    ) -> Self {
        let router = CompletionRouter::new(progress.clone());
        Self {
            clock,
            policy,
            content,
            progress,
            router,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &LessonPolicy {
        &self.policy
    }

    /// Load the verse and start a lesson on it.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::ContentLoad` if the chapter or verse cannot be
    /// loaded. No session exists in that case.
    pub async fn open_session(
        &self,
        learner: LearnerId,
        chapter: ChapterId,
        verse: VerseNumber,
    ) -> Result<LessonSession, LessonError> {
        let (loaded, body) = self.content.verse(chapter, verse).await?;
        tracing::info!(%learner, %chapter, %verse, "lesson opened");
        Ok(LessonSession::new(
            learner,
            &loaded,
            body,
            self.policy,
            self.clock.now(),
        ))
    }

    /// Fix the lesson's stars, record them, then route.
    ///
    /// The completion write is awaited before the router reads progress.
    /// If the write fails the session keeps its stars; call
    /// `retry_completion` to try again.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::NotAtCelebration` if the lesson is not on its
    /// last step, `LessonError::Persistence` if the store fails, or
    /// `LessonError::Progress` if the verse lies outside the chapter.
    pub async fn complete_session(
        &self,
        session: &mut LessonSession,
    ) -> Result<CompletionOutcome, LessonError> {
        let stars = session.finalize(self.clock.now())?;
        if !session.is_persisted() {
            let entry = session.completion_entry()?;
            self.progress
                .record_completion(session.learner(), &entry, self.policy.star_merge())
                .await?;
            session.mark_persisted();
        }

        let route = self
            .router
            .route(session.learner(), session.chapter_id())
            .await?;
        let chapter_total_stars = match route {
            Route::ChapterComplete { total_stars, .. } => Some(total_stars),
            Route::VerseList { .. } => None,
        };

        Ok(CompletionOutcome {
            stars,
            chapter_now_complete: chapter_total_stars.is_some(),
            chapter_total_stars,
            route,
        })
    }

    /// Re-attempt persisting a lesson whose completion already fixed its
    /// stars.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::NotCompleted` if the lesson was never completed,
    /// or any error from `complete_session`.
    pub async fn retry_completion(
        &self,
        session: &mut LessonSession,
    ) -> Result<CompletionOutcome, LessonError> {
        if !session.is_complete() {
            return Err(LessonError::NotCompleted);
        }
        tracing::debug!(
            learner = %session.learner(),
            verse = %session.verse_number(),
            "retrying lesson completion"
        );
        self.complete_session(session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use lesson_core::time::fixed_clock;
    use storage::content::{ContentSource, InMemoryContent};
    use storage::repository::InMemoryRepository;

    use crate::content_service::ChapterCache;
    use crate::lessons::Transition;
    use crate::test_support::{WORDS, chapter};

    fn service() -> LessonLoopService {
        let source: Arc<dyn ContentSource> =
            Arc::new(InMemoryContent::new().with_chapter(chapter(1, 2)));
        LessonLoopService::new(
            fixed_clock(),
            LessonPolicy::default(),
            ContentService::new(source, Arc::new(ChapterCache::new())),
            ProgressService::new(Arc::new(InMemoryRepository::new())),
        )
    }

    fn play_through(session: &mut LessonSession) {
        session.submit_word_order(WORDS);
        session.submit_comprehension(0);
        while session.advance() != Transition::ReadyToComplete {}
    }

    #[tokio::test]
    async fn unknown_chapter_opens_no_session() {
        let err = service()
            .open_session(LearnerId::generate(), ChapterId::new(5), VerseNumber::FIRST)
            .await
            .unwrap_err();
        assert!(matches!(err, LessonError::ContentLoad(_)));
    }

    #[tokio::test]
    async fn completing_early_is_rejected() {
        let service = service();
        let mut session = service
            .open_session(LearnerId::generate(), ChapterId::new(1), VerseNumber::FIRST)
            .await
            .unwrap();
        let err = service.complete_session(&mut session).await.unwrap_err();
        assert!(matches!(err, LessonError::NotAtCelebration { .. }));
        assert!(matches!(
            service.retry_completion(&mut session).await,
            Err(LessonError::NotCompleted)
        ));
    }

    #[tokio::test]
    async fn last_verse_routes_to_chapter_complete() {
        let service = service();
        let learner = LearnerId::generate();

        let mut first = service
            .open_session(learner, ChapterId::new(1), VerseNumber::new(1))
            .await
            .unwrap();
        play_through(&mut first);
        let outcome = service.complete_session(&mut first).await.unwrap();
        assert_eq!(outcome.stars.value(), 2);
        assert!(!outcome.chapter_now_complete);
        assert_eq!(outcome.chapter_total_stars, None);

        let mut second = service
            .open_session(learner, ChapterId::new(1), VerseNumber::new(2))
            .await
            .unwrap();
        play_through(&mut second);
        let outcome = service.complete_session(&mut second).await.unwrap();
        assert!(outcome.chapter_now_complete);
        assert_eq!(outcome.chapter_total_stars, Some(4));
        assert_eq!(
            outcome.route,
            Route::ChapterComplete {
                chapter: ChapterId::new(1),
                total_stars: 4
            }
        );

        // A second call does not write again.
        let again = service.complete_session(&mut second).await.unwrap();
        assert_eq!(again, outcome);
    }
}
