use std::sync::Arc;

use lesson_core::model::{CompletionEntry, LearnerId, LearnerProgress, StarMerge};
use storage::repository::{ProgressRepository, StorageError};

use crate::error::{LessonError, PersistenceError};

/// Reads and writes the learner progress record.
///
/// `record_completion` is the only path that mutates persisted progress.
#[derive(Clone)]
pub struct ProgressService {
    repo: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(repo: Arc<dyn ProgressRepository>) -> Self {
        Self { repo }
    }

    /// Load a learner's progress.
    ///
    /// A missing record is an empty one. A record that cannot be decoded is
    /// also treated as empty, so the learner can keep going; the next save
    /// replaces it.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Load` if the store itself cannot be read.
    pub async fn load(&self, learner: LearnerId) -> Result<LearnerProgress, PersistenceError> {
        match self.repo.load_progress(learner).await {
            Ok(Some(progress)) => Ok(progress),
            Ok(None) => {
                tracing::debug!(%learner, "no stored progress, starting empty");
                Ok(LearnerProgress::empty(learner))
            }
            Err(StorageError::Serialization(message)) => {
                tracing::warn!(%learner, %message, "stored progress is malformed, starting empty");
                Ok(LearnerProgress::empty(learner))
            }
            Err(err) => {
                tracing::warn!(%learner, error = %err, "failed to load progress");
                Err(PersistenceError::Load(err))
            }
        }
    }

    /// Fold one finished lesson into the learner's record and persist it.
    ///
    /// The save is awaited before returning, so a read issued afterwards
    /// observes the new state.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::Progress` for an out-of-range verse and
    /// `LessonError::Persistence` if loading or saving fails.
    pub async fn record_completion(
        &self,
        learner: LearnerId,
        entry: &CompletionEntry,
        merge: StarMerge,
    ) -> Result<LearnerProgress, LessonError> {
        let mut progress = self.load(learner).await?;
        let was_completed = progress.is_chapter_completed(entry.chapter);

        let chapter = progress.record_completion(entry, merge)?;
        let now_completed = chapter.is_completed();
        let stored = chapter.stars_for(entry.verse);

        if let Err(err) = self.repo.save_progress(&progress).await {
            tracing::warn!(%learner, chapter = %entry.chapter, verse = %entry.verse, error = %err, "failed to save progress");
            return Err(PersistenceError::Save(err).into());
        }

        tracing::info!(
            %learner,
            chapter = %entry.chapter,
            verse = %entry.verse,
            stars = %entry.stars,
            stored = ?stored.map(|s| s.value()),
            "verse completion recorded"
        );
        if now_completed && !was_completed {
            tracing::info!(%learner, chapter = %entry.chapter, "chapter completed");
        }

        Ok(progress)
    }

    /// Learners with stored progress, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Load` if the store cannot be read.
    pub async fn learners(&self) -> Result<Vec<LearnerId>, PersistenceError> {
        self.repo
            .list_learners()
            .await
            .map_err(PersistenceError::Load)
    }

    /// Persist an empty record for a new learner.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Save` if the record cannot be stored.
    pub async fn register(&self, learner: LearnerId) -> Result<(), PersistenceError> {
        self.repo
            .save_progress(&LearnerProgress::empty(learner))
            .await
            .map_err(PersistenceError::Save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lesson_core::model::{ChapterId, VerseNumber};
    use lesson_core::scoring::Stars;
    use lesson_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn entry(verse: u32, stars: u8) -> CompletionEntry {
        CompletionEntry {
            chapter: ChapterId::new(1),
            verse: VerseNumber::new(verse),
            total_verses: 7,
            stars: Stars::new(stars).unwrap(),
            completed_at: fixed_now(),
        }
    }

    struct BrokenRepo(StorageError);

    #[async_trait]
    impl ProgressRepository for BrokenRepo {
        async fn load_progress(
            &self,
            _learner: LearnerId,
        ) -> Result<Option<LearnerProgress>, StorageError> {
            Err(match &self.0 {
                StorageError::Serialization(m) => StorageError::Serialization(m.clone()),
                _ => StorageError::Connection("offline".into()),
            })
        }

        async fn save_progress(&self, _progress: &LearnerProgress) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn list_learners(&self) -> Result<Vec<LearnerId>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn missing_record_loads_as_empty() {
        let service = ProgressService::new(Arc::new(InMemoryRepository::new()));
        let learner = LearnerId::generate();
        let progress = service.load(learner).await.unwrap();
        assert_eq!(progress, LearnerProgress::empty(learner));
    }

    #[tokio::test]
    async fn malformed_record_degrades_to_empty() {
        let service = ProgressService::new(Arc::new(BrokenRepo(StorageError::Serialization(
            "bad json".into(),
        ))));
        let learner = LearnerId::generate();
        let progress = service.load(learner).await.unwrap();
        assert_eq!(progress.chapters().count(), 0);
    }

    #[tokio::test]
    async fn unreadable_store_is_a_load_error() {
        let service = ProgressService::new(Arc::new(BrokenRepo(StorageError::Connection(
            "offline".into(),
        ))));
        let err = service.load(LearnerId::generate()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Load(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn recorded_completion_is_visible_to_next_load() {
        let service = ProgressService::new(Arc::new(InMemoryRepository::new()));
        let learner = LearnerId::generate();

        service
            .record_completion(learner, &entry(1, 3), StarMerge::Overwrite)
            .await
            .unwrap();

        let progress = service.load(learner).await.unwrap();
        assert!(progress.is_verse_completed(ChapterId::new(1), VerseNumber::new(1)));
        assert_eq!(progress.chapter_total_stars(ChapterId::new(1)), 3);
    }

    #[tokio::test]
    async fn out_of_range_verse_is_rejected_without_saving() {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ProgressService::new(repo.clone());
        let learner = LearnerId::generate();

        let err = service
            .record_completion(learner, &entry(8, 2), StarMerge::Overwrite)
            .await
            .unwrap_err();
        assert!(matches!(err, LessonError::Progress(_)));
        assert!(repo.load_progress(learner).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_save_is_propagated() {
        let service = ProgressService::new(Arc::new(BrokenRepo(StorageError::Serialization(
            "ignored".into(),
        ))));
        let err = service
            .record_completion(LearnerId::generate(), &entry(1, 1), StarMerge::Overwrite)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LessonError::Persistence(PersistenceError::Save(_))
        ));
        assert!(err.is_retryable());
    }
}
