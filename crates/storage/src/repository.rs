use async_trait::async_trait;
use lesson_core::model::{LearnerId, LearnerProgress};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the learner progress record.
///
/// The whole `LearnerProgress` is read and written as one unit, keyed by
/// learner id.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the stored progress for a learner.
    ///
    /// Returns `Ok(None)` if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored record is malformed,
    /// or other storage errors if the store cannot be read.
    async fn load_progress(
        &self,
        learner: LearnerId,
    ) -> Result<Option<LearnerProgress>, StorageError>;

    /// Persist the full progress record, replacing any previous one.
    ///
    /// Returns only once the write has settled.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn save_progress(&self, progress: &LearnerProgress) -> Result<(), StorageError>;

    /// Learners with a stored record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_learners(&self) -> Result<Vec<LearnerId>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<BTreeMap<LearnerId, (u64, LearnerProgress)>>>,
    writes: Arc<Mutex<u64>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(
        &self,
        learner: LearnerId,
    ) -> Result<Option<LearnerProgress>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&learner).map(|(_, p)| p.clone()))
    }

    async fn save_progress(&self, progress: &LearnerProgress) -> Result<(), StorageError> {
        let seq = {
            let mut writes = self
                .writes
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            *writes += 1;
            *writes
        };
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let first_seen = guard
            .get(&progress.learner_id())
            .map_or(seq, |(created, _)| *created);
        guard.insert(progress.learner_id(), (first_seen, progress.clone()));
        Ok(())
    }

    async fn list_learners(&self) -> Result<Vec<LearnerId>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut learners: Vec<(u64, LearnerId)> =
            guard.iter().map(|(id, (created, _))| (*created, *id)).collect();
        learners.sort_unstable();
        Ok(learners.into_iter().map(|(_, id)| id).collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}
