//! Shared error types for the services crate.

use thiserror::Error;

use lesson_core::model::{ChapterId, ProgressError, Step, VerseNumber};
use storage::content::ContentSourceError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// A content record could not be turned into a lesson. No session exists.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentLoadError {
    #[error(transparent)]
    Source(#[from] ContentSourceError),
    #[error("chapter {chapter} has no content for verse {verse}")]
    VerseMissing {
        chapter: ChapterId,
        verse: VerseNumber,
    },
}

impl ContentLoadError {
    /// Whether offering the learner a retry makes sense.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            ContentLoadError::Source(err) => err.is_transient(),
            ContentLoadError::VerseMissing { .. } => false,
        }
    }
}

/// The progress store could not be read or written.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistenceError {
    #[error("failed to load progress: {0}")]
    Load(#[source] StorageError),
    #[error("failed to save progress: {0}")]
    Save(#[source] StorageError),
}

impl PersistenceError {
    /// Store failures are local I/O and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Errors emitted by lesson services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonError {
    #[error(transparent)]
    ContentLoad(#[from] ContentLoadError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error("lesson can only be completed from the celebration step (currently {step:?})")]
    NotAtCelebration { step: Step },
    #[error("lesson has not been completed yet")]
    NotCompleted,
}

impl LessonError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            LessonError::ContentLoad(err) => err.is_retryable(),
            LessonError::Persistence(err) => err.is_retryable(),
            _ => false,
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Content(#[from] ContentLoadError),
    #[error(transparent)]
    ChapterOrder(#[from] lesson_core::unlock::ChapterOrderError),
}
