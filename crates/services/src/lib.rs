#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod content_service;
pub mod error;
pub mod lessons;
pub mod progress_service;
pub mod scorer;

#[cfg(test)]
pub(crate) mod test_support;

pub use lesson_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::{CatalogService, ChapterListItem, VerseListItem};
pub use content_service::{ChapterCache, ContentService};
pub use error::{AppServicesError, ContentLoadError, LessonError, PersistenceError};
pub use lessons::{
    CompletionOutcome, CompletionRouter, LessonLoopService, LessonProgress, LessonSession,
    RecordingRef, Route, Transition,
};
pub use progress_service::ProgressService;
pub use scorer::{FixedScorer, PronunciationScorer, RandomScorer};
